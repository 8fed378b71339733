// Resource handlers - the CRUD shapes every entity route shares
//
// Top-level resources (states, amenities, users) use list/show/create/
// update/destroy directly. Nested resources (cities, places, reviews) use
// the *_scoped variants, which resolve the parent from the path first.

use super::error::{ApiError, ApiResult};
use super::session::Session;
use super::AppState;
use crate::models::{Child, Entity, Model};
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Map, Value};

pub type Dict = Map<String, Value>;

/// Fields a client may never choose on creation. Amenity links only change
/// through /places/<id>/amenities/<amenity_id>.
const SERVER_ASSIGNED: [&str; 5] = ["id", "created_at", "updated_at", "__class__", "amenity_ids"];

/// Parse a request body that must be a JSON object
pub fn parse_object(body: &Bytes) -> ApiResult<Dict> {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(fields)) => Ok(fields),
        _ => Err(ApiError::BadRequest("Not a JSON".to_string())),
    }
}

/// Entity of kind M with this id, or 404
pub fn fetch<M: Model>(session: &Session<'_>, id: &str) -> ApiResult<Entity> {
    session.get(M::KIND, id)?.ok_or(ApiError::NotFound)
}

/// Typed fetch, or 404
pub fn fetch_model<M: Model>(session: &Session<'_>, id: &str) -> ApiResult<M> {
    session.find::<M>(id)?.ok_or(ApiError::NotFound)
}

pub fn dicts<I>(entities: I) -> Vec<Dict>
where
    I: IntoIterator,
    I::Item: Into<Entity>,
{
    entities
        .into_iter()
        .map(|e| Into::<Entity>::into(e).to_dict())
        .collect()
}

/// Check M's mandatory fields in order. A field naming another object must
/// also resolve, otherwise the request is a 404.
fn validate<M: Model>(session: &Session<'_>, fields: &Dict) -> ApiResult<()> {
    for field in M::REQUIRED {
        let value = match fields.get(*field) {
            None | Some(Value::Null) => {
                return Err(ApiError::BadRequest(format!("Missing {}", field)));
            }
            Some(value) => value,
        };

        if let Some((_, kind)) = M::REFERENCES.iter().find(|(name, _)| name == field) {
            let id = value
                .as_str()
                .ok_or_else(|| ApiError::BadRequest(format!("Invalid {}", field)))?;
            if session.get(*kind, id)?.is_none() {
                return Err(ApiError::NotFound);
            }
        }
    }

    Ok(())
}

/// Validate, construct and persist a new M from request fields
fn insert<M: Model>(session: &mut Session<'_>, mut fields: Dict) -> ApiResult<(StatusCode, Json<Dict>)> {
    validate::<M>(session, &fields)?;

    for key in SERVER_ASSIGNED {
        fields.remove(key);
    }

    let mut entity = Entity::from_payload(M::KIND, fields)?;
    session.persist(&mut entity)?;

    Ok((StatusCode::CREATED, Json(entity.to_dict())))
}

// ============================================================================
// TOP-LEVEL RESOURCES
// ============================================================================

/// GET /<resource>
pub async fn list<M: Model>(State(app): State<AppState>) -> ApiResult<Json<Vec<Dict>>> {
    let session = app.storage.session();
    Ok(Json(dicts(session.list::<M>()?)))
}

/// GET /<resource>/<id>
pub async fn show<M: Model>(
    State(app): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Dict>> {
    let session = app.storage.session();
    Ok(Json(fetch::<M>(&session, &id)?.to_dict()))
}

/// POST /<resource>
pub async fn create<M: Model>(
    State(app): State<AppState>,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<Dict>)> {
    let mut session = app.storage.session();
    let fields = parse_object(&body)?;
    insert::<M>(&mut session, fields)
}

/// PUT /<resource>/<id>
pub async fn update<M: Model>(
    State(app): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> ApiResult<Json<Dict>> {
    let mut session = app.storage.session();
    let mut entity = fetch::<M>(&session, &id)?;
    let fields = parse_object(&body)?;

    entity.update_from(fields)?;
    session.persist(&mut entity)?;

    Ok(Json(entity.to_dict()))
}

/// DELETE /<resource>/<id>
pub async fn destroy<M: Model>(
    State(app): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let mut session = app.storage.session();
    let entity = fetch::<M>(&session, &id)?;

    session.delete(&entity)?;
    session.save()?;

    Ok(Json(json!({})))
}

// ============================================================================
// NESTED RESOURCES
// ============================================================================

/// GET /<parent>/<parent_id>/<resource>
pub async fn list_scoped<C: Child>(
    State(app): State<AppState>,
    Path(parent_id): Path<String>,
) -> ApiResult<Json<Vec<Dict>>> {
    let session = app.storage.session();
    fetch::<C::Parent>(&session, &parent_id)?;

    let children = session
        .list::<C>()?
        .into_iter()
        .filter(|child| child.parent_id() == parent_id);

    Ok(Json(dicts(children)))
}

/// GET /<parent>/<parent_id>/<resource>/<id>
pub async fn show_scoped<C: Child>(
    State(app): State<AppState>,
    Path((parent_id, id)): Path<(String, String)>,
) -> ApiResult<Json<Dict>> {
    let session = app.storage.session();
    fetch::<C::Parent>(&session, &parent_id)?;

    let child = fetch_model::<C>(&session, &id)?;
    if child.parent_id() != parent_id {
        return Err(ApiError::NotFound);
    }

    let entity: Entity = child.into();
    Ok(Json(entity.to_dict()))
}

/// POST /<parent>/<parent_id>/<resource>
pub async fn create_scoped<C: Child>(
    State(app): State<AppState>,
    Path(parent_id): Path<String>,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<Dict>)> {
    let mut session = app.storage.session();
    fetch::<C::Parent>(&session, &parent_id)?;

    let mut fields = parse_object(&body)?;
    fields.insert(C::PARENT_KEY.to_string(), Value::String(parent_id));

    insert::<C>(&mut session, fields)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_object_accepts_only_objects() {
        assert!(parse_object(&Bytes::from_static(br#"{"name": "x"}"#)).is_ok());

        let bodies: [&[u8]; 4] = [b"", b"not json", b"[1, 2]", b"\"text\""];
        for body in bodies {
            let err = parse_object(&Bytes::copy_from_slice(body)).unwrap_err();
            assert_eq!(err.to_string(), "Not a JSON");
        }
    }
}
