// Index routes - service status and object counts

use super::error::ApiResult;
use super::AppState;
use crate::models::EntityKind;
use axum::extract::State;
use axum::Json;
use serde_json::{json, Map, Value};

/// GET /status
pub async fn status() -> Json<Value> {
    Json(json!({ "status": "OK" }))
}

/// GET /stats - number of objects per resource
pub async fn stats(State(app): State<AppState>) -> ApiResult<Json<Map<String, Value>>> {
    let session = app.storage.session();

    let mut counts = Map::new();
    for kind in EntityKind::ALL {
        counts.insert(kind.table().to_string(), Value::from(session.count(Some(kind))?));
    }

    Ok(Json(counts))
}
