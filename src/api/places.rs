// Place routes beyond plain CRUD: amenity links and search

use super::error::{ApiError, ApiResult};
use super::resource::{dicts, fetch_model, parse_object, Dict};
use super::AppState;
use crate::models::{Amenity, City, Entity, Place};
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashSet;

// ============================================================================
// AMENITY LINKS
// ============================================================================

/// GET /places/<place_id>/amenities
pub async fn list_amenities(
    State(app): State<AppState>,
    Path(place_id): Path<String>,
) -> ApiResult<Json<Vec<Dict>>> {
    let session = app.storage.session();
    let place = fetch_model::<Place>(&session, &place_id)?;

    let mut amenities = Vec::with_capacity(place.amenity_ids.len());
    for amenity_id in &place.amenity_ids {
        if let Some(amenity) = session.find::<Amenity>(amenity_id)? {
            amenities.push(amenity);
        }
    }

    Ok(Json(dicts(amenities)))
}

/// POST /places/<place_id>/amenities/<amenity_id>
///
/// 200 with the amenity when already linked, 201 when newly linked.
pub async fn link_amenity(
    State(app): State<AppState>,
    Path((place_id, amenity_id)): Path<(String, String)>,
) -> ApiResult<(StatusCode, Json<Dict>)> {
    let mut session = app.storage.session();
    let mut place = fetch_model::<Place>(&session, &place_id)?;
    let amenity: Entity = fetch_model::<Amenity>(&session, &amenity_id)?.into();

    if !place.link_amenity(&amenity_id) {
        return Ok((StatusCode::OK, Json(amenity.to_dict())));
    }

    session.persist(&mut Entity::Place(place))?;
    Ok((StatusCode::CREATED, Json(amenity.to_dict())))
}

/// DELETE /places/<place_id>/amenities/<amenity_id>
pub async fn unlink_amenity(
    State(app): State<AppState>,
    Path((place_id, amenity_id)): Path<(String, String)>,
) -> ApiResult<Json<Value>> {
    let mut session = app.storage.session();
    let mut place = fetch_model::<Place>(&session, &place_id)?;
    fetch_model::<Amenity>(&session, &amenity_id)?;

    if !place.unlink_amenity(&amenity_id) {
        return Err(ApiError::NotFound);
    }

    session.persist(&mut Entity::Place(place))?;
    Ok(Json(json!({})))
}

// ============================================================================
// SEARCH
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct SearchRequest {
    #[serde(default)]
    pub states: Vec<String>,

    #[serde(default)]
    pub cities: Vec<String>,

    #[serde(default)]
    pub amenities: Vec<String>,
}

impl SearchRequest {
    /// Apply the filter to places, keeping their storage order.
    ///
    /// No states and no cities means every place. Otherwise a place matches
    /// when its city is listed or belongs to a listed state. Listed amenities
    /// must all be linked to the place.
    pub fn filter(&self, places: Vec<Place>, cities: &[City]) -> Vec<Place> {
        let wanted_cities: Option<HashSet<&str>> =
            if self.states.is_empty() && self.cities.is_empty() {
                None
            } else {
                let mut wanted: HashSet<&str> = self.cities.iter().map(String::as_str).collect();
                wanted.extend(
                    cities
                        .iter()
                        .filter(|city| self.states.contains(&city.state_id))
                        .map(|city| city.base.id.as_str()),
                );
                Some(wanted)
            };

        places
            .into_iter()
            .filter(|place| {
                wanted_cities
                    .as_ref()
                    .map_or(true, |wanted| wanted.contains(place.city_id.as_str()))
            })
            .filter(|place| self.amenities.iter().all(|id| place.has_amenity(id)))
            .collect()
    }
}

/// POST /places_search
pub async fn search(State(app): State<AppState>, body: Bytes) -> ApiResult<Json<Vec<Dict>>> {
    let session = app.storage.session();
    let request: SearchRequest = serde_json::from_value(Value::Object(parse_object(&body)?))
        .map_err(|e| ApiError::BadRequest(format!("Invalid search: {}", e)))?;

    let places = session.list::<Place>()?;
    let cities = session.list::<City>()?;

    Ok(Json(dicts(request.filter(places, &cities))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::State as StateModel;

    struct Fixture {
        cities: Vec<City>,
        places: Vec<Place>,
    }

    // ca: [sf (loft + wifi), la (villa)], ny: [nyc (studio + wifi + pool)]
    fn fixture() -> (Fixture, StateModel, StateModel) {
        let ca = StateModel::new("California");
        let ny = StateModel::new("New York");
        let sf = City::new(ca.base.id.clone(), "San Francisco");
        let la = City::new(ca.base.id.clone(), "Los Angeles");
        let nyc = City::new(ny.base.id.clone(), "New York City");

        let mut loft = Place::new(sf.base.id.clone(), "u", "Loft");
        loft.link_amenity("wifi");
        let villa = Place::new(la.base.id.clone(), "u", "Villa");
        let mut studio = Place::new(nyc.base.id.clone(), "u", "Studio");
        studio.link_amenity("wifi");
        studio.link_amenity("pool");

        let fixture = Fixture {
            cities: vec![sf, la, nyc],
            places: vec![loft, villa, studio],
        };
        (fixture, ca, ny)
    }

    fn names(places: &[Place]) -> Vec<&str> {
        places.iter().map(|p| p.name.as_str()).collect()
    }

    #[test]
    fn test_empty_search_returns_everything() {
        let (f, _, _) = fixture();

        let found = SearchRequest::default().filter(f.places, &f.cities);

        assert_eq!(names(&found), vec!["Loft", "Villa", "Studio"]);
    }

    #[test]
    fn test_states_and_cities_are_a_union() {
        let (f, ca, _) = fixture();
        let nyc = f.cities[2].base.id.clone();
        let request = SearchRequest {
            states: vec![ca.base.id.clone()],
            cities: vec![nyc, "unknown".to_string()],
            amenities: vec![],
        };

        let found = request.filter(f.places, &f.cities);

        assert_eq!(names(&found), vec!["Loft", "Villa", "Studio"]);
    }

    #[test]
    fn test_city_listed_twice_is_not_duplicated() {
        let (f, ca, _) = fixture();
        let sf = f.cities[0].base.id.clone();
        let request = SearchRequest {
            states: vec![ca.base.id.clone()],
            cities: vec![sf],
            amenities: vec![],
        };

        let found = request.filter(f.places, &f.cities);

        assert_eq!(names(&found), vec!["Loft", "Villa"]);
    }

    #[test]
    fn test_amenities_must_all_match() {
        let (f, _, _) = fixture();
        let request = SearchRequest {
            amenities: vec!["wifi".to_string(), "pool".to_string()],
            ..Default::default()
        };

        let found = request.filter(f.places, &f.cities);

        assert_eq!(names(&found), vec!["Studio"]);
    }
}
