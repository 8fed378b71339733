// HBNB REST API - /api/v1 routes over the storage engine
//
// Every entity gets the same five shapes (see resource.rs). Routes that are
// not matched fall through to a JSON 404.

pub mod error;
pub mod index;
pub mod places;
pub mod resource;
pub mod session;

pub use error::{ApiError, ApiResult};
pub use session::{Session, SharedStorage};

use crate::models::{Amenity, City, Place, Review, State, User};
use crate::storage::Storage;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub storage: SharedStorage,
}

impl AppState {
    pub fn new(storage: Box<dyn Storage>) -> Self {
        AppState {
            storage: SharedStorage::new(storage),
        }
    }
}

/// Full application: /api/v1 routes, JSON 404 fallback, CORS and tracing
pub fn router(storage: Box<dyn Storage>) -> Router {
    Router::new()
        .nest("/api/v1", api_routes())
        .fallback(not_found)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(AppState::new(storage))
}

fn api_routes() -> Router<AppState> {
    use resource::{create, create_scoped, destroy, list, list_scoped, show, show_scoped, update};

    Router::new()
        .route("/status", get(index::status))
        .route("/stats", get(index::stats))
        // States
        .route("/states", get(list::<State>).post(create::<State>))
        .route(
            "/states/:id",
            get(show::<State>).put(update::<State>).delete(destroy::<State>),
        )
        // Cities
        .route(
            "/states/:id/cities",
            get(list_scoped::<City>).post(create_scoped::<City>),
        )
        .route("/states/:id/cities/:city_id", get(show_scoped::<City>))
        .route(
            "/cities/:id",
            get(show::<City>).put(update::<City>).delete(destroy::<City>),
        )
        // Places
        .route(
            "/cities/:id/places",
            get(list_scoped::<Place>).post(create_scoped::<Place>),
        )
        .route("/cities/:id/places/:place_id", get(show_scoped::<Place>))
        .route(
            "/places/:id",
            get(show::<Place>).put(update::<Place>).delete(destroy::<Place>),
        )
        .route("/places_search", post(places::search))
        // Reviews
        .route(
            "/places/:id/reviews",
            get(list_scoped::<Review>).post(create_scoped::<Review>),
        )
        .route("/places/:id/reviews/:review_id", get(show_scoped::<Review>))
        .route(
            "/reviews/:id",
            get(show::<Review>).put(update::<Review>).delete(destroy::<Review>),
        )
        // Place ↔ Amenity links
        .route("/places/:id/amenities", get(places::list_amenities))
        .route(
            "/places/:id/amenities/:amenity_id",
            post(places::link_amenity).delete(places::unlink_amenity),
        )
        // Amenities
        .route("/amenities", get(list::<Amenity>).post(create::<Amenity>))
        .route(
            "/amenities/:id",
            get(show::<Amenity>).put(update::<Amenity>).delete(destroy::<Amenity>),
        )
        // Users
        .route("/users", get(list::<User>).post(create::<User>))
        .route(
            "/users/:id",
            get(show::<User>).put(update::<User>).delete(destroy::<User>),
        )
}

async fn not_found() -> ApiError {
    ApiError::NotFound
}
