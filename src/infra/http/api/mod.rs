pub mod error;
pub mod handlers;
pub mod state;

pub use state::ApiState;

use axum::{Router, extract::FromRef, routing::get};

/// City routes for any router state that can hand out an [`ApiState`].
pub fn routes<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
    ApiState: FromRef<S>,
{
    Router::new()
        .route("/api/cities", get(handlers::list_cities))
        .route("/api/cities/{id}", get(handlers::get_city))
        .route("/api/cities/{id}/images", get(handlers::list_city_images))
        .route("/api/cities/{id}/facts", get(handlers::list_city_facts))
        .route("/api/cities/{id}/trends", get(handlers::get_city_trends))
}

pub fn build_api_router(state: ApiState) -> Router {
    routes().with_state(state)
}
