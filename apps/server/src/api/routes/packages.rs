//! Package search routes

use crate::api::handlers::search;
use crate::state::AppState;
use axum::{routing::get, Router};

pub fn package_routes() -> Router<AppState> {
    Router::new()
        .route("/search", get(search::search_packages))
        .route("/nearby", get(search::nearby_packages))
        .route("/by-city/:city_id", get(search::search_packages_by_city))
}
