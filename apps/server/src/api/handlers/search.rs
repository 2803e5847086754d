//! Package search handlers
//!
//! - `GET /api/packages/search{?params}`
//! - `GET /api/packages/by-city/{cityId}{?params}`
//! - `GET /api/packages/nearby{?lat,lng,radiusKm,...}`

use axum::{
    extract::{Path, RawQuery, State},
    response::{IntoResponse, Response},
    Json,
};

use crate::{state::AppState, Error, Result};

/// Decode the raw query string into ordered items.
fn query_items(raw_query: Option<&str>) -> Vec<(String, String)> {
    // `url::form_urlencoded` implements `application/x-www-form-urlencoded` semantics (including '+' = space).
    raw_query
        .map(|q| url::form_urlencoded::parse(q.as_bytes()).into_owned().collect())
        .unwrap_or_default()
}

pub async fn search_packages(
    State(state): State<AppState>,
    RawQuery(raw_query): RawQuery,
) -> Result<Response> {
    let items = query_items(raw_query.as_deref());
    let response = state.search_service.search(&items).await?;
    Ok(Json(response).into_response())
}

pub async fn search_packages_by_city(
    State(state): State<AppState>,
    Path(city_id): Path<String>,
    RawQuery(raw_query): RawQuery,
) -> Result<Response> {
    let city_id: i64 = city_id
        .trim()
        .parse()
        .map_err(|_| Error::invalid_input("cityId", format!("'{city_id}' is not an integer")))?;

    let items = query_items(raw_query.as_deref());
    let response = state
        .search_service
        .search_by_city(city_id, &items)
        .await?;
    Ok(Json(response).into_response())
}

pub async fn nearby_packages(
    State(state): State<AppState>,
    RawQuery(raw_query): RawQuery,
) -> Result<Response> {
    let items = query_items(raw_query.as_deref());
    let response = state.search_service.nearby(&items).await?;
    Ok(Json(response).into_response())
}
