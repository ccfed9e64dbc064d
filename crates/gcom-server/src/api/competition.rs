//! Competition route endpoints.

use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use gcom_core::Route;

use crate::api::extract::{ApiJson, OneOrMany};
use crate::api::response::{ApiError, ResponseType};
use crate::persistence::routes;
use crate::state::AppState;

pub async fn list_routes(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Route>>, ApiError> {
    let routes = routes::load_all_routes(state.db().pool()).await?;
    Ok(Json(routes))
}

/// Store one route or an array of them, dedup-creating each entry.
pub async fn create_routes(
    State(state): State<Arc<AppState>>,
    ApiJson(body): ApiJson<OneOrMany<Route>>,
) -> Result<(StatusCode, Json<Vec<Route>>), ApiError> {
    let mut created = Vec::new();
    for route in body.into_vec() {
        created.push(routes::create_route(state.db().pool(), &route).await?);
    }
    Ok((StatusCode::CREATED, Json(created)))
}

/// Pop the next route of the last computed flight plan.
pub async fn next_route(State(state): State<Arc<AppState>>) -> Result<Json<Route>, ApiError> {
    match routes::take_next_route(state.db().pool()).await? {
        Some(route) => {
            tracing::info!("Dispatching route {} (order {:?})", route.number, route.order);
            Ok(Json(route))
        }
        None => Err(ApiError::new(
            StatusCode::NOT_FOUND,
            ResponseType::Message,
            "no planned routes remaining",
        )),
    }
}
