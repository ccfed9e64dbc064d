//! Waypoint endpoints.

use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use std::sync::Arc;

use gcom_core::{Queue, Waypoint};

use crate::api::extract::{ApiJson, OneOrMany};
use crate::api::response::ApiError;
use crate::persistence::waypoints;
use crate::state::AppState;

/// List every stored waypoint.
pub async fn list_waypoints(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Waypoint>>, ApiError> {
    let waypoints = waypoints::load_all_waypoints(state.db().pool()).await?;
    Ok(Json(waypoints))
}

/// Store one waypoint or an array of them. Each entry is dedup-created; the
/// response lists them in request order with their ids.
pub async fn create_waypoints(
    State(state): State<Arc<AppState>>,
    ApiJson(body): ApiJson<OneOrMany<Waypoint>>,
) -> Result<(StatusCode, Json<Vec<Waypoint>>), ApiError> {
    let mut created = Vec::new();
    for waypoint in body.into_vec() {
        created.push(waypoints::create_waypoint(state.db().pool(), &waypoint).await?);
    }
    Ok((StatusCode::CREATED, Json(created)))
}

#[derive(Debug, Deserialize)]
pub struct LoadRequest {
    pub competition: String,
}

/// Load a competition's published waypoint set into the store.
pub async fn load_waypoints(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<LoadRequest>,
) -> Result<Json<Vec<Waypoint>>, ApiError> {
    let path = match req.competition.as_str() {
        "UAS" => &state.config().uas_waypoints_file,
        other => return Err(ApiError::bad_request(format!("unknown competition '{}'", other))),
    };

    let raw = tokio::fs::read(path).await.map_err(|err| {
        tracing::error!("Failed to read {}: {}", path.display(), err);
        ApiError::internal(format!("failed to read {}: {}", path.display(), err))
    })?;
    let queue: Queue = serde_json::from_slice(&raw).map_err(|err| {
        tracing::error!("Malformed waypoint file {}: {}", path.display(), err);
        ApiError::internal(format!("malformed waypoint file {}: {}", path.display(), err))
    })?;

    let mut loaded = Vec::with_capacity(queue.queue.len());
    for waypoint in &queue.queue {
        loaded.push(waypoints::create_waypoint(state.db().pool(), waypoint).await?);
    }

    tracing::info!("Loaded {} {} waypoints", loaded.len(), req.competition);
    Ok(Json(loaded))
}
