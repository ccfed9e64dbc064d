//! Aircraft endpoints, proxied to the Mission Planner bridge.

use axum::{extract::State, Json};
use std::sync::Arc;

use gcom_core::{AircraftStatus, Queue, Waypoint};
use gcom_mp::MissionPlannerClient;

use crate::api::extract::ApiJson;
use crate::api::response::{ApiError, JsonResponse};
use crate::state::AppState;

fn mission_planner(state: &AppState) -> Result<&MissionPlannerClient, ApiError> {
    state
        .mission_planner()
        .ok_or_else(|| ApiError::unavailable("Mission Planner is not configured (MP_ROUTE)"))
}

pub async fn get_status(State(state): State<Arc<AppState>>) -> Result<Json<AircraftStatus>, ApiError> {
    let status = mission_planner(&state)?.get_status().await?;
    Ok(Json(status))
}

pub async fn get_queue(State(state): State<Arc<AppState>>) -> Result<Json<Queue>, ApiError> {
    let queue = mission_planner(&state)?.get_queue().await?;
    Ok(Json(queue))
}

pub async fn post_queue(
    State(state): State<Arc<AppState>>,
    ApiJson(queue): ApiJson<Queue>,
) -> Result<Json<JsonResponse>, ApiError> {
    mission_planner(&state)?.post_queue(&queue).await?;
    Ok(JsonResponse::message(format!("queued {} waypoints", queue.queue.len())))
}

pub async fn lock(State(state): State<Arc<AppState>>) -> Result<Json<JsonResponse>, ApiError> {
    mission_planner(&state)?.lock().await?;
    Ok(JsonResponse::message("aircraft locked"))
}

pub async fn unlock(State(state): State<Arc<AppState>>) -> Result<Json<JsonResponse>, ApiError> {
    mission_planner(&state)?.unlock().await?;
    Ok(JsonResponse::message("aircraft unlocked"))
}

pub async fn return_to_launch(
    State(state): State<Arc<AppState>>,
) -> Result<Json<JsonResponse>, ApiError> {
    mission_planner(&state)?.return_to_launch().await?;
    Ok(JsonResponse::message("returning to launch"))
}

pub async fn land(State(state): State<Arc<AppState>>) -> Result<Json<JsonResponse>, ApiError> {
    mission_planner(&state)?.land().await?;
    Ok(JsonResponse::message("landing"))
}

pub async fn post_home(
    State(state): State<Arc<AppState>>,
    ApiJson(home): ApiJson<Waypoint>,
) -> Result<Json<JsonResponse>, ApiError> {
    mission_planner(&state)?.post_home(&home).await?;
    Ok(JsonResponse::message(format!("home set to '{}'", home.name)))
}
