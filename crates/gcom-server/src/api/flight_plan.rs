//! Flight plan computation endpoint.

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::api::response::ApiError;
use crate::pipeline::FlightPlan;
use crate::state::AppState;

/// Run the solver over the stored routes and return them in flight order.
pub async fn compute_flight_plan(
    State(state): State<Arc<AppState>>,
) -> Result<Json<FlightPlan>, ApiError> {
    let plan = state.planner().plan().await?;
    Ok(Json(plan))
}
