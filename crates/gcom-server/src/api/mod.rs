//! API routes for the GCOM server.

pub mod aircraft;
pub mod competition;
pub mod extract;
pub mod flight_plan;
pub mod response;
mod routes;
pub mod waypoints;

use axum::Router;

pub fn routes() -> Router<std::sync::Arc<crate::state::AppState>> {
    routes::create_router()
}
