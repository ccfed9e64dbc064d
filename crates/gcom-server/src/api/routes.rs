//! REST API routes.

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::api::{aircraft, competition, flight_plan, waypoints};
use crate::state::AppState;

/// Create the API router.
pub fn create_router() -> Router<Arc<AppState>> {
    let store_routes = Router::new()
        .route("/waypoints", get(waypoints::list_waypoints).post(waypoints::create_waypoints))
        .route("/waypoints/load", post(waypoints::load_waypoints))
        .route("/routes", get(competition::list_routes).post(competition::create_routes))
        .route("/nextroute", get(competition::next_route))
        .route("/flightplan", post(flight_plan::compute_flight_plan));

    let aircraft_routes = Router::new()
        .route("/aircraft/status", get(aircraft::get_status))
        .route("/aircraft/queue", get(aircraft::get_queue).post(aircraft::post_queue))
        .route("/aircraft/lock", post(aircraft::lock))
        .route("/aircraft/unlock", post(aircraft::unlock))
        .route("/aircraft/rtl", post(aircraft::return_to_launch))
        .route("/aircraft/land", post(aircraft::land))
        .route("/aircraft/home", post(aircraft::post_home));

    Router::new()
        .route("/", get(health))
        .merge(store_routes)
        .merge(aircraft_routes)
}

async fn health() -> &'static str {
    "GCOM server running"
}
