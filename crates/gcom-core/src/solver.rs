//! Documents exchanged with the external path optimizer.
//!
//! The solver reads a [`SolverInput`] snapshot of every stored waypoint and
//! route and answers with a [`SolverOutput`]: route ids in flight order.

use serde::{Deserialize, Serialize};

use crate::errors::ResolveError;
use crate::models::{Route, Waypoint};

/// Reduced route representation the solver optimizes over.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolverRoute {
    #[serde(rename = "routeID")]
    pub route_id: i64,
    /// `[start, end]` waypoint ids
    #[serde(rename = "waypointIds")]
    pub waypoint_ids: [i64; 2],
    #[serde(rename = "dollarValue")]
    pub dollar_value: f64,
}

/// Flight parameters for the route search.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteFinder {
    pub speed: f64,
    pub altitude: f64,
    pub climb_rate: f64,
    pub starting_waypoint_id: i64,
}

/// Re-route request: current position and waypoints to avoid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReRouter {
    pub current_long: f64,
    pub current_lat: f64,
    #[serde(default)]
    pub waypoint_obstacle_ids: Vec<i64>,
    pub re_route_waypoint_id: i64,
}

/// Static tuning passed through to the solver on every run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SolverParams {
    pub route_finder: RouteFinder,
    pub re_router: ReRouter,
}

/// Input document written for one solver run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolverInput {
    #[serde(rename = "numWaypoints")]
    pub num_waypoints: usize,
    #[serde(rename = "numRoutes")]
    pub num_routes: usize,
    pub waypoints: Vec<Waypoint>,
    pub routes: Vec<SolverRoute>,
    #[serde(rename = "RouteFinder")]
    pub route_finder: RouteFinder,
    #[serde(rename = "ReRouter")]
    pub re_router: ReRouter,
    /// Full route records, used to map solver ids back to routes
    #[serde(rename = "aeacRoutes")]
    pub aeac_routes: Vec<Route>,
}

/// Route ids in flight order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolverOutput {
    #[serde(rename = "Routes")]
    pub routes: Vec<i64>,
}

impl SolverInput {
    /// Build the input snapshot from stored waypoints and routes.
    ///
    /// Route endpoints are matched to waypoints by name; the first waypoint
    /// in `waypoints` carrying the name wins.
    pub fn build(
        waypoints: Vec<Waypoint>,
        routes: Vec<Route>,
        params: &SolverParams,
    ) -> Result<Self, ResolveError> {
        let reduced = routes
            .iter()
            .map(|route| reduce_route(route, &waypoints))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            num_waypoints: waypoints.len(),
            num_routes: reduced.len(),
            waypoints,
            routes: reduced,
            route_finder: params.route_finder.clone(),
            re_router: params.re_router.clone(),
            aeac_routes: routes,
        })
    }
}

fn reduce_route(route: &Route, waypoints: &[Waypoint]) -> Result<SolverRoute, ResolveError> {
    let route_id = route
        .id
        .persisted()
        .ok_or(ResolveError::UnpersistedRoute {
            route_number: route.number,
        })?;
    let start = resolve_waypoint_id(waypoints, route, &route.start_waypoint)?;
    let end = resolve_waypoint_id(waypoints, route, &route.end_waypoint)?;

    Ok(SolverRoute {
        route_id,
        waypoint_ids: [start, end],
        dollar_value: route.value,
    })
}

fn resolve_waypoint_id(waypoints: &[Waypoint], route: &Route, name: &str) -> Result<i64, ResolveError> {
    let waypoint = waypoints
        .iter()
        .find(|w| w.name == name)
        .ok_or_else(|| ResolveError::UnknownWaypoint {
            route_number: route.number,
            name: name.to_string(),
        })?;

    waypoint
        .id
        .persisted()
        .ok_or_else(|| ResolveError::UnpersistedWaypoint {
            name: name.to_string(),
        })
}
