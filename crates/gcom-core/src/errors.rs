//! Errors raised while preparing solver input or interpreting solver output.

use thiserror::Error;

/// A route could not be expressed in solver terms.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("route {route_number} references unknown waypoint '{name}'")]
    UnknownWaypoint { route_number: u32, name: String },
    #[error("waypoint '{name}' has not been stored")]
    UnpersistedWaypoint { name: String },
    #[error("route {route_number} has not been stored")]
    UnpersistedRoute { route_number: u32 },
}

/// Solver output disagrees with the routes it was given.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReconcileError {
    #[error("solver returned route id {route_id} which matches no submitted route")]
    UnknownRoute { route_id: i64 },
    #[error("solver returned route id {route_id} which matches {matches} submitted routes")]
    AmbiguousRoute { route_id: i64, matches: usize },
    #[error("solver returned route id {route_id} more than once")]
    DuplicateRoute { route_id: i64 },
}
