pub mod errors;
pub mod flight_plan;
pub mod models;
pub mod reconcile;
pub mod solver;

pub use errors::{ReconcileError, ResolveError};
pub use flight_plan::{flight_plan_message, FlightPlanMessage};
pub use models::{AircraftStatus, EntityId, Queue, Route, Waypoint, SENTINEL_ID};
pub use reconcile::reconcile;
pub use solver::{ReRouter, RouteFinder, SolverInput, SolverOutput, SolverParams, SolverRoute};
