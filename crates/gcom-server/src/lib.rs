//! Ground control backend: waypoint/route storage, flight plan computation
//! through the external path solver, and the REST surface over both.

pub mod api;
pub mod config;
pub mod errors;
pub mod notifier;
pub mod persistence;
pub mod pipeline;
pub mod solver;
pub mod state;
