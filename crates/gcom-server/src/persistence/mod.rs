//! Persistence layer for the GCOM server.
//!
//! SQLite-backed storage for waypoints and competition routes. Creates are
//! dedup-aware: a field-identical row is found instead of duplicated.

pub mod db;
pub mod routes;
pub mod waypoints;

pub use db::{clear_all, init_database, Database};
