//! GCOM MP - Mission Planner API client
//!
//! Exchanges route queues and aircraft status with the flight-control service.

pub mod client;

pub use client::MissionPlannerClient;
