//! Server configuration from environment.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use gcom_core::{ReRouter, RouteFinder, SolverParams};

use crate::solver::SolverLayout;

#[cfg(windows)]
const DEFAULT_SOLVER_EXECUTABLE: &str = "pathfinding.exe";
#[cfg(not(windows))]
const DEFAULT_SOLVER_EXECUTABLE: &str = "pathfinding";

#[derive(Debug, Clone)]
pub struct Config {
    pub server_port: u16,
    pub database_path: String,
    pub database_max_connections: u32,
    /// Wipe waypoints and routes at startup
    pub reset_on_start: bool,

    pub solver_dir: PathBuf,
    pub solver_executable: String,
    pub solver_input_file: String,
    pub solver_output_file: String,
    pub solver_timeout_secs: u64,

    pub cruise_speed: f64,
    pub cruise_altitude: f64,
    pub climb_rate: f64,
    pub starting_waypoint_id: i64,

    /// Mission Planner bridge base URL; aircraft endpoints are off when unset
    pub mission_planner_url: Option<String>,
    pub bidder_name: String,
    pub email_to: Option<String>,
    /// Mail relay endpoint; flight plans are only logged when unset
    pub notify_url: Option<String>,
    pub uas_waypoints_file: PathBuf,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            server_port: parsed("GCOM_PORT", 1323),
            database_path: env::var("GCOM_DATABASE_PATH")
                .unwrap_or_else(|_| "data/gcom.sqlite".to_string()),
            database_max_connections: parsed("GCOM_DATABASE_MAX_CONNECTIONS", 5),
            reset_on_start: flag("GCOM_RESET_ON_START"),

            solver_dir: env::var("GCOM_SOLVER_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("pathfinding")),
            solver_executable: env::var("GCOM_SOLVER_EXECUTABLE")
                .unwrap_or_else(|_| DEFAULT_SOLVER_EXECUTABLE.to_string()),
            solver_input_file: env::var("GCOM_SOLVER_INPUT_FILE")
                .unwrap_or_else(|_| "input.json".to_string()),
            solver_output_file: env::var("GCOM_SOLVER_OUTPUT_FILE")
                .unwrap_or_else(|_| "output.json".to_string()),
            solver_timeout_secs: parsed("GCOM_SOLVER_TIMEOUT_SECS", 120),

            cruise_speed: parsed("GCOM_CRUISE_SPEED", 10.0),
            cruise_altitude: parsed("GCOM_CRUISE_ALTITUDE", 100.0),
            climb_rate: parsed("GCOM_CLIMB_RATE", 2.0),
            starting_waypoint_id: parsed("GCOM_STARTING_WAYPOINT_ID", 1),

            mission_planner_url: non_empty("MP_ROUTE"),
            bidder_name: env::var("BIDDER_NAME").unwrap_or_else(|_| "GCOM".to_string()),
            email_to: non_empty("EMAIL_TO"),
            notify_url: non_empty("NOTIFY_URL"),
            uas_waypoints_file: env::var("UAS_WAYPOINTS_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("uas_waypoints.json")),
        }
    }

    pub fn solver_layout(&self) -> SolverLayout {
        SolverLayout {
            dir: self.solver_dir.clone(),
            executable: self.solver_executable.clone(),
            input_file: self.solver_input_file.clone(),
            output_file: self.solver_output_file.clone(),
        }
    }

    pub fn solver_params(&self) -> SolverParams {
        SolverParams {
            route_finder: RouteFinder {
                speed: self.cruise_speed,
                altitude: self.cruise_altitude,
                climb_rate: self.climb_rate,
                starting_waypoint_id: self.starting_waypoint_id,
            },
            re_router: ReRouter::default(),
        }
    }

    pub fn solver_timeout(&self) -> Duration {
        Duration::from_secs(self.solver_timeout_secs)
    }
}

fn parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

fn flag(key: &str) -> bool {
    env::var(key)
        .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}
