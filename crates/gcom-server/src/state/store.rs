//! Application state shared by every request handler.

use anyhow::Result;
use std::sync::Arc;

use gcom_mp::MissionPlannerClient;

use crate::config::Config;
use crate::notifier::{LogNotifier, Notifier, WebhookNotifier};
use crate::persistence::Database;
use crate::pipeline::FlightPlanner;
use crate::solver::{ProcessRunner, SolverInvoker, TokioProcessRunner};

pub struct AppState {
    db: Database,
    planner: FlightPlanner,
    mission_planner: Option<MissionPlannerClient>,
    config: Config,
}

impl AppState {
    /// Wire the real solver process and the configured notifier.
    pub fn new(db: Database, config: Config) -> Result<Self> {
        let notifier: Arc<dyn Notifier> = match (&config.notify_url, &config.email_to) {
            (Some(url), Some(to)) => {
                tracing::info!("Flight plans will be sent to {} via {}", to, url);
                Arc::new(WebhookNotifier::new(url.clone(), to.clone(), config.bidder_name.clone())?)
            }
            _ => {
                tracing::warn!("NOTIFY_URL or EMAIL_TO not set, flight plans will only be logged");
                Arc::new(LogNotifier::new(config.bidder_name.clone()))
            }
        };

        Self::with_components(db, config, Arc::new(TokioProcessRunner), notifier)
    }

    pub fn with_components(
        db: Database,
        config: Config,
        runner: Arc<dyn ProcessRunner>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self> {
        let mission_planner = match &config.mission_planner_url {
            Some(url) => Some(MissionPlannerClient::new(url.clone())?),
            None => {
                tracing::warn!("MP_ROUTE not set, aircraft endpoints are disabled");
                None
            }
        };

        let invoker = SolverInvoker::new(config.solver_layout(), runner, config.solver_timeout());
        let planner = FlightPlanner::new(db.clone(), invoker, notifier, config.solver_params());

        Ok(Self {
            db,
            planner,
            mission_planner,
            config,
        })
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn planner(&self) -> &FlightPlanner {
        &self.planner
    }

    pub fn mission_planner(&self) -> Option<&MissionPlannerClient> {
        self.mission_planner.as_ref()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}
