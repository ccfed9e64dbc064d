//! Flight plan orchestration.
//!
//! One run walks `BuildingInput -> Invoking -> ReadingOutput -> Notifying ->
//! Done`, failing at the first stage that errors. Runs are independent; a
//! failed run is never resumed.
//!
//! The solver exchanges files at fixed paths, so writing the input, running
//! the solver and reading its output happen under one lock. Loading the
//! store and building the document happen outside it.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::Mutex;
use uuid::Uuid;

use gcom_core::{reconcile, Route, SolverInput, SolverParams};

use crate::errors::PlanError;
use crate::notifier::Notifier;
use crate::persistence::{routes, waypoints, Database};
use crate::solver::SolverInvoker;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Idle,
    BuildingInput,
    Invoking,
    ReadingOutput,
    Notifying,
    Done,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PipelineStage::Idle => "idle",
            PipelineStage::BuildingInput => "building input",
            PipelineStage::Invoking => "invoking solver",
            PipelineStage::ReadingOutput => "reading output",
            PipelineStage::Notifying => "notifying",
            PipelineStage::Done => "done",
        };
        f.write_str(label)
    }
}

/// A run that ended in `Failed`, with the stage it failed in.
#[derive(Debug, Error)]
#[error("flight planning failed while {stage}: {error}")]
pub struct PipelineFailure {
    pub stage: PipelineStage,
    #[source]
    pub error: PlanError,
}

/// Result of a successful run.
#[derive(Debug, Clone, Serialize)]
pub struct FlightPlan {
    pub run_id: String,
    pub computed_at: DateTime<Utc>,
    /// Routes in flight order; `order` is the position
    pub routes: Vec<Route>,
    /// Set when the plan was computed but could not be delivered
    pub notification_error: Option<String>,
}

pub struct FlightPlanner {
    db: Database,
    invoker: SolverInvoker,
    notifier: Arc<dyn Notifier>,
    params: SolverParams,
    solver_lock: Mutex<()>,
}

impl FlightPlanner {
    pub fn new(
        db: Database,
        invoker: SolverInvoker,
        notifier: Arc<dyn Notifier>,
        params: SolverParams,
    ) -> Self {
        Self {
            db,
            invoker,
            notifier,
            params,
            solver_lock: Mutex::new(()),
        }
    }

    /// Snapshot the store into a solver input document. Read-only.
    pub async fn build_input(&self) -> Result<SolverInput, PlanError> {
        let waypoints = waypoints::load_all_waypoints(self.db.pool()).await?;
        let routes = routes::load_all_routes(self.db.pool()).await?;
        Ok(SolverInput::build(waypoints, routes, &self.params)?)
    }

    /// Compute, record and announce a flight plan from the current store.
    pub async fn plan(&self) -> Result<FlightPlan, PipelineFailure> {
        let run_id = Uuid::new_v4().to_string()[..8].to_string();
        let fail = |stage: PipelineStage| {
            let run_id = run_id.clone();
            move |error: PlanError| {
                tracing::error!("[{}] Flight planning failed while {}: {}", run_id, stage, error);
                PipelineFailure { stage, error }
            }
        };

        tracing::info!("[{}] {}", run_id, PipelineStage::BuildingInput);
        let input = self
            .build_input()
            .await
            .map_err(fail(PipelineStage::BuildingInput))?;

        let plan = {
            let _guard = self.solver_lock.lock().await;

            self.invoker
                .write_input(&input)
                .await
                .map_err(fail(PipelineStage::BuildingInput))?;

            tracing::info!("[{}] {}", run_id, PipelineStage::Invoking);
            self.invoker
                .invoke()
                .await
                .map_err(fail(PipelineStage::Invoking))?;

            tracing::info!("[{}] {}", run_id, PipelineStage::ReadingOutput);
            self.read_plan(&input)
                .await
                .map_err(fail(PipelineStage::ReadingOutput))?
        };

        tracing::info!("[{}] {} ({} routes)", run_id, PipelineStage::Notifying, plan.len());
        let notification_error = match self.notifier.send_flight_plan(&plan).await {
            Ok(()) => None,
            Err(err) => {
                tracing::warn!("[{}] Flight plan computed but not delivered: {:#}", run_id, err);
                Some(format!("{:#}", err))
            }
        };

        tracing::info!("[{}] {}", run_id, PipelineStage::Done);
        Ok(FlightPlan {
            run_id,
            computed_at: Utc::now(),
            routes: plan,
            notification_error,
        })
    }

    async fn read_plan(&self, input: &SolverInput) -> Result<Vec<Route>, PlanError> {
        let output = self.invoker.read_output().await?;
        let plan = reconcile(input, &output)?;
        routes::record_route_orders(self.db.pool(), &plan).await?;
        Ok(plan)
    }
}
