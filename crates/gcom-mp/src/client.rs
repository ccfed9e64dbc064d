//! Mission Planner HTTP client.

use anyhow::{Context, Result};
use reqwest::{Client, RequestBuilder, Response};
use std::time::Duration;

use gcom_core::models::{AircraftStatus, Queue, Waypoint};

/// HTTP client for the Mission Planner flight-control service.
pub struct MissionPlannerClient {
    pub(crate) client: Client,
    pub(crate) base_url: String,
}

impl MissionPlannerClient {
    /// Create a new client rooted at `base_url` (e.g. `http://localhost:9000`).
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Fetch the waypoint queue the aircraft is currently following.
    pub async fn get_queue(&self) -> Result<Queue> {
        let response = self.send(self.client.get(self.url("queue")), "get queue").await?;
        let queue = response
            .json::<Vec<Waypoint>>()
            .await
            .context("Failed to parse queue response")?;
        Ok(Queue { queue })
    }

    /// Replace the aircraft's waypoint queue.
    pub async fn post_queue(&self, queue: &Queue) -> Result<()> {
        self.send(
            self.client.post(self.url("queue")).json(&queue.queue),
            "post queue",
        )
        .await?;
        Ok(())
    }

    /// Fetch live aircraft telemetry.
    pub async fn get_status(&self) -> Result<AircraftStatus> {
        let response = self.send(self.client.get(self.url("status")), "get status").await?;
        response
            .json::<AircraftStatus>()
            .await
            .context("Failed to parse aircraft status")
    }

    /// Stop the aircraft from advancing through its queue.
    pub async fn lock(&self) -> Result<()> {
        self.command("lock").await
    }

    /// Resume queue following.
    pub async fn unlock(&self) -> Result<()> {
        self.command("unlock").await
    }

    /// Fly back to the launch site.
    pub async fn return_to_launch(&self) -> Result<()> {
        self.command("rtl").await
    }

    /// Descend and land at the current position.
    pub async fn land(&self) -> Result<()> {
        self.command("land").await
    }

    /// Set the aircraft's home waypoint.
    pub async fn post_home(&self, home: &Waypoint) -> Result<()> {
        self.send(self.client.post(self.url("home")).json(home), "set home")
            .await?;
        Ok(())
    }

    async fn command(&self, name: &str) -> Result<()> {
        self.send(self.client.get(self.url(name)), name).await?;
        Ok(())
    }

    async fn send(&self, request: RequestBuilder, action: &str) -> Result<Response> {
        let response = request
            .send()
            .await
            .with_context(|| format!("Failed to {} on Mission Planner", action))?;

        let status = response.status();
        tracing::debug!("Mission Planner {} -> {}", action, status);

        if status != reqwest::StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            tracing::error!("Mission Planner {} failed: {} {}", action, status, body);
            return Err(anyhow::anyhow!(
                "Mission Planner {} failed: {} {}",
                action,
                status,
                body
            ));
        }

        Ok(response)
    }
}
