//! Flight plan notification.
//!
//! Sending is a side effect of planning: a failed notification never
//! invalidates a computed plan.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

use gcom_core::{flight_plan_message, Route};

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_flight_plan(&self, routes: &[Route]) -> Result<()>;
}

/// Logs the flight plan message instead of sending it.
pub struct LogNotifier {
    bidder: String,
}

impl LogNotifier {
    pub fn new(bidder: impl Into<String>) -> Self {
        Self {
            bidder: bidder.into(),
        }
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn send_flight_plan(&self, routes: &[Route]) -> Result<()> {
        let message = flight_plan_message(&self.bidder, routes);
        tracing::info!("{}: {}", message.subject, message.body);
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct MailRequest<'a> {
    to: &'a str,
    subject: &'a str,
    body: &'a str,
}

/// Hands the flight plan email to a mail relay over HTTP.
pub struct WebhookNotifier {
    client: Client,
    url: String,
    to: String,
    bidder: String,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>, to: impl Into<String>, bidder: impl Into<String>) -> Result<Self> {
        Ok(Self {
            client: Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .context("Failed to create HTTP client")?,
            url: url.into(),
            to: to.into(),
            bidder: bidder.into(),
        })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn send_flight_plan(&self, routes: &[Route]) -> Result<()> {
        let message = flight_plan_message(&self.bidder, routes);
        let request = MailRequest {
            to: &self.to,
            subject: &message.subject,
            body: &message.body,
        };

        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .context("Failed to send flight plan")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!(
                "Flight plan delivery failed: {} {}",
                status,
                body
            ));
        }

        tracing::info!("Sent '{}' to {}", message.subject, self.to);
        Ok(())
    }
}
