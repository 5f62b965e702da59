//! Cycle heartbeat.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};

use crate::{Error, Result};

const HEARTBEAT_TIMEOUT: Duration = Duration::from_secs(15);

/// Signal fired once per completed processing cycle.
#[async_trait]
pub trait Heartbeat: Send + Sync {
    /// Never fails; problems are logged.
    async fn beat(&self);
}

/// Heartbeat that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHeartbeat;

#[async_trait]
impl Heartbeat for NoopHeartbeat {
    async fn beat(&self) {}
}

/// Pings a healthchecks.io style URL with a GET.
#[derive(Debug, Clone)]
pub struct HealthChecksIoHeartbeat {
    url: String,
    client: Client,
}

impl HealthChecksIoHeartbeat {
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(HEARTBEAT_TIMEOUT)
            .build()
            .map_err(|e| Error::Other(format!("Failed to build heartbeat client: {}", e)))?;

        Ok(Self {
            url: url.into(),
            client,
        })
    }
}

#[async_trait]
impl Heartbeat for HealthChecksIoHeartbeat {
    async fn beat(&self) {
        match self.client.get(&self.url).send().await {
            Ok(response) if response.status().is_success() => {
                debug!("Heartbeat sent");
            }
            Ok(response) => warn!(status = %response.status(), "Heartbeat rejected"),
            Err(e) => warn!(error = %e, "Heartbeat failed"),
        }
    }
}
