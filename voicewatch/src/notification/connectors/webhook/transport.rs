//! HTTP transport for webhook calls.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::metrics::MetricsCollector;
use crate::reporting::ErrorReporter;
use crate::utils::retry::{RetryPolicy, retry_with_backoff};
use crate::{Error, Result};

/// What happens once every retry of a webhook call has failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeliveryMode {
    /// Report the error and carry on.
    #[default]
    Lenient,
    /// Report the error and return it to the caller.
    Strict,
}

/// Performs one webhook call for a rendered URL.
#[async_trait]
pub trait WebhookTransport: Send + Sync {
    async fn call(&self, url: &str) -> Result<()>;
}

/// Timeouts, retry policy and failure mode of [`HttpWebhookTransport`].
#[derive(Debug, Clone)]
pub struct HttpTransportConfig {
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    pub total_timeout: Duration,
    pub retry: RetryPolicy,
    pub mode: DeliveryMode,
}

impl Default for HttpTransportConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            read_timeout: Duration::from_secs(5),
            total_timeout: Duration::from_secs(15),
            retry: RetryPolicy::default(),
            mode: DeliveryMode::Lenient,
        }
    }
}

/// GETs rendered webhook URLs with retry.
///
/// A transport error or a status >= 400 is a failed attempt. After the last
/// attempt the error goes to the [`ErrorReporter`] and is swallowed, unless
/// the transport runs in [`DeliveryMode::Strict`].
pub struct HttpWebhookTransport {
    client: Client,
    config: HttpTransportConfig,
    reporter: Arc<dyn ErrorReporter>,
    metrics: Arc<MetricsCollector>,
}

impl HttpWebhookTransport {
    pub fn new(
        config: HttpTransportConfig,
        reporter: Arc<dyn ErrorReporter>,
        metrics: Arc<MetricsCollector>,
    ) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .read_timeout(config.read_timeout)
            .timeout(config.total_timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(|e| Error::Other(format!("Failed to build webhook client: {}", e)))?;

        Ok(Self {
            client,
            config,
            reporter,
            metrics,
        })
    }

    pub fn mode(&self) -> DeliveryMode {
        self.config.mode
    }

    async fn deliver(&self, url: &str) -> Result<()> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::delivery(url, e))?;

        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            return Err(Error::delivery(url, format!("HTTP status {}", status)));
        }

        debug!(url = %url, status = %status, "Webhook delivered");
        Ok(())
    }
}

#[async_trait]
impl WebhookTransport for HttpWebhookTransport {
    async fn call(&self, url: &str) -> Result<()> {
        match retry_with_backoff(&self.config.retry, |_| self.deliver(url)).await {
            Ok(()) => Ok(()),
            Err(err) => {
                self.metrics.record_webhook_failure();
                self.reporter.report(&err);
                match self.config.mode {
                    DeliveryMode::Strict => Err(err),
                    DeliveryMode::Lenient => Ok(()),
                }
            }
        }
    }
}
