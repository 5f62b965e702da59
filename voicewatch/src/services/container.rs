//! Service container.
//!
//! [`VoiceWatch`] wires configuration, storage, delivery and scheduling
//! together and owns the shutdown token.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::processing::ActivityProcessingService;
use super::scheduler::Scheduler;
use crate::Result;
use crate::config::{AppConfig, MonitorConfig};
use crate::metrics::{HealthChecksIoHeartbeat, Heartbeat, MetricsCollector, Monitoring, NoopHeartbeat};
use crate::notification::{
    HttpTransportConfig, HttpWebhookTransport, NotificationRouter, QueueConnector, QueuePusher,
    RedisQueuePusher, WebhookConnector, WebhookTransport,
};
use crate::reporting::{ErrorReporter, TracingErrorReporter};
use crate::source::MembershipSource;
use crate::store::{RedisStateStore, SnapshotRepository, StateStore, open_redis};

/// Externally provided collaborators.
pub struct Backends {
    pub source: Arc<dyn MembershipSource>,
    pub state_store: Arc<dyn StateStore>,
    pub queue_pusher: Arc<dyn QueuePusher>,
    pub webhook_transport: Option<Arc<dyn WebhookTransport>>,
    pub reporter: Arc<dyn ErrorReporter>,
}

/// Fully wired application.
pub struct VoiceWatch {
    config: AppConfig,
    monitor_config: MonitorConfig,
    metrics: Arc<MetricsCollector>,
    processing: Arc<ActivityProcessingService>,
    cancellation_token: CancellationToken,
}

impl VoiceWatch {
    /// Load the monitor config from disk, connect to Redis and wire every
    /// component around `source`.
    pub async fn connect(config: AppConfig, source: Arc<dyn MembershipSource>) -> Result<Self> {
        info!(path = %config.channel_config_path.display(), "Loading channel config");
        let monitor_config = MonitorConfig::from_file(&config.channel_config_path)?;

        let conn = open_redis(&config.redis_url).await?;
        let backends = Backends {
            source,
            state_store: Arc::new(RedisStateStore::new(conn.clone())),
            queue_pusher: Arc::new(RedisQueuePusher::new(conn)),
            webhook_transport: None,
            reporter: Arc::new(TracingErrorReporter),
        };

        Self::build(config, monitor_config, backends)
    }

    /// Wire every component. When `backends.webhook_transport` is `None` an
    /// [`HttpWebhookTransport`] is created from `config`.
    pub fn build(
        config: AppConfig,
        monitor_config: MonitorConfig,
        backends: Backends,
    ) -> Result<Self> {
        info!(
            channels = monitor_config.channels().len(),
            "Initializing services"
        );

        let metrics = Arc::new(MetricsCollector::new());
        let heartbeat: Arc<dyn Heartbeat> = match &config.healthchecks_webhook {
            Some(url) => Arc::new(HealthChecksIoHeartbeat::new(url.clone())?),
            None => Arc::new(NoopHeartbeat),
        };
        let monitoring = Monitoring::new(metrics.clone(), heartbeat);

        let webhook_transport = match backends.webhook_transport {
            Some(transport) => transport,
            None => {
                let transport_config = HttpTransportConfig {
                    mode: config.webhook_mode,
                    ..Default::default()
                };
                Arc::new(HttpWebhookTransport::new(
                    transport_config,
                    backends.reporter.clone(),
                    metrics.clone(),
                )?)
            }
        };

        let mut router = NotificationRouter::new(&monitor_config);
        router.register_connector(Arc::new(WebhookConnector::new(
            &monitor_config,
            webhook_transport,
            metrics.clone(),
        )?));
        router.register_connector(Arc::new(QueueConnector::new(
            &monitor_config,
            backends.queue_pusher,
            metrics.clone(),
        )));
        let unrouted = router.unrouted_targets();
        if !unrouted.is_empty() {
            warn!(count = unrouted.len(), "Some channel targets have no connector");
        }

        let processing = Arc::new(ActivityProcessingService::new(
            monitor_config.channel_ids(),
            backends.source,
            SnapshotRepository::new(backends.state_store),
            Arc::new(router),
            monitoring,
            backends.reporter,
        ));

        info!("Services initialized");
        Ok(Self {
            config,
            monitor_config,
            metrics,
            processing,
            cancellation_token: CancellationToken::new(),
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn monitor_config(&self) -> &MonitorConfig {
        &self.monitor_config
    }

    pub fn metrics(&self) -> &Arc<MetricsCollector> {
        &self.metrics
    }

    pub fn processing(&self) -> &Arc<ActivityProcessingService> {
        &self.processing
    }

    pub fn scheduler(&self) -> Scheduler {
        Scheduler::new(self.processing.clone(), self.config.check_interval)
    }

    /// Run the scheduler until [`shutdown`](Self::shutdown) is called.
    pub async fn run(&self) {
        self.scheduler().run(self.cancellation_token.clone()).await;
    }

    pub fn shutdown(&self) {
        info!("Shutting down");
        self.cancellation_token.cancel();
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation_token.clone()
    }
}
