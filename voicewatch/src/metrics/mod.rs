//! Metrics and health monitoring.
//!
//! - [`MetricsCollector`]: lock-free counters shared by every component
//! - [`Heartbeat`]: "job executed successfully" signal, one per cycle
//! - [`Monitoring`]: the two bundled together for the processing service

mod collector;
mod heartbeat;

pub use collector::{MetricsCollector, MetricsSnapshot};
pub use heartbeat::{HealthChecksIoHeartbeat, Heartbeat, NoopHeartbeat};

use std::sync::Arc;

/// Metrics plus heartbeat.
#[derive(Clone)]
pub struct Monitoring {
    metrics: Arc<MetricsCollector>,
    heartbeat: Arc<dyn Heartbeat>,
}

impl Monitoring {
    pub fn new(metrics: Arc<MetricsCollector>, heartbeat: Arc<dyn Heartbeat>) -> Self {
        Self { metrics, heartbeat }
    }

    /// Counters only, no heartbeat.
    pub fn local() -> Self {
        Self::new(Arc::new(MetricsCollector::new()), Arc::new(NoopHeartbeat))
    }

    pub fn metrics(&self) -> &Arc<MetricsCollector> {
        &self.metrics
    }

    /// Signal a completed processing cycle.
    pub async fn on_job_executed_successfully(&self) {
        self.metrics.record_cycle_completed();
        self.heartbeat.beat().await;
    }
}
