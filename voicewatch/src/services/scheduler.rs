use std::sync::Arc;
use std::time::Duration;

use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::processing::ActivityProcessingService;

/// Runs [`ActivityProcessingService::process`] on a fixed interval.
///
/// The first cycle starts immediately. A cycle that overruns the interval
/// delays the next tick instead of bursting to catch up.
pub struct Scheduler {
    service: Arc<ActivityProcessingService>,
    period: Duration,
}

impl Scheduler {
    pub fn new(service: Arc<ActivityProcessingService>, period: Duration) -> Self {
        Self { service, period }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Tick until `cancel` fires. A cycle in progress is finished first.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(period_secs = self.period.as_secs_f64(), "Scheduler started");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("Scheduler shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    self.service.process().await;
                }
            }
        }

        info!("Scheduler stopped");
    }
}
