//! One processing cycle over every monitored channel.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::Result;
use crate::domain::{ChannelDiffEngine, ChannelId, ChannelSnapshot};
use crate::metrics::Monitoring;
use crate::notification::NotificationRouter;
use crate::reporting::ErrorReporter;
use crate::source::MembershipSource;
use crate::store::SnapshotRepository;

/// Per-cycle counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Channels whose stored state was advanced.
    pub processed: usize,
    /// Channels whose members could not be resolved.
    pub skipped: usize,
    /// Channels aborted before their state was saved.
    pub failed: usize,
    /// Notifications handed to the router.
    pub notifications: usize,
}

enum ChannelOutcome {
    Processed { notifications: usize },
    Skipped,
}

/// Diffs every monitored channel against its stored snapshot and routes the
/// resulting notifications.
pub struct ActivityProcessingService {
    channels: Vec<ChannelId>,
    source: Arc<dyn MembershipSource>,
    repository: SnapshotRepository,
    router: Arc<NotificationRouter>,
    diff: ChannelDiffEngine,
    monitoring: Monitoring,
    reporter: Arc<dyn ErrorReporter>,
}

impl ActivityProcessingService {
    pub fn new(
        channels: Vec<ChannelId>,
        source: Arc<dyn MembershipSource>,
        repository: SnapshotRepository,
        router: Arc<NotificationRouter>,
        monitoring: Monitoring,
        reporter: Arc<dyn ErrorReporter>,
    ) -> Self {
        Self {
            channels,
            source,
            repository,
            router,
            diff: ChannelDiffEngine::new(),
            monitoring,
            reporter,
        }
    }

    pub fn channels(&self) -> &[ChannelId] {
        &self.channels
    }

    /// Run one cycle. Channels are handled sequentially and a failing channel
    /// never stops the others.
    pub async fn process(&self) -> CycleReport {
        let started = Instant::now();
        info!(channels = ?self.channels, "Channel processing started");

        let mut report = CycleReport::default();
        for &channel_id in &self.channels {
            let channel_started = Instant::now();
            debug!(channel_id, "Processing channel");

            match self.process_channel(channel_id).await {
                Ok(ChannelOutcome::Processed { notifications }) => {
                    report.processed += 1;
                    report.notifications += notifications;
                }
                Ok(ChannelOutcome::Skipped) => report.skipped += 1,
                Err(err) => {
                    report.failed += 1;
                    self.monitoring.metrics().record_channel_failure(channel_id);
                    warn!(channel_id, error = %err, "Channel processing aborted");
                    self.reporter.report(&err);
                }
            }

            let elapsed = channel_started.elapsed();
            debug!(
                channel_id,
                processing_ms = elapsed.as_millis() as u64,
                "Channel processed"
            );
            self.monitoring
                .metrics()
                .record_channel_processing(channel_id, elapsed);
        }

        info!(
            processed = report.processed,
            skipped = report.skipped,
            failed = report.failed,
            notifications = report.notifications,
            processing_ms = started.elapsed().as_millis() as u64,
            "Channel processing finished"
        );
        self.monitoring.on_job_executed_successfully().await;

        report
    }

    async fn process_channel(&self, channel_id: ChannelId) -> Result<ChannelOutcome> {
        let Some(members) = self.source.get_members(channel_id).await else {
            debug!(channel_id, "Cannot get channel members");
            return Ok(ChannelOutcome::Skipped);
        };

        let current = ChannelSnapshot::capture(channel_id, members);
        let previous = self.repository.load_previous(channel_id).await?;
        let notifications = self.diff.compute(previous.as_ref(), &current);

        if !notifications.is_empty() {
            self.monitoring
                .metrics()
                .record_notifications(channel_id, notifications.len());
        }

        // A programming fault leaves the stored state untouched so the same
        // diff is produced again next cycle.
        if let Err(err) = self.router.send(&notifications).await {
            if err.is_programming_fault() {
                return Err(err);
            }
            warn!(channel_id, error = %err, "Notification delivery failed");
            self.monitoring.metrics().record_channel_failure(channel_id);
            self.reporter.report(&err);
        }

        self.repository.save(&current).await?;
        Ok(ChannelOutcome::Processed {
            notifications: notifications.len(),
        })
    }
}
