//! Metrics collector implementation.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::domain::ChannelId;

/// Counters for processing and delivery.
///
/// Every method takes `&self`; concurrent channel processing may increment
/// freely without ordering requirements.
#[derive(Debug, Default)]
pub struct MetricsCollector {
    // Per-channel processing
    channel_processing_ms: DashMap<ChannelId, AtomicU64>,
    channel_processing_count: DashMap<ChannelId, AtomicU64>,
    channel_notifications: DashMap<ChannelId, AtomicU64>,
    channel_failures: DashMap<ChannelId, AtomicU64>,

    // Delivery
    webhook_calls: AtomicU64,
    webhook_failures: AtomicU64,
    queue_pushes: AtomicU64,

    // Cycles
    cycles_completed: AtomicU64,
}

fn bump(map: &DashMap<ChannelId, AtomicU64>, channel_id: ChannelId, by: u64) {
    map.entry(channel_id)
        .or_insert_with(|| AtomicU64::new(0))
        .fetch_add(by, Ordering::Relaxed);
}

fn read(map: &DashMap<ChannelId, AtomicU64>, channel_id: ChannelId) -> u64 {
    map.get(&channel_id)
        .map(|v| v.load(Ordering::Relaxed))
        .unwrap_or(0)
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    // ========== Processing ==========

    pub fn record_channel_processing(&self, channel_id: ChannelId, elapsed: Duration) {
        bump(
            &self.channel_processing_ms,
            channel_id,
            elapsed.as_millis() as u64,
        );
        bump(&self.channel_processing_count, channel_id, 1);
    }

    pub fn record_notifications(&self, channel_id: ChannelId, count: usize) {
        bump(&self.channel_notifications, channel_id, count as u64);
    }

    pub fn record_channel_failure(&self, channel_id: ChannelId) {
        bump(&self.channel_failures, channel_id, 1);
    }

    pub fn record_cycle_completed(&self) {
        self.cycles_completed.fetch_add(1, Ordering::Relaxed);
    }

    // ========== Delivery ==========

    pub fn record_webhook_call(&self) {
        self.webhook_calls.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_webhook_failure(&self) {
        self.webhook_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_queue_push(&self) {
        self.queue_pushes.fetch_add(1, Ordering::Relaxed);
    }

    // ========== Accessors ==========

    pub fn channel_notifications(&self, channel_id: ChannelId) -> u64 {
        read(&self.channel_notifications, channel_id)
    }

    pub fn channel_failures(&self, channel_id: ChannelId) -> u64 {
        read(&self.channel_failures, channel_id)
    }

    pub fn channel_processing_count(&self, channel_id: ChannelId) -> u64 {
        read(&self.channel_processing_count, channel_id)
    }

    pub fn webhook_calls(&self) -> u64 {
        self.webhook_calls.load(Ordering::Relaxed)
    }

    pub fn webhook_failures(&self) -> u64 {
        self.webhook_failures.load(Ordering::Relaxed)
    }

    pub fn queue_pushes(&self) -> u64 {
        self.queue_pushes.load(Ordering::Relaxed)
    }

    pub fn cycles_completed(&self) -> u64 {
        self.cycles_completed.load(Ordering::Relaxed)
    }

    /// Point-in-time copy of every counter.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let mut channels: Vec<ChannelMetrics> = self
            .channel_processing_count
            .iter()
            .map(|entry| {
                let channel_id = *entry.key();
                ChannelMetrics {
                    channel_id,
                    processing_count: entry.value().load(Ordering::Relaxed),
                    processing_ms_total: read(&self.channel_processing_ms, channel_id),
                    notifications: read(&self.channel_notifications, channel_id),
                    failures: read(&self.channel_failures, channel_id),
                }
            })
            .collect();
        channels.sort_by_key(|c| c.channel_id);

        MetricsSnapshot {
            channels,
            webhook_calls: self.webhook_calls(),
            webhook_failures: self.webhook_failures(),
            queue_pushes: self.queue_pushes(),
            cycles_completed: self.cycles_completed(),
        }
    }
}

/// Per-channel counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelMetrics {
    pub channel_id: ChannelId,
    pub processing_count: u64,
    pub processing_ms_total: u64,
    pub notifications: u64,
    pub failures: u64,
}

/// Serializable view of [`MetricsCollector`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub channels: Vec<ChannelMetrics>,
    pub webhook_calls: u64,
    pub webhook_failures: u64,
    pub queue_pushes: u64,
    pub cycles_completed: u64,
}
