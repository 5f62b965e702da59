//! Channel snapshot persistence.
//!
//! [`StateStore`] is a plain string key-value seam; [`SnapshotRepository`]
//! owns the record format and the staleness rule on top of it.

mod memory;
mod redis;

pub use self::memory::InMemoryStateStore;
pub use self::redis::{RedisStateStore, open_redis};

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::Result;
use crate::domain::{ChannelId, ChannelSnapshot, User};

/// Raw per-channel state storage.
#[async_trait]
pub trait StateStore: Send + Sync {
    async fn get(&self, channel_id: ChannelId) -> Result<Option<String>>;
    async fn set(&self, channel_id: ChannelId, value: String) -> Result<()>;
}

/// Stored form of a snapshot. `ts` is in unix seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelState {
    pub id: ChannelId,
    pub ts: i64,
    pub users: Vec<StoredUser>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredUser {
    pub username: String,
    pub id: i64,
}

impl ChannelState {
    pub fn from_snapshot(snapshot: &ChannelSnapshot) -> Self {
        Self {
            id: snapshot.channel_id(),
            ts: snapshot.captured_at().timestamp(),
            users: snapshot
                .users()
                .map(|u| StoredUser {
                    username: u.username.clone(),
                    id: u.id,
                })
                .collect(),
        }
    }

    /// `None` when `ts` is outside the representable range.
    pub fn into_snapshot(self) -> Option<ChannelSnapshot> {
        let captured_at = Utc.timestamp_opt(self.ts, 0).single()?;
        let users = self
            .users
            .into_iter()
            .map(|u| User::new(u.id, u.username));
        Some(ChannelSnapshot::new(self.id, users, captured_at))
    }
}

/// Loads and saves [`ChannelSnapshot`]s through a [`StateStore`].
#[derive(Clone)]
pub struct SnapshotRepository {
    store: Arc<dyn StateStore>,
}

impl SnapshotRepository {
    pub fn new(store: Arc<dyn StateStore>) -> Self {
        Self { store }
    }

    /// Previous snapshot usable as a diff baseline, if any.
    pub async fn load_previous(&self, channel_id: ChannelId) -> Result<Option<ChannelSnapshot>> {
        self.load_previous_at(channel_id, Utc::now()).await
    }

    /// Like [`load_previous`](Self::load_previous) with an explicit clock.
    ///
    /// Missing, expired and undecodable records all yield `None`.
    pub async fn load_previous_at(
        &self,
        channel_id: ChannelId,
        now: DateTime<Utc>,
    ) -> Result<Option<ChannelSnapshot>> {
        let Some(raw) = self.store.get(channel_id).await? else {
            debug!(channel_id, "No previous state");
            return Ok(None);
        };

        let snapshot = match serde_json::from_str::<ChannelState>(&raw) {
            Ok(state) => state.into_snapshot(),
            Err(e) => {
                warn!(channel_id, error = %e, "Discarding undecodable channel state");
                return Ok(None);
            }
        };
        let Some(snapshot) = snapshot else {
            warn!(channel_id, "Discarding channel state with invalid timestamp");
            return Ok(None);
        };

        if snapshot.is_expired_at(now) {
            debug!(channel_id, "Previous state outdated");
            return Ok(None);
        }

        Ok(Some(snapshot))
    }

    pub async fn save(&self, snapshot: &ChannelSnapshot) -> Result<()> {
        let state = ChannelState::from_snapshot(snapshot);
        let raw = serde_json::to_string(&state)?;
        self.store.set(snapshot.channel_id(), raw).await
    }
}
