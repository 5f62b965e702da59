//! Point-in-time channel membership.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};

use super::{ChannelId, User, UserId};

/// How long a stored snapshot stays usable as a diff baseline.
pub const STATE_LIFETIME: Duration = Duration::from_secs(60 * 60);

/// Recorded set of users in a channel at `captured_at`.
///
/// Users are keyed by id, so a snapshot never holds two members with the same
/// id. Iteration order is ascending by user id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelSnapshot {
    channel_id: ChannelId,
    users: BTreeMap<UserId, User>,
    captured_at: DateTime<Utc>,
}

impl ChannelSnapshot {
    /// Build a snapshot. When the same id appears more than once the first
    /// occurrence wins.
    pub fn new(
        channel_id: ChannelId,
        users: impl IntoIterator<Item = User>,
        captured_at: DateTime<Utc>,
    ) -> Self {
        let mut by_id = BTreeMap::new();
        for user in users {
            by_id.entry(user.id).or_insert(user);
        }

        Self {
            channel_id,
            users: by_id,
            captured_at,
        }
    }

    /// Snapshot captured now.
    pub fn capture(channel_id: ChannelId, users: impl IntoIterator<Item = User>) -> Self {
        Self::new(channel_id, users, Utc::now())
    }

    pub fn channel_id(&self) -> ChannelId {
        self.channel_id
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    pub fn users(&self) -> impl Iterator<Item = &User> {
        self.users.values()
    }

    pub fn get(&self, user_id: UserId) -> Option<&User> {
        self.users.get(&user_id)
    }

    pub fn contains(&self, user_id: UserId) -> bool {
        self.users.contains_key(&user_id)
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// Whether this snapshot is too old to serve as a baseline at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        let age = now.signed_duration_since(self.captured_at).num_seconds();
        age > STATE_LIFETIME.as_secs() as i64
    }
}
