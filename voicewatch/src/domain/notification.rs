//! Membership-change notifications.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{ChannelId, User};

/// Event synthesized from two successive channel snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// A user appeared in the channel.
    NewUserJoined { channel_id: ChannelId, user: User },
    /// A user disappeared from the channel.
    UserLeft { channel_id: ChannelId, user: User },
    /// The channel went from empty to non-empty.
    UsersConnected {
        channel_id: ChannelId,
        users: Vec<User>,
    },
    /// The channel went from non-empty to empty.
    UsersAllLeft { channel_id: ChannelId },
}

impl Notification {
    pub fn channel_id(&self) -> ChannelId {
        match self {
            Self::NewUserJoined { channel_id, .. }
            | Self::UserLeft { channel_id, .. }
            | Self::UsersConnected { channel_id, .. }
            | Self::UsersAllLeft { channel_id } => *channel_id,
        }
    }

    pub fn kind(&self) -> NotificationKind {
        match self {
            Self::NewUserJoined { .. } => NotificationKind::NewUser,
            Self::UserLeft { .. } => NotificationKind::UserLeft,
            Self::UsersConnected { .. } => NotificationKind::UsersConnected,
            Self::UsersAllLeft { .. } => NotificationKind::UsersLeft,
        }
    }

    /// Whether this is a channel-level aggregate rather than a per-user event.
    pub fn is_aggregate(&self) -> bool {
        matches!(self, Self::UsersConnected { .. } | Self::UsersAllLeft { .. })
    }
}

/// Event tag used on the wire (queue envelopes, webhook `type` variable).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    NewUser,
    UserLeft,
    UsersConnected,
    UsersLeft,
}

impl NotificationKind {
    pub const ALL: [NotificationKind; 4] = [
        Self::NewUser,
        Self::UserLeft,
        Self::UsersConnected,
        Self::UsersLeft,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NewUser => "new_user",
            Self::UserLeft => "user_left",
            Self::UsersConnected => "users_connected",
            Self::UsersLeft => "users_left",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
