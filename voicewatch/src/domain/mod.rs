//! Domain model shared by every component.
//!
//! Snapshots and users are plain value types; [`Notification`] is the
//! synthesized membership-change event produced by [`ChannelDiffEngine`].

pub mod diff;
pub mod notification;
pub mod snapshot;
pub mod user;

pub use diff::ChannelDiffEngine;
pub use notification::{Notification, NotificationKind};
pub use snapshot::{ChannelSnapshot, STATE_LIFETIME};
pub use user::User;

/// Chat-platform channel identifier.
pub type ChannelId = i64;

/// Chat-platform user identifier.
pub type UserId = i64;
