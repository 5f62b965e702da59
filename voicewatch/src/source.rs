//! Channel membership provider seam.
//!
//! The chat-platform client lives outside this crate; it only has to answer
//! "who is in channel X right now".

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::domain::{ChannelId, User};

/// Current members of a voice channel.
#[async_trait]
pub trait MembershipSource: Send + Sync {
    /// `None` when the channel cannot be resolved, which is different from an
    /// empty channel.
    async fn get_members(&self, channel_id: ChannelId) -> Option<Vec<User>>;
}

/// [`MembershipSource`] fed by hand.
#[derive(Debug, Default)]
pub struct InMemoryMembershipSource {
    channels: RwLock<HashMap<ChannelId, Vec<User>>>,
}

impl InMemoryMembershipSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_members(&self, channel_id: ChannelId, users: Vec<User>) {
        self.channels.write().insert(channel_id, users);
    }

    /// Make the channel unresolvable.
    pub fn remove_channel(&self, channel_id: ChannelId) {
        self.channels.write().remove(&channel_id);
    }
}

#[async_trait]
impl MembershipSource for InMemoryMembershipSource {
    async fn get_members(&self, channel_id: ChannelId) -> Option<Vec<User>> {
        self.channels.read().get(&channel_id).cloned()
    }
}
