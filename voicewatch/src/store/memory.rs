use async_trait::async_trait;
use dashmap::DashMap;

use super::StateStore;
use crate::Result;
use crate::domain::ChannelId;

/// Process-local [`StateStore`].
#[derive(Debug, Default)]
pub struct InMemoryStateStore {
    entries: DashMap<ChannelId, String>,
}

impl InMemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl StateStore for InMemoryStateStore {
    async fn get(&self, channel_id: ChannelId) -> Result<Option<String>> {
        Ok(self.entries.get(&channel_id).map(|v| v.value().clone()))
    }

    async fn set(&self, channel_id: ChannelId, value: String) -> Result<()> {
        self.entries.insert(channel_id, value);
        Ok(())
    }
}
