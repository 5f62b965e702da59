use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use tracing::info;

use super::StateStore;
use crate::domain::ChannelId;
use crate::{Error, Result};

const SOCKET_TIMEOUT: Duration = Duration::from_secs(10);

/// Connect to Redis with a 10 s connect and response timeout.
pub async fn open_redis(url: &str) -> Result<ConnectionManager> {
    let client = redis::Client::open(url)
        .map_err(|e| Error::config(format!("Invalid Redis URL: {}", e)))?;
    let config = ConnectionManagerConfig::new()
        .set_connection_timeout(SOCKET_TIMEOUT)
        .set_response_timeout(SOCKET_TIMEOUT);

    let conn = ConnectionManager::new_with_config(client, config).await?;
    info!("Connected to Redis");
    Ok(conn)
}

/// [`StateStore`] backed by Redis string keys.
#[derive(Clone)]
pub struct RedisStateStore {
    conn: ConnectionManager,
}

impl RedisStateStore {
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }

    pub fn key(channel_id: ChannelId) -> String {
        format!("channel_v2_{channel_id}")
    }
}

#[async_trait]
impl StateStore for RedisStateStore {
    async fn get(&self, channel_id: ChannelId) -> Result<Option<String>> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(Self::key(channel_id)).await?;
        Ok(value)
    }

    async fn set(&self, channel_id: ChannelId, value: String) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: () = conn.set(Self::key(channel_id), value).await?;
        Ok(())
    }
}
