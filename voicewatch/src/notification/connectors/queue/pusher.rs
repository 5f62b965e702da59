//! Queue push primitive.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use tracing::trace;

use crate::{Error, Result};

/// Appends a payload to the tail of a named queue.
#[async_trait]
pub trait QueuePusher: Send + Sync {
    async fn push(&self, queue: &str, payload: &str) -> Result<()>;
}

/// `RPUSH` onto Redis lists.
#[derive(Clone)]
pub struct RedisQueuePusher {
    conn: ConnectionManager,
}

impl RedisQueuePusher {
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl QueuePusher for RedisQueuePusher {
    async fn push(&self, queue: &str, payload: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        let reply: redis::Value = redis::cmd("RPUSH")
            .arg(queue)
            .arg(payload)
            .query_async(&mut conn)
            .await?;

        // RPUSH answers with the new list length; anything else means the
        // connection is not talking to a list-capable server.
        match reply {
            redis::Value::Int(len) if len > 0 => {
                trace!(queue = %queue, len, "Pushed envelope");
                Ok(())
            }
            other => Err(Error::fault(format!(
                "RPUSH {queue} returned {other:?} instead of a list length"
            ))),
        }
    }
}
