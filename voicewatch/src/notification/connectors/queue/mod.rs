//! Queue connector.
//!
//! Every notification becomes one [`Envelope`] that is pushed onto each queue
//! configured for its channel. Pushes for one notification run concurrently;
//! there is no retry at this layer and the first failure propagates.

mod envelope;
mod pusher;

pub use envelope::{
    ENVELOPE_VERSION, EmptyData, Envelope, EnvelopeData, UserData, UsersConnectedData,
};
pub use pusher::{QueuePusher, RedisQueuePusher};

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use futures::future::try_join_all;
use tracing::{debug, trace};

use super::Connector;
use crate::Result;
use crate::config::{MonitorConfig, TargetType};
use crate::domain::{ChannelId, Notification};
use crate::metrics::MetricsCollector;

/// Delivers notifications as JSON envelopes onto queues.
pub struct QueueConnector {
    pusher: Arc<dyn QueuePusher>,
    queues: HashMap<ChannelId, Vec<String>>,
    metrics: Arc<MetricsCollector>,
}

impl QueueConnector {
    pub fn new(
        config: &MonitorConfig,
        pusher: Arc<dyn QueuePusher>,
        metrics: Arc<MetricsCollector>,
    ) -> Self {
        let queues = config
            .channels()
            .iter()
            .map(|c| {
                (
                    c.channel_id,
                    c.queue_names().map(str::to_string).collect::<Vec<_>>(),
                )
            })
            .filter(|(_, queues)| !queues.is_empty())
            .collect();

        Self {
            pusher,
            queues,
            metrics,
        }
    }

    /// Queues configured for a channel.
    pub fn queues_for(&self, channel_id: ChannelId) -> &[String] {
        self.queues
            .get(&channel_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    async fn send_one(&self, notification: &Notification) -> Result<()> {
        let queues = self.queues_for(notification.channel_id());
        if queues.is_empty() {
            trace!(
                channel_id = notification.channel_id(),
                "No queues configured"
            );
            return Ok(());
        }

        let raw = Envelope::new(notification, Utc::now()).to_json()?;
        try_join_all(queues.iter().map(|queue| self.pusher.push(queue, &raw))).await?;

        for _ in queues {
            self.metrics.record_queue_push();
        }
        debug!(
            channel_id = notification.channel_id(),
            kind = %notification.kind(),
            queues = queues.len(),
            "Pushed notification"
        );
        Ok(())
    }
}

#[async_trait]
impl Connector for QueueConnector {
    fn target_type(&self) -> TargetType {
        TargetType::Queue
    }

    async fn send(&self, notifications: &[Notification]) -> Result<()> {
        for notification in notifications {
            self.send_one(notification).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use crate::config::{ChannelMonitorConfig, QueueTarget, Target};
    use crate::domain::{NotificationKind, User};
    use parking_lot::Mutex;

    #[derive(Default)]
    struct RecordingPusher {
        pushes: Mutex<Vec<(String, String)>>,
        fault: bool,
    }

    #[async_trait]
    impl QueuePusher for RecordingPusher {
        async fn push(&self, queue: &str, payload: &str) -> Result<()> {
            if self.fault {
                return Err(Error::fault("push returned nil"));
            }
            self.pushes
                .lock()
                .push((queue.to_string(), payload.to_string()));
            Ok(())
        }
    }

    fn queue(name: &str) -> Target {
        Target::Queue(QueueTarget {
            queue: name.to_string(),
        })
    }

    fn config() -> MonitorConfig {
        MonitorConfig::new(vec![
            ChannelMonitorConfig::new(1, vec![queue("events"), queue("audit")]),
            ChannelMonitorConfig::new(2, Vec::new()),
        ])
        .unwrap()
    }

    #[tokio::test]
    async fn test_pushes_to_every_queue() {
        let pusher = Arc::new(RecordingPusher::default());
        let metrics = Arc::new(MetricsCollector::new());
        let connector = QueueConnector::new(&config(), pusher.clone(), metrics.clone());

        let before = Utc::now();
        connector
            .send(&[Notification::NewUserJoined {
                channel_id: 1,
                user: User::new(5, "bob"),
            }])
            .await
            .unwrap();
        let after = Utc::now();

        let mut pushes = pusher.pushes.lock().clone();
        pushes.sort();
        assert_eq!(pushes.len(), 2);
        assert_eq!(pushes[0].0, "audit");
        assert_eq!(pushes[1].0, "events");
        assert_eq!(pushes[0].1, pushes[1].1);

        let envelope = Envelope::from_json(&pushes[0].1).unwrap();
        assert_eq!(envelope.kind, NotificationKind::NewUser);
        assert_eq!(envelope.channel_id, 1);
        assert_eq!(
            envelope.data,
            EnvelopeData::User(UserData {
                id: 5,
                username: "bob".to_string()
            })
        );
        assert!(envelope.happened_at >= before && envelope.happened_at <= after);
        assert_eq!(metrics.queue_pushes(), 2);
    }

    #[tokio::test]
    async fn test_preserves_notification_order() {
        let pusher = Arc::new(RecordingPusher::default());
        let connector = QueueConnector::new(
            &MonitorConfig::new(vec![ChannelMonitorConfig::new(1, vec![queue("events")])])
                .unwrap(),
            pusher.clone(),
            Arc::new(MetricsCollector::new()),
        );

        connector
            .send(&[
                Notification::NewUserJoined {
                    channel_id: 1,
                    user: User::new(5, "bob"),
                },
                Notification::UsersConnected {
                    channel_id: 1,
                    users: vec![User::new(5, "bob")],
                },
            ])
            .await
            .unwrap();

        let kinds: Vec<_> = pusher
            .pushes
            .lock()
            .iter()
            .map(|(_, raw)| Envelope::from_json(raw).unwrap().kind)
            .collect();
        assert_eq!(
            kinds,
            vec![NotificationKind::NewUser, NotificationKind::UsersConnected]
        );
    }

    #[tokio::test]
    async fn test_no_queues_no_pushes() {
        let pusher = Arc::new(RecordingPusher::default());
        let connector =
            QueueConnector::new(&config(), pusher.clone(), Arc::new(MetricsCollector::new()));

        connector
            .send(&[
                Notification::UsersAllLeft { channel_id: 2 },
                Notification::UsersAllLeft { channel_id: 42 },
            ])
            .await
            .unwrap();

        assert!(pusher.pushes.lock().is_empty());
        assert!(connector.queues_for(2).is_empty());
    }

    #[tokio::test]
    async fn test_fault_propagates() {
        let pusher = Arc::new(RecordingPusher {
            fault: true,
            ..Default::default()
        });
        let connector =
            QueueConnector::new(&config(), pusher, Arc::new(MetricsCollector::new()));

        let err = connector
            .send(&[Notification::UsersAllLeft { channel_id: 1 }])
            .await
            .unwrap_err();

        assert!(err.is_programming_fault());
    }
}
