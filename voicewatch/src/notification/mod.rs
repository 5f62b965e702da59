//! Notification routing and delivery.
//!
//! [`NotificationRouter`] fans each notification out to the connectors
//! configured for its channel:
//!
//! - [`WebhookConnector`]: renders URL templates and performs retried GETs
//! - [`QueueConnector`]: pushes versioned JSON envelopes onto queues

pub mod connectors;
mod router;

pub use connectors::{
    Connector, DeliveryMode, Envelope, HttpTransportConfig, HttpWebhookTransport, QueueConnector,
    QueuePusher, RedisQueuePusher, WebhookConnector, WebhookTransport,
};
pub use router::NotificationRouter;
