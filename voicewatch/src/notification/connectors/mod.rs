//! Delivery connectors.
//!
//! A connector translates notifications into protocol-specific actions for
//! one [`TargetType`]. Connectors resolve per-channel destinations from the
//! monitor configuration themselves, so a single call may carry
//! notifications for several channels.

mod queue;
mod webhook;

pub use queue::{
    ENVELOPE_VERSION, EmptyData, Envelope, EnvelopeData, QueueConnector, QueuePusher,
    RedisQueuePusher, UserData, UsersConnectedData,
};
pub use webhook::{
    DeliveryMode, HttpTransportConfig, HttpWebhookTransport, TemplateError, TemplateVars,
    UrlTemplate, WebhookConnector, WebhookTransport,
};

use async_trait::async_trait;

use crate::Result;
use crate::config::TargetType;
use crate::domain::Notification;

/// Protocol adapter for one target type.
#[async_trait]
pub trait Connector: Send + Sync {
    /// The target type this connector serves.
    fn target_type(&self) -> TargetType;

    /// Deliver `notifications` in order.
    async fn send(&self, notifications: &[Notification]) -> Result<()>;
}
