//! Webhook connector.
//!
//! Each channel carries per-event lists of URL templates. A notification is
//! rendered against every template configured for its kind and the resulting
//! URLs are called concurrently; the next notification starts only after all
//! of them finished. A failed call never cancels its siblings.
//!
//! | Event           | Variables                                   |
//! |-----------------|---------------------------------------------|
//! | new user        | `id`, `user_id`, `username`, `type`         |
//! | user left       | `id`, `user_id`, `username`, `type`         |
//! | users connected | `id`, `usernames_safe`, `type`              |
//! | users left      | `id`, `type`                                |

mod template;
mod transport;

pub use template::{TemplateError, TemplateVars, UrlTemplate};
pub use transport::{DeliveryMode, HttpTransportConfig, HttpWebhookTransport, WebhookTransport};

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use tracing::{debug, trace};

use super::Connector;
use crate::config::{MonitorConfig, TargetType};
use crate::domain::{ChannelId, Notification, NotificationKind};
use crate::metrics::MetricsCollector;
use crate::{Error, Result};

type ChannelTemplates = HashMap<NotificationKind, Vec<UrlTemplate>>;

/// Delivers notifications as HTTP GETs to rendered URL templates.
pub struct WebhookConnector {
    transport: Arc<dyn WebhookTransport>,
    channels: HashMap<ChannelId, ChannelTemplates>,
    metrics: Arc<MetricsCollector>,
}

impl WebhookConnector {
    /// Compile the templates of every webhook target in `config`.
    ///
    /// Templates of several webhook targets on the same channel are merged.
    pub fn new(
        config: &MonitorConfig,
        transport: Arc<dyn WebhookTransport>,
        metrics: Arc<MetricsCollector>,
    ) -> Result<Self> {
        let mut channels = HashMap::new();

        for channel in config.channels() {
            let mut templates = ChannelTemplates::new();

            for target in channel.webhook_targets() {
                for kind in NotificationKind::ALL {
                    let Some(raw_templates) = target.templates_for(kind) else {
                        continue;
                    };
                    let compiled = raw_templates
                        .iter()
                        .map(|raw| UrlTemplate::parse(raw))
                        .collect::<std::result::Result<Vec<_>, _>>()
                        .map_err(|e| {
                            Error::config(format!("channel {}: {}", channel.channel_id, e))
                        })?;
                    templates.entry(kind).or_default().extend(compiled);
                }
            }

            if !templates.is_empty() {
                channels.insert(channel.channel_id, templates);
            }
        }

        Ok(Self {
            transport,
            channels,
            metrics,
        })
    }

    /// URLs a notification is delivered to.
    pub fn render(&self, notification: &Notification) -> Vec<String> {
        let Some(templates) = self
            .channels
            .get(&notification.channel_id())
            .and_then(|by_kind| by_kind.get(&notification.kind()))
        else {
            return Vec::new();
        };

        let vars = template_vars(notification);
        templates.iter().map(|t| t.render(&vars)).collect()
    }

    async fn send_one(&self, notification: &Notification) -> Result<()> {
        let urls = self.render(notification);
        if urls.is_empty() {
            trace!(
                channel_id = notification.channel_id(),
                kind = %notification.kind(),
                "No webhook templates configured"
            );
            return Ok(());
        }

        debug!(
            channel_id = notification.channel_id(),
            kind = %notification.kind(),
            count = urls.len(),
            "Calling webhooks"
        );
        for _ in &urls {
            self.metrics.record_webhook_call();
        }

        let results = join_all(urls.iter().map(|url| self.transport.call(url))).await;
        match results.into_iter().find_map(|r| r.err()) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl Connector for WebhookConnector {
    fn target_type(&self) -> TargetType {
        TargetType::Webhooks
    }

    async fn send(&self, notifications: &[Notification]) -> Result<()> {
        for notification in notifications {
            self.send_one(notification).await?;
        }
        Ok(())
    }
}

fn template_vars(notification: &Notification) -> TemplateVars {
    let kind = notification.kind();
    let vars = TemplateVars::new()
        .with("id", notification.channel_id())
        .with("type", kind.as_str());

    match notification {
        Notification::NewUserJoined { user, .. } | Notification::UserLeft { user, .. } => vars
            .with("user_id", user.id)
            .with("username", &user.username),
        Notification::UsersConnected { users, .. } => {
            let joined = users
                .iter()
                .map(|u| u.username.as_str())
                .collect::<Vec<_>>()
                .join(",");
            let usernames_safe: String =
                url::form_urlencoded::byte_serialize(joined.as_bytes()).collect();
            vars.with("usernames_safe", usernames_safe)
        }
        Notification::UsersAllLeft { .. } => vars,
    }
}
