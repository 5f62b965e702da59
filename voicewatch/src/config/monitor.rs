//! Channel monitor configuration.
//!
//! The JSON document lists the monitored channels and where their
//! notifications go:
//!
//! ```json
//! {
//!   "channels": [
//!     {
//!       "channel_id": 1,
//!       "targets": [
//!         { "new_user_webhooks": ["http://x/?u={{username}}"] },
//!         { "queue": "voice-events" }
//!       ]
//!     }
//!   ]
//! }
//! ```
//!
//! A target carrying `queue` is a queue target, anything else is a webhook
//! target; an explicit `"type"` tag may disambiguate. The older per-channel
//! `webhooks`, `redis` and `redis_queues` keys are folded into `targets`.

use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{ChannelId, NotificationKind};
use crate::notification::connectors::UrlTemplate;
use crate::{Error, Result};

/// Connector family a target is delivered through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetType {
    Webhooks,
    #[serde(alias = "redis")]
    Queue,
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Webhooks => f.write_str("webhooks"),
            Self::Queue => f.write_str("queue"),
        }
    }
}

/// URL templates per event kind.
///
/// Each list is tri-state: `None` means not configured, `Some(vec![])` means
/// configured with no templates. Both result in no HTTP calls.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookTarget {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_user_webhooks: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_left_webhooks: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub users_connected_webhooks: Option<Vec<String>>,
    #[serde(
        default,
        alias = "users_leave_webhooks",
        skip_serializing_if = "Option::is_none"
    )]
    pub users_left_webhooks: Option<Vec<String>>,
}

impl WebhookTarget {
    /// Templates configured for `kind`, if any list was configured.
    pub fn templates_for(&self, kind: NotificationKind) -> Option<&[String]> {
        match kind {
            NotificationKind::NewUser => self.new_user_webhooks.as_deref(),
            NotificationKind::UserLeft => self.user_left_webhooks.as_deref(),
            NotificationKind::UsersConnected => self.users_connected_webhooks.as_deref(),
            NotificationKind::UsersLeft => self.users_left_webhooks.as_deref(),
        }
    }

    fn is_empty(&self) -> bool {
        NotificationKind::ALL
            .iter()
            .all(|kind| self.templates_for(*kind).is_none())
    }
}

/// A named queue receiving JSON envelopes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueTarget {
    pub queue: String,
}

/// A configured delivery destination of a channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Target {
    Webhooks(WebhookTarget),
    Queue(QueueTarget),
}

impl Target {
    pub fn target_type(&self) -> TargetType {
        match self {
            Self::Webhooks(_) => TargetType::Webhooks,
            Self::Queue(_) => TargetType::Queue,
        }
    }
}

/// Targets of a single channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelMonitorConfig {
    pub channel_id: ChannelId,
    pub targets: Vec<Target>,
}

impl ChannelMonitorConfig {
    pub fn new(channel_id: ChannelId, targets: Vec<Target>) -> Self {
        Self {
            channel_id,
            targets,
        }
    }

    /// Distinct target types, in a stable order.
    pub fn target_types(&self) -> BTreeSet<TargetType> {
        self.targets.iter().map(Target::target_type).collect()
    }

    pub fn webhook_targets(&self) -> impl Iterator<Item = &WebhookTarget> {
        self.targets.iter().filter_map(|t| match t {
            Target::Webhooks(w) => Some(w),
            Target::Queue(_) => None,
        })
    }

    pub fn queue_names(&self) -> impl Iterator<Item = &str> {
        self.targets.iter().filter_map(|t| match t {
            Target::Queue(q) => Some(q.queue.as_str()),
            Target::Webhooks(_) => None,
        })
    }
}

/// All monitored channels. Channel ids are unique.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawMonitorConfig")]
pub struct MonitorConfig {
    channels: Vec<ChannelMonitorConfig>,
}

impl MonitorConfig {
    /// Build and validate a configuration.
    pub fn new(channels: Vec<ChannelMonitorConfig>) -> Result<Self> {
        let mut seen = HashSet::new();
        for channel in &channels {
            if !seen.insert(channel.channel_id) {
                return Err(Error::config(format!(
                    "duplicate channel_id {} in monitor config",
                    channel.channel_id
                )));
            }

            for target in &channel.targets {
                match target {
                    Target::Webhooks(webhooks) => {
                        for kind in NotificationKind::ALL {
                            for raw in webhooks.templates_for(kind).unwrap_or_default() {
                                UrlTemplate::parse(raw).map_err(|e| {
                                    Error::config(format!(
                                        "channel {}: invalid {} template: {}",
                                        channel.channel_id, kind, e
                                    ))
                                })?;
                            }
                        }
                    }
                    Target::Queue(queue) => {
                        if queue.queue.trim().is_empty() {
                            return Err(Error::config(format!(
                                "channel {}: queue name must not be empty",
                                channel.channel_id
                            )));
                        }
                    }
                }
            }
        }

        Ok(Self { channels })
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(raw).map_err(|e| match e.classify() {
            // try_from validation errors surface as data errors
            serde_json::error::Category::Data => Error::config(e.to_string()),
            _ => Error::Serialization(e),
        })?;
        debug!(channels = config.channels.len(), "Loaded monitor config");
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!(
                "cannot read monitor config {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_json_str(&raw)
    }

    pub fn channels(&self) -> &[ChannelMonitorConfig] {
        &self.channels
    }

    pub fn channel(&self, channel_id: ChannelId) -> Option<&ChannelMonitorConfig> {
        self.channels.iter().find(|c| c.channel_id == channel_id)
    }

    /// Channel ids in configuration order.
    pub fn channel_ids(&self) -> Vec<ChannelId> {
        self.channels.iter().map(|c| c.channel_id).collect()
    }
}

#[derive(Deserialize)]
struct RawMonitorConfig {
    #[serde(default)]
    channels: Vec<RawChannelConfig>,
}

#[derive(Deserialize)]
struct RawChannelConfig {
    channel_id: ChannelId,
    #[serde(default)]
    targets: Vec<RawTarget>,
    #[serde(default)]
    webhooks: Option<WebhookTarget>,
    #[serde(default)]
    redis: Option<QueueTarget>,
    #[serde(default)]
    redis_queues: Vec<QueueTarget>,
}

#[derive(Deserialize)]
struct RawTarget {
    #[serde(default, rename = "type")]
    kind: Option<TargetType>,
    #[serde(default)]
    queue: Option<String>,
    #[serde(flatten)]
    webhooks: WebhookTarget,
}

impl RawTarget {
    fn into_target(self, channel_id: ChannelId) -> std::result::Result<Target, String> {
        match (self.kind, self.queue) {
            (Some(TargetType::Queue) | None, Some(queue)) => {
                if !self.webhooks.is_empty() {
                    return Err(format!(
                        "channel {channel_id}: target mixes a queue with webhook templates"
                    ));
                }
                Ok(Target::Queue(QueueTarget { queue }))
            }
            (Some(TargetType::Queue), None) => Err(format!(
                "channel {channel_id}: queue target is missing the queue name"
            )),
            (Some(TargetType::Webhooks), Some(_)) => Err(format!(
                "channel {channel_id}: webhooks target must not carry a queue"
            )),
            (Some(TargetType::Webhooks) | None, None) => Ok(Target::Webhooks(self.webhooks)),
        }
    }
}

impl TryFrom<RawMonitorConfig> for MonitorConfig {
    type Error = String;

    fn try_from(raw: RawMonitorConfig) -> std::result::Result<Self, Self::Error> {
        let mut channels = Vec::with_capacity(raw.channels.len());

        for raw_channel in raw.channels {
            let channel_id = raw_channel.channel_id;
            let mut targets = raw_channel
                .targets
                .into_iter()
                .map(|t| t.into_target(channel_id))
                .collect::<std::result::Result<Vec<_>, _>>()?;

            if let Some(webhooks) = raw_channel.webhooks {
                targets.push(Target::Webhooks(webhooks));
            }
            targets.extend(
                raw_channel
                    .redis
                    .into_iter()
                    .chain(raw_channel.redis_queues)
                    .map(Target::Queue),
            );

            channels.push(ChannelMonitorConfig::new(channel_id, targets));
        }

        MonitorConfig::new(channels).map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_config() {
        let config = MonitorConfig::from_json_str(r#"{"channels": []}"#).unwrap();
        assert!(config.channels().is_empty());
    }

    #[test]
    fn test_targets_list() {
        let config = MonitorConfig::from_json_str(
            r#"{
                "channels": [{
                    "channel_id": 1,
                    "targets": [
                        {
                            "new_user_webhooks": ["http://localhost:8000"],
                            "users_connected_webhooks": ["http://localhost:8001"],
                            "users_leave_webhooks": ["http://localhost:8002"]
                        },
                        {"queue": "test_queue"}
                    ]
                }]
            }"#,
        )
        .unwrap();

        let channel = config.channel(1).unwrap();
        assert_eq!(
            channel.targets,
            vec![
                Target::Webhooks(WebhookTarget {
                    new_user_webhooks: Some(vec!["http://localhost:8000".to_string()]),
                    user_left_webhooks: None,
                    users_connected_webhooks: Some(vec!["http://localhost:8001".to_string()]),
                    users_left_webhooks: Some(vec!["http://localhost:8002".to_string()]),
                }),
                Target::Queue(QueueTarget {
                    queue: "test_queue".to_string()
                }),
            ]
        );
    }

    #[test]
    fn test_legacy_keys_are_normalized() {
        let config = MonitorConfig::from_json_str(
            r#"{
                "channels": [{
                    "channel_id": 7,
                    "webhooks": {"user_left_webhooks": ["http://localhost:8003"]},
                    "redis": {"queue": "first"},
                    "redis_queues": [{"queue": "second"}]
                }]
            }"#,
        )
        .unwrap();

        let channel = config.channel(7).unwrap();
        assert_eq!(channel.targets.len(), 3);
        assert_eq!(channel.queue_names().collect::<Vec<_>>(), vec!["first", "second"]);
        assert_eq!(channel.webhook_targets().count(), 1);
        assert_eq!(
            channel.target_types().into_iter().collect::<Vec<_>>(),
            vec![TargetType::Webhooks, TargetType::Queue]
        );
    }

    #[test]
    fn test_tri_state_templates() {
        let config = MonitorConfig::from_json_str(
            r#"{"channels": [{"channel_id": 1, "targets": [{"new_user_webhooks": []}]}]}"#,
        )
        .unwrap();

        let webhooks = config.channel(1).unwrap().webhook_targets().next().unwrap();
        assert_eq!(webhooks.templates_for(NotificationKind::NewUser), Some(&[][..]));
        assert_eq!(webhooks.templates_for(NotificationKind::UserLeft), None);
    }

    #[test]
    fn test_explicit_type_tag() {
        let config = MonitorConfig::from_json_str(
            r#"{"channels": [{"channel_id": 1, "targets": [
                {"type": "queue", "queue": "a"},
                {"type": "redis", "queue": "b"},
                {"type": "webhooks"}
            ]}]}"#,
        )
        .unwrap();

        let types: Vec<_> = config.channel(1).unwrap().targets.iter().map(Target::target_type).collect();
        assert_eq!(
            types,
            vec![TargetType::Queue, TargetType::Queue, TargetType::Webhooks]
        );
    }

    #[test]
    fn test_rejects_inconsistent_targets() {
        for raw in [
            r#"{"channels": [{"channel_id": 1, "targets": [{"type": "queue"}]}]}"#,
            r#"{"channels": [{"channel_id": 1, "targets": [{"type": "webhooks", "queue": "a"}]}]}"#,
            r#"{"channels": [{"channel_id": 1, "targets": [{"queue": "a", "new_user_webhooks": []}]}]}"#,
            r#"{"channels": [{"channel_id": 1, "targets": [{"queue": "  "}]}]}"#,
        ] {
            let err = MonitorConfig::from_json_str(raw).unwrap_err();
            assert!(matches!(err, Error::Configuration(_)), "{raw}: {err}");
        }
    }

    #[test]
    fn test_rejects_duplicate_channels() {
        let err = MonitorConfig::from_json_str(
            r#"{"channels": [{"channel_id": 1}, {"channel_id": 1}]}"#,
        )
        .unwrap_err();

        assert!(err.to_string().contains("duplicate channel_id 1"));
    }

    #[test]
    fn test_rejects_broken_template() {
        let err = MonitorConfig::from_json_str(
            r#"{"channels": [{"channel_id": 1, "targets": [{"new_user_webhooks": ["http://x/?u={{username"]}]}]}"#,
        )
        .unwrap_err();

        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_malformed_json_is_serialization_error() {
        let err = MonitorConfig::from_json_str("{").unwrap_err();
        assert!(matches!(err, Error::Serialization(_)));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"channels": [{{"channel_id": 3, "targets": [{{"queue": "q"}}]}}, {{"channel_id": 4}}]}}"#
        )
        .unwrap();

        let config = MonitorConfig::from_file(file.path()).unwrap();
        assert_eq!(config.channel_ids(), vec![3, 4]);
        assert!(config.channel(4).unwrap().targets.is_empty());
    }

    #[test]
    fn test_missing_file() {
        let err = MonitorConfig::from_file("/nonexistent/voicewatch.json").unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }
}
