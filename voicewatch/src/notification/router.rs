//! Notification routing.
//!
//! The router owns the channel → target-types mapping and the
//! target-type → connector registry. Connectors are registered once at
//! startup; registration takes `&mut self`, so it cannot race with dispatch.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use tracing::{debug, warn};

use super::connectors::Connector;
use crate::Result;
use crate::config::{MonitorConfig, TargetType};
use crate::domain::{ChannelId, Notification};

/// Fans notifications out to the connectors configured for their channel.
pub struct NotificationRouter {
    routes: HashMap<ChannelId, BTreeSet<TargetType>>,
    connectors: BTreeMap<TargetType, Arc<dyn Connector>>,
}

impl NotificationRouter {
    pub fn new(config: &MonitorConfig) -> Self {
        let routes = config
            .channels()
            .iter()
            .map(|c| (c.channel_id, c.target_types()))
            .collect();

        Self {
            routes,
            connectors: BTreeMap::new(),
        }
    }

    /// Register `connector` for its target type, replacing any previous one.
    pub fn register_connector(&mut self, connector: Arc<dyn Connector>) {
        let target_type = connector.target_type();
        if self.connectors.insert(target_type, connector).is_some() {
            warn!(target_type = %target_type, "Replaced registered connector");
        }
    }

    pub fn has_connector(&self, target_type: TargetType) -> bool {
        self.connectors.contains_key(&target_type)
    }

    /// Channel targets that have no registered connector. Their notifications
    /// are skipped at dispatch time.
    pub fn unrouted_targets(&self) -> Vec<(ChannelId, TargetType)> {
        let mut missing: Vec<_> = self
            .routes
            .iter()
            .flat_map(|(channel_id, types)| types.iter().map(move |t| (*channel_id, *t)))
            .filter(|(_, t)| !self.connectors.contains_key(t))
            .collect();
        missing.sort();

        for (channel_id, target_type) in &missing {
            warn!(
                channel_id,
                target_type = %target_type,
                "No connector registered for configured target"
            );
        }
        missing
    }

    /// Dispatch `notifications`.
    ///
    /// Each connector is called at most once, with the notifications of every
    /// channel that routes to it, in input order. Connector errors
    /// are not retried or caught.
    pub async fn send(&self, notifications: &[Notification]) -> Result<()> {
        let mut batches: BTreeMap<TargetType, Vec<Notification>> = BTreeMap::new();

        for notification in notifications {
            let Some(target_types) = self.routes.get(&notification.channel_id()) else {
                debug!(
                    channel_id = notification.channel_id(),
                    "No monitor config for channel, dropping notification"
                );
                continue;
            };

            for target_type in target_types {
                if self.connectors.contains_key(target_type) {
                    batches
                        .entry(*target_type)
                        .or_default()
                        .push(notification.clone());
                }
            }
        }

        for (target_type, batch) in batches {
            if let Some(connector) = self.connectors.get(&target_type) {
                debug!(
                    target_type = %target_type,
                    count = batch.len(),
                    "Dispatching notifications"
                );
                connector.send(&batch).await?;
            }
        }

        Ok(())
    }
}
