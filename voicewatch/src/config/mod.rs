//! Configuration.
//!
//! - [`AppConfig`]: process settings read from `VOICEWATCH_*` environment
//!   variables (and an optional `.env` file).
//! - [`MonitorConfig`]: the per-channel delivery targets, loaded once from a
//!   JSON document at startup and immutable afterwards.

mod app;
mod monitor;

pub use app::{AppConfig, ENV_PREFIX};
pub use monitor::{
    ChannelMonitorConfig, MonitorConfig, QueueTarget, Target, TargetType, WebhookTarget,
};
