//! Process configuration from environment variables.

use std::path::PathBuf;
use std::time::Duration;

use crate::notification::DeliveryMode;
use crate::{Error, Result};

/// Prefix shared by every environment variable.
pub const ENV_PREFIX: &str = "VOICEWATCH_";

const DEFAULT_CHANNEL_CONFIG_PATH: &str = "./channel_config.json";
const DEFAULT_CHECK_INTERVAL_SECS: u64 = 10;

/// Process-wide settings.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Redis URL used for both snapshot storage and queue delivery.
    pub redis_url: String,
    /// Path of the channel monitor JSON document.
    pub channel_config_path: PathBuf,
    /// Heartbeat URL pinged after each completed cycle.
    pub healthchecks_webhook: Option<String>,
    /// Delay between processing cycles.
    pub check_interval: Duration,
    /// Whether exhausted webhook retries fail the send.
    pub webhook_mode: DeliveryMode,
    /// Directory for rolling log files; console only when unset.
    pub log_dir: Option<PathBuf>,
}

impl AppConfig {
    /// Load from the process environment, reading `.env` first if present.
    ///
    /// Supported env vars:
    /// - `VOICEWATCH_REDIS_URL` (required)
    /// - `VOICEWATCH_CHANNEL_CONFIG_PATH`
    /// - `VOICEWATCH_HEALTHCHECKS_WEBHOOK`
    /// - `VOICEWATCH_CHECK_INTERVAL_SECS`
    /// - `VOICEWATCH_WEBHOOK_STRICT`
    /// - `VOICEWATCH_LOG_DIR`
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using `lookup` to resolve full variable names.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(&format!("{ENV_PREFIX}{name}"))
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let redis_url = get("REDIS_URL")
            .ok_or_else(|| Error::config(format!("{ENV_PREFIX}REDIS_URL is required")))?;

        let channel_config_path = get("CHANNEL_CONFIG_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CHANNEL_CONFIG_PATH));

        let check_interval_secs = match get("CHECK_INTERVAL_SECS") {
            Some(raw) => raw.parse::<u64>().ok().filter(|secs| *secs > 0).ok_or_else(|| {
                Error::config(format!(
                    "{ENV_PREFIX}CHECK_INTERVAL_SECS must be a positive integer, got {raw:?}"
                ))
            })?,
            None => DEFAULT_CHECK_INTERVAL_SECS,
        };

        let webhook_mode = match get("WEBHOOK_STRICT").as_deref() {
            None => DeliveryMode::Lenient,
            Some(raw) => match raw.to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => DeliveryMode::Strict,
                "0" | "false" | "no" | "off" => DeliveryMode::Lenient,
                _ => {
                    return Err(Error::config(format!(
                        "{ENV_PREFIX}WEBHOOK_STRICT must be a boolean, got {raw:?}"
                    )));
                }
            },
        };

        Ok(Self {
            redis_url,
            channel_config_path,
            healthchecks_webhook: get("HEALTHCHECKS_WEBHOOK"),
            check_interval: Duration::from_secs(check_interval_secs),
            webhook_mode,
            log_dir: get("LOG_DIR").map(PathBuf::from),
        })
    }
}
