//! Application configuration
//!
//! Loaded from YAML; every field has a default so a partial file (or none at
//! all) is valid.

use std::time::Duration;

use cdp_host::CdpHostConfig;
use chain_flow::{ChainConfig, SETTLE_DELAY};
use langqueue_core_types::AppSettings;
use serde::{Deserialize, Serialize};
use site_adapters::IdleWait;

/// Overrides `cdp.ws_url` when set.
pub const CDP_WS_ENV: &str = "LANGQUEUE_CDP_WS";

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct Config {
    pub log_level: String,
    pub cdp: CdpHostConfig,
    pub idle_wait: IdleWaitConfig,
    /// Pause after an awaited response before the next chain step
    pub settle_delay_ms: u64,
    /// Persisted user settings (`insertionMode`, `chainDefaults`)
    pub settings: AppSettings,
    /// How often `serve` re-probes the page for the input
    pub input_refresh_ms: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct IdleWaitConfig {
    pub timeout_ms: u64,
    pub poll_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            cdp: CdpHostConfig::default(),
            idle_wait: IdleWaitConfig::default(),
            settle_delay_ms: SETTLE_DELAY.as_millis() as u64,
            settings: AppSettings::default(),
            input_refresh_ms: 1_000,
        }
    }
}

impl Default for IdleWaitConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 120_000,
            poll_ms: 200,
        }
    }
}

impl From<IdleWaitConfig> for IdleWait {
    fn from(config: IdleWaitConfig) -> Self {
        IdleWait::from_millis(config.timeout_ms, config.poll_ms)
    }
}

impl Config {
    pub fn chain_config(&self) -> ChainConfig {
        ChainConfig {
            idle_wait: self.idle_wait.into(),
            settle_delay: Duration::from_millis(self.settle_delay_ms),
        }
    }

    pub fn input_refresh(&self) -> Duration {
        Duration::from_millis(self.input_refresh_ms.max(50))
    }

    /// DevTools target: explicit flag, then environment, then file.
    pub fn cdp_with_override(&self, ws: Option<&str>) -> CdpHostConfig {
        let mut cdp = self.cdp.clone();
        if let Some(url) = ws
            .map(str::to_string)
            .or_else(|| std::env::var(CDP_WS_ENV).ok())
            .filter(|url| !url.trim().is_empty())
        {
            cdp.ws_url = url;
        }
        cdp
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use langqueue_core_types::InsertionMode;

    #[test]
    fn partial_yaml_keeps_defaults() {
        let config: Config = serde_yaml::from_str(
            r#"
log_level: debug
idle_wait:
  timeout_ms: 30000
settings:
  insertionMode: append
  chainDefaults:
    autoSend: false
"#,
        )
        .unwrap();

        assert_eq!(config.log_level, "debug");
        assert_eq!(config.idle_wait.timeout_ms, 30_000);
        assert_eq!(config.idle_wait.poll_ms, 200);
        assert_eq!(config.settings.insertion_mode, Some(InsertionMode::Append));
        assert_eq!(config.settings.chain_defaults.auto_send, Some(false));
        assert_eq!(config.input_refresh_ms, 1_000);

        let chain = config.chain_config();
        assert_eq!(chain.idle_wait.timeout, Duration::from_secs(30));
        assert_eq!(chain.settle_delay, SETTLE_DELAY);
    }

    #[test]
    fn sample_config_parses() {
        let config: Config = serde_yaml::from_str(include_str!("../config/config.yaml")).unwrap();
        assert_eq!(config.cdp.page_filter.as_deref(), Some("chatgpt.com"));
        assert_eq!(config.settings.insertion_mode, Some(InsertionMode::Overwrite));
        assert_eq!(config.chain_config(), ChainConfig::default());
    }

    #[test]
    fn explicit_ws_flag_wins() {
        let mut config = Config::default();
        config.cdp.ws_url = "ws://file".into();
        let cdp = config.cdp_with_override(Some("ws://flag"));
        assert_eq!(cdp.ws_url, "ws://flag");
    }
}
