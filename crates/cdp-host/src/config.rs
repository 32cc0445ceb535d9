use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CdpHostConfig {
    /// Browser-level DevTools websocket (`ws://127.0.0.1:9222/devtools/browser/...`)
    pub ws_url: String,
    /// Pick the first page whose hostname contains this; any page when unset
    pub page_filter: Option<String>,
    /// Upper bound for a single page script round-trip
    pub request_timeout_ms: u64,
}

impl Default for CdpHostConfig {
    fn default() -> Self {
        Self {
            ws_url: String::new(),
            page_filter: None,
            request_timeout_ms: 5_000,
        }
    }
}

impl CdpHostConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms.max(1))
    }
}
