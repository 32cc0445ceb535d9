use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;

pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_millis(120_000);
pub const DEFAULT_IDLE_POLL: Duration = Duration::from_millis(200);
/// Upper bound applied to any configured timeout.
pub const MAX_IDLE_TIMEOUT: Duration = Duration::from_secs(24 * 60 * 60);

/// Bounds for `SiteAdapter::wait_for_idle`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdleWait {
    pub timeout: Duration,
    pub poll: Duration,
}

impl IdleWait {
    pub fn from_millis(timeout_ms: u64, poll_ms: u64) -> Self {
        Self {
            timeout: Duration::from_millis(timeout_ms).min(MAX_IDLE_TIMEOUT),
            poll: Duration::from_millis(poll_ms.max(1)),
        }
    }

    /// End of a wait starting at `now`, with the timeout capped at
    /// [`MAX_IDLE_TIMEOUT`].
    pub fn deadline_from(&self, now: Instant) -> Instant {
        now + self.timeout.min(MAX_IDLE_TIMEOUT)
    }
}

impl Default for IdleWait {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_IDLE_TIMEOUT,
            poll: DEFAULT_IDLE_POLL,
        }
    }
}
