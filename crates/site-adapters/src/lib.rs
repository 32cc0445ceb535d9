//! Site adapters
//!
//! One adapter per supported chat host, all implementing the same
//! [`SiteAdapter`] contract:
//! - ordered input probes, first visible text field wins
//! - heuristic generation detection (stop control, busy indicator, or a
//!   disabled send control while text is pending)
//! - layered send: send-button selectors, then the input's form, then
//!   `requestSubmit`
//! - a two-phase bounded idle wait, plus a ready-only wait for callers that
//!   have not just sent anything
//!
//! The adapter is picked once per page by first match on the location.

pub mod adapter;
pub mod idle;
pub mod profile;

use std::sync::Arc;

use host_dom::{HostLocation, HostPage};
use tracing::{info, warn};

pub use adapter::{ProfileAdapter, SiteAdapter};
pub use idle::IdleWait;
pub use profile::{InputProbe, SiteProfile, PROFILES};

/// First adapter whose profile matches `location`.
pub fn adapter_for(
    location: &HostLocation,
    page: Arc<dyn HostPage>,
) -> Option<Arc<dyn SiteAdapter>> {
    let profile = PROFILES.iter().find(|p| p.matches(location))?;
    Some(Arc::new(ProfileAdapter::new(*profile, page)))
}

/// Resolve the adapter for the page's current location.
pub async fn select_adapter(page: Arc<dyn HostPage>) -> Option<Arc<dyn SiteAdapter>> {
    let location = match page.location().await {
        Ok(location) => location,
        Err(err) => {
            warn!(error = %err, "could not read page location");
            return None;
        }
    };
    let adapter = adapter_for(&location, page);
    match &adapter {
        Some(adapter) => info!(adapter = %adapter.id(), host = %location.hostname, "adapter selected"),
        None => warn!(host = %location.hostname, "no adapter for host"),
    }
    adapter
}
