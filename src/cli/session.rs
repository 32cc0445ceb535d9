use std::sync::Arc;

use anyhow::{Context, Result};
use cdp_host::CdpHostPage;
use langqueue_controller::{Controller, SharedSettings};

use crate::config::Config;

/// Connect to the browser and bind a controller to the matching chat page.
pub async fn attach(ws: Option<&str>, config: &Config) -> Result<Controller> {
    let cdp = config.cdp_with_override(ws);
    let page = CdpHostPage::connect(&cdp)
        .await
        .with_context(|| format!("failed to attach to {}", cdp.ws_url))?;
    let settings = SharedSettings::new(config.settings.clone());
    Controller::attach(Arc::new(page), settings, config.chain_config())
        .await
        .context("page is not a supported chat host")
}
