use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use super::session;
use crate::config::Config;

#[derive(Args, Clone, Debug)]
pub struct CheckArgs {
    /// DevTools websocket URL (overrides config and LANGQUEUE_CDP_WS)
    #[arg(long, value_name = "URL")]
    pub ws: Option<String>,
}

#[derive(Debug, Serialize)]
struct CheckReport {
    adapter: String,
    ready: bool,
    generating: bool,
}

pub async fn cmd_check(args: CheckArgs, config: &Config) -> Result<()> {
    let controller = session::attach(args.ws.as_deref(), config).await?;
    let report = CheckReport {
        adapter: controller.adapter().id().to_string(),
        ready: controller.compat_status().await.ready,
        generating: controller.adapter().is_generating().await,
    };
    println!(
        "{}",
        serde_json::to_string_pretty(&report).context("failed to encode report")?
    );
    Ok(())
}
