use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use clap::Args;
use chain_flow::ChainStatus;
use langqueue_controller::{Outbound, RunChain};
use langqueue_core_types::{ChainStep, InsertionMode};
use serde::Deserialize;
use tokio::fs;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use super::session;
use crate::config::Config;

#[derive(Args, Clone, Debug)]
pub struct RunChainArgs {
    /// YAML file with the chain steps
    #[arg(short, long, value_name = "FILE")]
    pub file: PathBuf,

    /// DevTools websocket URL (overrides config and LANGQUEUE_CDP_WS)
    #[arg(long, value_name = "URL")]
    pub ws: Option<String>,

    /// Insertion mode for this run only (overwrite | append)
    #[arg(long)]
    pub mode: Option<InsertionMode>,
}

/// Either a bare list of steps or a document with a `steps` key.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ChainFile {
    Steps(Vec<ChainStep>),
    Document { steps: Vec<ChainStep> },
}

impl ChainFile {
    fn into_steps(self) -> Vec<ChainStep> {
        match self {
            ChainFile::Steps(steps) | ChainFile::Document { steps } => steps,
        }
    }
}

fn parse_chain(content: &str) -> Result<Vec<ChainStep>> {
    let file: ChainFile = serde_yaml::from_str(content).context("Failed to parse chain file")?;
    Ok(file.into_steps())
}

async fn read_chain(path: &Path) -> Result<Vec<ChainStep>> {
    let content = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read chain file {}", path.display()))?;
    parse_chain(&content)
}

pub async fn cmd_run_chain(args: RunChainArgs, config: &Config) -> Result<()> {
    let steps = read_chain(&args.file).await?;
    info!(steps = steps.len(), file = %args.file.display(), "chain loaded");

    let controller = session::attach(args.ws.as_deref(), config).await?;
    let mut progress = controller.subscribe();

    let reply = controller
        .run_chain(RunChain {
            steps,
            insertion_mode_override: args.mode,
        })
        .await;
    if let Some(reason) = reply.reason {
        bail!("chain rejected: {reason}");
    }

    loop {
        let event = tokio::select! {
            event = progress.recv() => event,
            _ = tokio::signal::ctrl_c() => {
                warn!("interrupted, cancelling chain");
                controller.chain().cancel();
                continue;
            }
        };
        let progress_event = match event {
            Ok(Outbound::ChainProgress(p)) => p,
            Ok(_) => continue,
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "progress stream lagged");
                continue;
            }
            Err(RecvError::Closed) => return Err(anyhow!("progress stream closed")),
        };
        println!(
            "{}",
            serde_json::to_string(&progress_event).context("failed to encode progress")?
        );
        match progress_event.status {
            ChainStatus::Completed => return Ok(()),
            ChainStatus::Cancelled => bail!("chain cancelled at step {}", progress_event.step_index),
            ChainStatus::Error => bail!(
                "chain failed at step {}: {}",
                progress_event.step_index,
                progress_event
                    .error
                    .map(|code| code.to_string())
                    .unwrap_or_else(|| "unknown".to_string())
            ),
            _ => {}
        }
    }
}
