use anyhow::Result;
use clap::Parser;
use tracing::{error, info, warn};

use super::commands::Commands;
use super::env::CliArgs;
use super::runtime::{init_logging, load_config, load_local_env_overrides, LoadedConfig};
use super::{cmd_check, cmd_detect, cmd_run_chain, cmd_serve};

pub async fn run() -> Result<()> {
    load_local_env_overrides();
    let cli = CliArgs::parse();

    let LoadedConfig {
        config,
        path,
        found,
    } = load_config(cli.config.as_ref()).await?;
    let level = cli.log_level.as_deref().unwrap_or(&config.log_level);
    init_logging(level, cli.debug)?;

    info!(
        "Starting LangQueue v{} ({}, built {})",
        env!("CARGO_PKG_VERSION"),
        env!("LANGQUEUE_GIT_HASH"),
        env!("LANGQUEUE_BUILD_DATE")
    );
    if found {
        info!("Loaded configuration from: {}", path.display());
    } else {
        warn!("Config file not found, using defaults: {}", path.display());
    }

    let result = match cli.command {
        Commands::Serve(args) => cmd_serve(args, &config).await,
        Commands::RunChain(args) => cmd_run_chain(args, &config).await,
        Commands::Check(args) => cmd_check(args, &config).await,
        Commands::Detect(args) => cmd_detect(args),
    };

    match result {
        Ok(()) => {
            info!("Command completed successfully");
            Ok(())
        }
        Err(err) => {
            error!("Command failed: {:#}", err);
            Err(err)
        }
    }
}
