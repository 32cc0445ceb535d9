use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use langqueue_controller::{Controller, Outbound};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::session;
use crate::config::Config;

#[derive(Args, Clone, Debug)]
pub struct ServeArgs {
    /// DevTools websocket URL (overrides config and LANGQUEUE_CDP_WS)
    #[arg(long, value_name = "URL")]
    pub ws: Option<String>,
}

pub async fn cmd_serve(args: ServeArgs, config: &Config) -> Result<()> {
    let controller = Arc::new(session::attach(args.ws.as_deref(), config).await?);
    info!(adapter = %controller.adapter().id(), "serving on stdin/stdout");
    serve_lines(
        controller,
        BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
        config.input_refresh(),
    )
    .await
}

/// One JSON message per line in both directions. Replies and notifications
/// share `writer`; the input is re-probed every `refresh`. Returns when
/// `reader` reaches EOF.
pub async fn serve_lines<R, W>(
    controller: Arc<Controller>,
    reader: R,
    mut writer: W,
    refresh: Duration,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();
    let mut notifications = controller.subscribe();
    let mut ticker = interval(refresh);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read message stream")? else {
                    break;
                };
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                match controller.handle_json(line).await {
                    Ok(Some(reply)) => write_message(&mut writer, &reply).await?,
                    Ok(None) => {}
                    Err(err) => warn!(error = %err, "ignoring inbound line"),
                }
            }
            event = notifications.recv() => match event {
                Ok(message) => write_message(&mut writer, &message).await?,
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "notification stream lagged"),
                Err(RecvError::Closed) => break,
            },
            _ = ticker.tick() => {
                if controller.refresh_input().await.is_none() {
                    debug!("no input on page yet");
                }
            }
        }
    }

    info!("message stream closed");
    Ok(())
}

async fn write_message<W>(writer: &mut W, message: &Outbound) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut line = serde_json::to_vec(message).context("failed to encode message")?;
    line.push(b'\n');
    writer
        .write_all(&line)
        .await
        .context("failed to write message")?;
    writer.flush().await.context("failed to flush message")?;
    Ok(())
}
