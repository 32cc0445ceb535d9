use async_trait::async_trait;
use chromiumoxide::browser::Browser;
use chromiumoxide::cdp::js_protocol::runtime::EvaluateParams;
use chromiumoxide::error::CdpError;
use chromiumoxide::page::Page;
use futures::StreamExt;
use host_dom::{DomError, HostLocation};
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::config::CdpHostConfig;
use crate::errors::CdpHostError;

/// Evaluates one expression in the attached page and returns its JSON value.
#[async_trait]
pub trait ScriptTransport: Send + Sync {
    async fn evaluate(&self, expression: String) -> Result<Value, DomError>;
}

/// Connection to an already running Chromium, bound to one page.
pub struct ChromiumTransport {
    _browser: Browser,
    page: Page,
    handler_task: JoinHandle<()>,
}

impl ChromiumTransport {
    pub async fn connect(config: &CdpHostConfig) -> Result<Self, CdpHostError> {
        if config.ws_url.is_empty() {
            return Err(CdpHostError::MissingUrl);
        }
        let connect_err = |err: CdpError| CdpHostError::Connect {
            url: config.ws_url.clone(),
            reason: err.to_string(),
        };

        let (mut browser, mut handler) =
            Browser::connect(config.ws_url.as_str()).await.map_err(connect_err)?;
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(err) = event {
                    error!(target: "cdp-host", ?err, "devtools handler stopped");
                    break;
                }
            }
        });

        browser.fetch_targets().await.map_err(connect_err)?;
        let pages = browser.pages().await.map_err(connect_err)?;
        let filter = config.page_filter.as_deref().unwrap_or_default();
        let mut selected = None;
        for page in pages {
            let url = page.url().await.ok().flatten().unwrap_or_default();
            let host = HostLocation::from_url(&url).hostname;
            debug!(target: "cdp-host", %url, "candidate page");
            if host.contains(filter) {
                selected = Some((page, url));
                break;
            }
        }
        let Some((page, url)) = selected else {
            handler_task.abort();
            return Err(CdpHostError::NoPage(filter.to_string()));
        };

        info!(target: "cdp-host", %url, "attached to page");
        Ok(Self {
            _browser: browser,
            page,
            handler_task,
        })
    }
}

#[async_trait]
impl ScriptTransport for ChromiumTransport {
    async fn evaluate(&self, expression: String) -> Result<Value, DomError> {
        let params = EvaluateParams::builder()
            .expression(expression)
            .return_by_value(true)
            .await_promise(true)
            .build()
            .map_err(DomError::Script)?;
        let result = self
            .page
            .evaluate_expression(params)
            .await
            .map_err(|err| match err {
                CdpError::JavascriptException(details) => DomError::Script(details.text.clone()),
                other => DomError::Transport(other.to_string()),
            })?;
        Ok(result.value().cloned().unwrap_or(Value::Null))
    }
}

impl Drop for ChromiumTransport {
    fn drop(&mut self) {
        self.handler_task.abort();
    }
}
