use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chain_flow::{ChainConfig, ChainExecutor, ChainProgress, ChainRequest, ProgressSink, PromptQueue};
use composer::Composer;
use host_dom::{HostPage, InputHandle};
use langqueue_core_types::{PromptId, QueueItem};
use langqueue_event_bus::{EventBus, InMemoryBus};
use parking_lot::Mutex;
use site_adapters::{adapter_for, SiteAdapter};
use slash_detect::SlashContext;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::errors::ControllerError;
use crate::messages::*;
use crate::settings::SettingsStore;

const NOTIFICATION_CAPACITY: usize = 256;

/// Forwards chain progress onto the outbound notification stream.
struct OutboundProgress(Arc<InMemoryBus<Outbound>>);

impl ProgressSink for OutboundProgress {
    fn emit(&self, progress: ChainProgress) {
        self.0.notify(Outbound::ChainProgress(progress));
    }
}

/// One adapter wired to its queue, chain executor and message boundary.
pub struct Controller {
    adapter: Arc<dyn SiteAdapter>,
    page: Arc<dyn HostPage>,
    composer: Composer,
    queue: Arc<PromptQueue>,
    chain: Arc<ChainExecutor>,
    settings: Arc<dyn SettingsStore>,
    notifications: Arc<InMemoryBus<Outbound>>,
    active_input: Mutex<Option<InputHandle>>,
    ready_sent: AtomicBool,
}

impl Controller {
    pub fn new(
        adapter: Arc<dyn SiteAdapter>,
        page: Arc<dyn HostPage>,
        settings: Arc<dyn SettingsStore>,
        config: ChainConfig,
    ) -> Self {
        let composer = Composer::new(page.clone());
        let notifications = InMemoryBus::new(NOTIFICATION_CAPACITY);
        let progress = Arc::new(OutboundProgress(notifications.clone()));
        let queue = Arc::new(
            PromptQueue::new(adapter.clone(), composer.clone()).with_idle_wait(config.idle_wait),
        );
        let chain = Arc::new(
            ChainExecutor::new(adapter.clone(), composer.clone(), progress).with_config(config),
        );
        Self {
            adapter,
            page,
            composer,
            queue,
            chain,
            settings,
            notifications,
            active_input: Mutex::new(None),
            ready_sent: AtomicBool::new(false),
        }
    }

    /// Pick the adapter for the page's location and build a controller on it.
    pub async fn attach(
        page: Arc<dyn HostPage>,
        settings: Arc<dyn SettingsStore>,
        config: ChainConfig,
    ) -> Result<Self, ControllerError> {
        let location = page.location().await?;
        let adapter = adapter_for(&location, page.clone())
            .ok_or_else(|| ControllerError::UnsupportedHost(location.hostname.clone()))?;
        info!(adapter = %adapter.id(), host = %location.hostname, "controller attached");
        Ok(Self::new(adapter, page, settings, config))
    }

    pub fn adapter(&self) -> &Arc<dyn SiteAdapter> {
        &self.adapter
    }

    pub fn queue(&self) -> &Arc<PromptQueue> {
        &self.queue
    }

    pub fn chain(&self) -> &Arc<ChainExecutor> {
        &self.chain
    }

    /// Unsolicited messages: `TEXTAREA_READY` and `CHAIN_PROGRESS`.
    pub fn subscribe(&self) -> broadcast::Receiver<Outbound> {
        self.notifications.subscribe()
    }

    /// Decode one JSON message and handle it.
    pub async fn handle_json(&self, raw: &str) -> Result<Option<Outbound>, ControllerError> {
        let message: Inbound = serde_json::from_str(raw)?;
        Ok(self.handle(message).await)
    }

    /// Handle one inbound message; `Some` is the direct reply.
    pub async fn handle(&self, message: Inbound) -> Option<Outbound> {
        debug!(?message, "inbound message");
        match message {
            Inbound::CompatCheck => Some(Outbound::CompatStatus(self.compat_status().await)),
            Inbound::InjectPrompt(InjectPrompt { content }) => Some(Outbound::InjectPromptResult(
                self.inject_prompt(&content).await,
            )),
            Inbound::ClickSend => {
                let sent = self.click_send().await;
                debug!(sent, "click send requested");
                None
            }
            Inbound::RunChain(run) => Some(Outbound::RunChainResult(self.run_chain(run).await)),
            Inbound::CancelChain => {
                self.chain.cancel();
                None
            }
            Inbound::EnqueuePrompt(EnqueuePrompt { content, prompt_id }) => {
                self.enqueue_prompt(content, prompt_id);
                None
            }
        }
    }

    /// Re-probe for the input. The first time one is found, `TEXTAREA_READY`
    /// is published.
    pub async fn refresh_input(&self) -> Option<InputHandle> {
        let next = self.adapter.find_input().await?;
        let changed = {
            let mut active = self.active_input.lock();
            let changed = active.as_ref() != Some(&next);
            if changed {
                *active = Some(next.clone());
            }
            changed
        };
        if changed {
            debug!(element = %next.element, "active input changed");
            if !self.ready_sent.swap(true, Ordering::SeqCst) {
                info!(adapter = %self.adapter.id(), "input ready");
                self.notifications.notify(Outbound::TextareaReady);
            }
        }
        Some(next)
    }

    /// Tracked input if still valid, otherwise a fresh probe.
    pub async fn current_input(&self) -> Option<InputHandle> {
        let tracked = self.active_input.lock().clone();
        self.adapter.resolve_input(tracked.as_ref()).await
    }

    pub async fn compat_status(&self) -> CompatStatus {
        CompatStatus {
            ready: self.adapter.find_input().await.is_some(),
        }
    }

    /// Write a prompt into the input without sending it.
    pub async fn inject_prompt(&self, content: &str) -> InjectPromptResult {
        if content.is_empty() {
            return InjectPromptResult::failed(InjectFailure::NoContent);
        }
        let Some(input) = self.current_input().await else {
            return InjectPromptResult::failed(InjectFailure::InputNotFound);
        };
        let mode = self.settings.load().await.insertion_mode.unwrap_or_default();
        let text = if content.ends_with('\n') {
            content.to_string()
        } else {
            format!("{content}\n")
        };
        match self.composer.insert(&input, mode, &text).await {
            Ok(()) => InjectPromptResult::ok(),
            Err(err) => {
                warn!(error = %err, "prompt injection failed");
                InjectPromptResult::failed(InjectFailure::InjectionFailed)
            }
        }
    }

    pub async fn click_send(&self) -> bool {
        let input = self.current_input().await;
        self.adapter.click_send(input.as_ref()).await
    }

    /// Validate and start a chain in the background.
    pub async fn run_chain(&self, run: RunChain) -> RunChainResult {
        let settings = self.settings.load().await;
        let request = ChainRequest::new(run.steps)
            .with_settings(&settings)
            .with_override(run.insertion_mode_override);
        match self.chain.start(request) {
            Ok(_handle) => RunChainResult::accepted(),
            Err(err) => {
                debug!(code = %err.code(), "chain rejected");
                RunChainResult::rejected(err.code())
            }
        }
    }

    pub fn enqueue_prompt(&self, content: String, prompt_id: Option<PromptId>) {
        let item = QueueItem {
            content,
            prompt_id,
        };
        drop(self.queue.enqueue(item));
    }

    /// Enter pressed in the input. While the host is generating, move the
    /// field text into the queue and report the keystroke as consumed.
    pub async fn intercept_submit(&self) -> bool {
        let Some(input) = self.current_input().await else {
            return false;
        };
        if !self.adapter.is_generating().await {
            return false;
        }
        let text = self.composer.get_text(&input).await.trim().to_string();
        if text.is_empty() {
            return false;
        }
        if let Err(err) = self.composer.set_text(&input, "").await {
            warn!(error = %err, "could not clear input before queueing");
            return false;
        }
        info!(pending = self.queue.size() + 1, "submit queued while host is busy");
        let item = QueueItem::new(text).with_prompt(PromptId::new());
        debug!(prompt = ?item.prompt_id, "intercepted submit");
        drop(self.queue.enqueue(item));
        true
    }

    /// Slash trigger around the cursor of the current input.
    pub async fn slash_context(&self) -> Option<SlashContext> {
        let input = self.current_input().await?;
        let snapshot = match self.page.cursor_snapshot(&input.element, input.shape).await {
            Ok(snapshot) => snapshot?,
            Err(err) => {
                debug!(error = %err, "cursor snapshot failed");
                return None;
            }
        };
        slash_detect::detect(&snapshot)
    }

    /// Replace the active trigger with `replacement`. `false` when no trigger
    /// is active or the write failed.
    pub async fn accept_slash(&self, replacement: &str) -> bool {
        let Some(context) = self.slash_context().await else {
            return false;
        };
        let Some(input) = self.current_input().await else {
            return false;
        };
        match self
            .composer
            .replace_range(&input, &context, replacement)
            .await
        {
            Ok(()) => true,
            Err(err) => {
                warn!(error = %err, "slash replacement failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::SharedSettings;
    use chain_flow::{ChainErrorCode, ChainStatus};
    use host_dom::{ElementRef, MemoryPage, NodeSpec};
    use langqueue_core_types::{AppSettings, ChainStep, InsertionMode};
    use std::time::Duration;

    const TEXTBOX: &str = r#"div[contenteditable="true"][role="textbox"]"#;
    const AREA: &str = "textarea";
    const SEND: &str = r#"button[data-testid="send-button"]"#;
    const STOP: &str = r#"button[aria-label*="Stop" i]"#;

    struct Fixture {
        page: Arc<MemoryPage>,
        settings: Arc<SharedSettings>,
        controller: Controller,
    }

    async fn fixture() -> Fixture {
        let page = Arc::new(MemoryPage::new("https://chatgpt.com/"));
        let settings = SharedSettings::new(AppSettings::default());
        let controller = Controller::attach(page.clone(), settings.clone(), ChainConfig::default())
            .await
            .unwrap();
        Fixture {
            page,
            settings,
            controller,
        }
    }

    fn add_textarea(page: &MemoryPage, text: &str) -> ElementRef {
        page.insert(NodeSpec::textarea().matching(&[AREA]).text(text))
    }

    #[tokio::test]
    async fn attach_rejects_unknown_host() {
        let page = Arc::new(MemoryPage::new("https://example.org/"));
        let result = Controller::attach(
            page,
            SharedSettings::new(AppSettings::default()),
            ChainConfig::default(),
        )
        .await;
        assert!(matches!(result, Err(ControllerError::UnsupportedHost(host)) if host == "example.org"));
    }

    #[tokio::test]
    async fn compat_status_tracks_input() {
        let fx = fixture().await;
        let reply = fx.controller.handle(Inbound::CompatCheck).await;
        assert_eq!(reply, Some(Outbound::CompatStatus(CompatStatus { ready: false })));

        add_textarea(&fx.page, "");
        let reply = fx.controller.handle_json(r#"{"type":"COMPAT_CHECK"}"#).await.unwrap();
        assert_eq!(reply, Some(Outbound::CompatStatus(CompatStatus { ready: true })));
    }

    #[tokio::test]
    async fn inject_prompt_reasons() {
        let fx = fixture().await;
        assert_eq!(
            fx.controller.inject_prompt("").await,
            InjectPromptResult::failed(InjectFailure::NoContent)
        );
        assert_eq!(
            fx.controller.inject_prompt("hi").await,
            InjectPromptResult::failed(InjectFailure::InputNotFound)
        );

        let area = add_textarea(&fx.page, "old");
        assert_eq!(fx.controller.inject_prompt("hi").await, InjectPromptResult::ok());
        assert_eq!(fx.page.text(&area).unwrap(), "hi\n");

        fx.settings
            .update(|s| s.insertion_mode = Some(InsertionMode::Append));
        assert_eq!(fx.controller.inject_prompt("more\n").await, InjectPromptResult::ok());
        assert_eq!(fx.page.text(&area).unwrap(), "hi\n\nmore\n");
    }

    #[tokio::test]
    async fn textarea_ready_is_published_once() {
        let fx = fixture().await;
        let mut rx = fx.controller.subscribe();

        assert!(fx.controller.refresh_input().await.is_none());
        let first = add_textarea(&fx.page, "");
        assert_eq!(fx.controller.refresh_input().await.unwrap().element, first);

        // host remounts the field
        fx.page.with_dom(|dom| dom.remove(&first));
        let second = fx
            .page
            .insert(NodeSpec::rich_editable().matching(&[TEXTBOX]));
        assert_eq!(fx.controller.refresh_input().await.unwrap().element, second);

        assert_eq!(rx.try_recv().unwrap(), Outbound::TextareaReady);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn run_chain_rejections() {
        let fx = fixture().await;
        let reply = fx
            .controller
            .handle(Inbound::RunChain(RunChain::default()))
            .await;
        assert_eq!(
            reply,
            Some(Outbound::RunChainResult(RunChainResult::rejected(
                ChainErrorCode::NoSteps
            )))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn run_chain_while_running_is_rejected() {
        let fx = fixture().await;
        add_textarea(&fx.page, "");
        let mut rx = fx.controller.subscribe();
        let run = RunChain {
            steps: vec![ChainStep::new("draft").with_auto_send(false).with_delay_ms(1_000)],
            insertion_mode_override: None,
        };

        assert_eq!(
            fx.controller.run_chain(run.clone()).await,
            RunChainResult::accepted()
        );
        assert_eq!(
            fx.controller.run_chain(run).await,
            RunChainResult::rejected(ChainErrorCode::AlreadyRunning)
        );

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(!fx.controller.chain().is_running());

        let mut statuses = Vec::new();
        while let Ok(Outbound::ChainProgress(progress)) = rx.try_recv() {
            statuses.push(progress.status);
        }
        assert_eq!(
            statuses,
            vec![ChainStatus::Starting, ChainStatus::Delayed, ChainStatus::Completed]
        );
    }

    #[tokio::test]
    async fn enter_while_generating_moves_text_to_queue() {
        let fx = fixture().await;
        let area = add_textarea(&fx.page, "  follow-up  ");
        let stop = fx.page.insert(NodeSpec::button().matching(&[STOP]).hidden());

        assert!(!fx.controller.intercept_submit().await);
        assert_eq!(fx.page.text(&area).unwrap(), "  follow-up  ");

        fx.page.with_dom(|dom| dom.set_visible(&stop, true));
        assert!(fx.controller.intercept_submit().await);
        assert_eq!(fx.page.text(&area).unwrap(), "");
        assert_eq!(fx.controller.queue().size(), 1);
    }

    #[tokio::test]
    async fn empty_field_is_not_intercepted() {
        let fx = fixture().await;
        add_textarea(&fx.page, "   ");
        fx.page.insert(NodeSpec::button().matching(&[STOP]));
        assert!(!fx.controller.intercept_submit().await);
        assert_eq!(fx.controller.queue().size(), 0);
    }

    #[tokio::test]
    async fn accept_slash_replaces_trigger() {
        let fx = fixture().await;
        let area = add_textarea(&fx.page, "please //tra now");
        fx.page.with_dom(|dom| dom.place_caret(&area, 12));

        let context = fx.controller.slash_context().await.unwrap();
        assert_eq!(context.query, "tra");
        assert!(fx.controller.accept_slash("translate:").await);
        assert_eq!(fx.page.text(&area).unwrap(), "please translate: now");

        assert!(!fx.controller.accept_slash("again").await);
    }

    #[tokio::test]
    async fn click_send_message_sends_current_input() {
        let fx = fixture().await;
        add_textarea(&fx.page, "hello");
        let send = fx.page.insert(NodeSpec::button().matching(&[SEND]));
        assert_eq!(fx.controller.handle(Inbound::ClickSend).await, None);
        assert_eq!(fx.page.clicks_on(&send), 1);
    }

    #[tokio::test]
    async fn malformed_message_is_a_decode_error() {
        let fx = fixture().await;
        let err = fx.controller.handle_json(r#"{"type":"NOPE"}"#).await.unwrap_err();
        assert!(matches!(err, ControllerError::Decode(_)));
    }
}
