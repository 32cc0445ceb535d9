use std::sync::Arc;
use std::time::Duration;

use chain_flow::{ChainConfig, ChainStatus};
use host_dom::{ElementRef, MemoryPage, NodeSpec};
use langqueue_controller::{Controller, Inbound, Outbound, RunChain, RunChainResult, SharedSettings};
use langqueue_core_types::{AppSettings, ChainStep};
use parking_lot::Mutex;

const REPLY_TIME: Duration = Duration::from_secs(2);

/// A ChatGPT-like page: sending records the field text, clears it and shows
/// the stop button for `REPLY_TIME`.
struct SimulatedHost {
    page: Arc<MemoryPage>,
    input: ElementRef,
    stop: ElementRef,
    sent: Arc<Mutex<Vec<String>>>,
}

impl SimulatedHost {
    fn new() -> Self {
        let page = Arc::new(MemoryPage::new("https://chatgpt.com/c/abc"));
        let input = page.insert(NodeSpec::textarea().matching(&["textarea"]));
        let send = page.insert(
            NodeSpec::button().matching(&[r#"button[data-testid="send-button"]"#]),
        );
        let stop = page.insert(
            NodeSpec::button()
                .matching(&[r#"button[data-testid="stop-button"]"#])
                .hidden(),
        );
        let sent = Arc::new(Mutex::new(Vec::new()));

        let (hook_input, hook_stop, hook_sent) = (input.clone(), stop.clone(), sent.clone());
        page.on_click(move |dom, clicked| {
            if clicked != &send {
                return;
            }
            if let Some(text) = dom.text(&hook_input) {
                hook_sent.lock().push(text);
            }
            dom.set_text(&hook_input, "");
            dom.show_for(&hook_stop, REPLY_TIME);
        });

        Self {
            page,
            input,
            stop,
            sent,
        }
    }

    fn sent(&self) -> Vec<String> {
        self.sent.lock().clone()
    }
}

async fn attach(host: &SimulatedHost) -> Controller {
    Controller::attach(
        host.page.clone(),
        SharedSettings::new(AppSettings::default()),
        ChainConfig::default(),
    )
    .await
    .unwrap()
}

#[tokio::test(start_paused = true)]
async fn chain_runs_each_step_to_idle() {
    let host = SimulatedHost::new();
    let controller = attach(&host).await;
    let mut rx = controller.subscribe();

    let reply = controller
        .handle_json(
            r#"{"type":"RUN_CHAIN","payload":{"steps":[{"content":"first"},{"content":"second"}]}}"#,
        )
        .await
        .unwrap();
    assert_eq!(reply, Some(Outbound::RunChainResult(RunChainResult::accepted())));

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert!(!controller.chain().is_running());
    assert_eq!(host.sent(), vec!["first".to_string(), "second".to_string()]);

    let mut progress = Vec::new();
    while let Ok(Outbound::ChainProgress(p)) = rx.try_recv() {
        progress.push((p.step_index, p.status));
    }
    assert_eq!(
        progress,
        vec![
            (0, ChainStatus::Starting),
            (0, ChainStatus::Sending),
            (0, ChainStatus::AwaitingResponse),
            (1, ChainStatus::Sending),
            (1, ChainStatus::AwaitingResponse),
            (1, ChainStatus::Completed),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn cancel_stops_before_next_step() {
    let host = SimulatedHost::new();
    let controller = attach(&host).await;
    let mut rx = controller.subscribe();

    let run = RunChain {
        steps: vec![ChainStep::new("one"), ChainStep::new("two")],
        insertion_mode_override: None,
    };
    assert_eq!(
        controller.run_chain(run).await,
        RunChainResult::accepted()
    );

    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(controller.handle(Inbound::CancelChain).await, None);
    tokio::time::sleep(Duration::from_secs(10)).await;

    assert_eq!(host.sent(), vec!["one".to_string()]);
    let last = std::iter::from_fn(|| rx.try_recv().ok()).last();
    let Some(Outbound::ChainProgress(last)) = last else {
        panic!("expected progress");
    };
    assert_eq!(last.status, ChainStatus::Cancelled);
    assert_eq!(last.step_index, 0);
}

#[tokio::test(start_paused = true)]
async fn submit_during_generation_is_sent_after_idle() {
    let host = SimulatedHost::new();
    let controller = attach(&host).await;

    host.page.with_dom(|dom| {
        dom.set_text(&host.input, "follow up");
        dom.show_for(&host.stop, Duration::from_secs(3));
    });

    assert!(controller.intercept_submit().await);
    assert_eq!(host.page.text(&host.input).unwrap(), "");
    assert_eq!(controller.queue().size(), 1);

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert!(host.sent().is_empty());

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(host.sent(), vec!["follow up".to_string()]);
    assert_eq!(controller.queue().size(), 0);
}

#[tokio::test(start_paused = true)]
async fn enqueued_prompts_keep_their_order() {
    let host = SimulatedHost::new();
    let controller = attach(&host).await;

    for content in ["a", "b", "c"] {
        let message = format!(r#"{{"type":"ENQUEUE_PROMPT","payload":{{"content":"{content}"}}}}"#);
        assert_eq!(controller.handle_json(&message).await.unwrap(), None);
    }
    tokio::time::sleep(Duration::from_secs(30)).await;

    assert_eq!(
        host.sent(),
        vec!["a".to_string(), "b".to_string(), "c".to_string()]
    );
}
