//! Scripted adapter and recording sink shared by the unit tests

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use composer::Composer;
use host_dom::{ElementRef, FieldShape, HostLocation, InputHandle, MemoryPage, NodeSpec};
use langqueue_core_types::AdapterId;
use parking_lot::Mutex;
use site_adapters::{IdleWait, SiteAdapter};

use crate::progress::ProgressSink;
use crate::types::{ChainProgress, ChainStatus};

pub(crate) struct FakeAdapter {
    pub page: Arc<MemoryPage>,
    pub input: ElementRef,
    pub input_present: AtomicBool,
    pub send_script: Mutex<VecDeque<bool>>,
    /// Field text at every successful send
    pub sent: Mutex<Vec<String>>,
    pub send_calls: AtomicUsize,
    pub wait_calls: AtomicUsize,
    pub ready_calls: AtomicUsize,
    pub idle_delay: Mutex<Duration>,
}

impl FakeAdapter {
    pub fn new() -> Arc<Self> {
        let page = Arc::new(MemoryPage::new("https://chatgpt.com/"));
        let input = page.insert(NodeSpec::textarea());
        Arc::new(Self {
            page,
            input,
            input_present: AtomicBool::new(true),
            send_script: Mutex::new(VecDeque::new()),
            sent: Mutex::new(Vec::new()),
            send_calls: AtomicUsize::new(0),
            wait_calls: AtomicUsize::new(0),
            ready_calls: AtomicUsize::new(0),
            idle_delay: Mutex::new(Duration::ZERO),
        })
    }

    pub fn composer(&self) -> Composer {
        Composer::new(self.page.clone())
    }

    /// Results for the next sends; unscripted sends succeed
    pub fn script_sends(&self, results: &[bool]) {
        self.send_script.lock().extend(results.iter().copied());
    }

    pub fn set_idle_delay(&self, delay: Duration) {
        *self.idle_delay.lock() = delay;
    }

    pub fn text(&self) -> String {
        self.page.text(&self.input).unwrap_or_default()
    }

    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().clone()
    }

    pub fn waits(&self) -> usize {
        self.wait_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SiteAdapter for FakeAdapter {
    fn id(&self) -> AdapterId {
        AdapterId::Chatgpt
    }

    fn matches(&self, _location: &HostLocation) -> bool {
        true
    }

    async fn find_input(&self) -> Option<InputHandle> {
        self.input_present
            .load(Ordering::SeqCst)
            .then(|| InputHandle::new(self.input.clone(), FieldShape::PlainValue))
    }

    async fn revalidate(&self, _handle: &InputHandle) -> bool {
        self.input_present.load(Ordering::SeqCst)
    }

    async fn is_generating(&self) -> bool {
        false
    }

    async fn is_input_ready(&self, _handle: &InputHandle) -> bool {
        true
    }

    async fn click_send(&self, _input: Option<&InputHandle>) -> bool {
        self.send_calls.fetch_add(1, Ordering::SeqCst);
        let ok = self.send_script.lock().pop_front().unwrap_or(true);
        if ok {
            let text = self.text();
            self.sent.lock().push(text);
        }
        ok
    }

    async fn wait_until_ready(&self, _wait: IdleWait) -> bool {
        self.ready_calls.fetch_add(1, Ordering::SeqCst);
        true
    }

    async fn wait_for_idle(&self, _wait: IdleWait) -> bool {
        self.wait_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.idle_delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        true
    }
}

#[derive(Default)]
pub(crate) struct RecordingSink {
    events: Mutex<Vec<ChainProgress>>,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<ChainProgress> {
        self.events.lock().clone()
    }

    pub fn statuses(&self) -> Vec<(ChainStatus, usize)> {
        self.events
            .lock()
            .iter()
            .map(|e| (e.status, e.step_index))
            .collect()
    }
}

impl ProgressSink for RecordingSink {
    fn emit(&self, progress: ChainProgress) {
        self.events.lock().push(progress);
    }
}
