//! Serial dispatcher for prompts submitted while the host is busy

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use composer::Composer;
use langqueue_core_types::QueueItem;
use parking_lot::Mutex;
use site_adapters::{IdleWait, SiteAdapter};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

/// Holds the single-flight claim; released on drop unless released earlier.
struct FlushClaim<'a>(Option<&'a AtomicBool>);

impl FlushClaim<'_> {
    fn release(&mut self) {
        if let Some(running) = self.0.take() {
            running.store(false, Ordering::SeqCst);
        }
    }
}

impl Drop for FlushClaim<'_> {
    fn drop(&mut self) {
        self.release();
    }
}

/// FIFO of pending prompts with a single-flight flush loop.
///
/// A failed attempt leaves the head in place; only a later `enqueue` (or an
/// explicit `flush`) retries it.
pub struct PromptQueue {
    adapter: Arc<dyn SiteAdapter>,
    composer: Composer,
    idle_wait: IdleWait,
    items: Mutex<VecDeque<QueueItem>>,
    running: AtomicBool,
}

impl PromptQueue {
    pub fn new(adapter: Arc<dyn SiteAdapter>, composer: Composer) -> Self {
        Self {
            adapter,
            composer,
            idle_wait: IdleWait::default(),
            items: Mutex::new(VecDeque::new()),
            running: AtomicBool::new(false),
        }
    }

    pub fn with_idle_wait(mut self, idle_wait: IdleWait) -> Self {
        self.idle_wait = idle_wait;
        self
    }

    pub fn size(&self) -> usize {
        self.items.lock().len()
    }

    pub fn is_flushing(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Append and kick off a flush in the background.
    pub fn enqueue(self: &Arc<Self>, item: QueueItem) -> JoinHandle<()> {
        let size = {
            let mut items = self.items.lock();
            items.push_back(item);
            items.len()
        };
        debug!(size, "prompt queued");
        let queue = Arc::clone(self);
        tokio::spawn(async move { queue.flush().await })
    }

    /// Send queued prompts in order until the queue drains or an attempt
    /// fails. A call made while another flush is active returns at once.
    pub async fn flush(&self) {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            trace!("flush already in progress");
            return;
        }
        let mut claim = FlushClaim(Some(&self.running));

        loop {
            let item = {
                let items = self.items.lock();
                let Some(item) = items.front().cloned() else {
                    // Released under the lock so a concurrent enqueue either
                    // lands before this check or sees the claim cleared.
                    claim.release();
                    return;
                };
                item
            };

            if !self.adapter.wait_until_ready(self.idle_wait).await {
                debug!("host still busy, sending anyway");
            }

            let Some(input) = self.adapter.find_input().await else {
                warn!(pending = self.size(), "no input found, queue paused");
                break;
            };
            if let Err(err) = self.composer.set_text(&input, &item.content).await {
                warn!(error = %err, pending = self.size(), "queued prompt not written, queue paused");
                break;
            }
            if !self.adapter.click_send(Some(&input)).await {
                warn!(pending = self.size(), "send failed, queue paused");
                break;
            }

            self.adapter.wait_for_idle(self.idle_wait).await;
            self.items.lock().pop_front();
            info!(
                prompt = ?item.prompt_id,
                remaining = self.size(),
                "queued prompt sent"
            );
        }
    }
}
