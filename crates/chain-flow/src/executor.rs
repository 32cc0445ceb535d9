//! Chain executor implementation

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use composer::Composer;
use langqueue_core_types::InsertionMode;
use site_adapters::{IdleWait, SiteAdapter};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::errors::ChainError;
use crate::progress::ProgressSink;
use crate::types::*;

/// Pause after an awaited response so host controls can re-enable.
pub const SETTLE_DELAY: Duration = Duration::from_millis(150);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChainConfig {
    pub idle_wait: IdleWait,
    pub settle_delay: Duration,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            idle_wait: IdleWait::default(),
            settle_delay: SETTLE_DELAY,
        }
    }
}

#[derive(Debug, Default)]
struct ExecutionFlags {
    running: AtomicBool,
    cancelled: AtomicBool,
}

/// Holds the running flag for one execution and clears it on drop, so every
/// exit path (including a dropped task) releases the executor.
struct RunningGuard(Arc<ExecutionFlags>);

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.0.running.store(false, Ordering::SeqCst);
    }
}

/// Runs chains against one adapter. At most one run at a time.
pub struct ChainExecutor {
    adapter: Arc<dyn SiteAdapter>,
    composer: Composer,
    progress: Arc<dyn ProgressSink>,
    config: ChainConfig,
    flags: Arc<ExecutionFlags>,
}

impl ChainExecutor {
    pub fn new(
        adapter: Arc<dyn SiteAdapter>,
        composer: Composer,
        progress: Arc<dyn ProgressSink>,
    ) -> Self {
        Self {
            adapter,
            composer,
            progress,
            config: ChainConfig::default(),
            flags: Arc::new(ExecutionFlags::default()),
        }
    }

    pub fn with_config(mut self, config: ChainConfig) -> Self {
        self.config = config;
        self
    }

    pub fn is_running(&self) -> bool {
        self.flags.running.load(Ordering::SeqCst)
    }

    pub fn state(&self) -> ChainExecutionState {
        ChainExecutionState {
            running: self.flags.running.load(Ordering::SeqCst),
            cancelled: self.flags.cancelled.load(Ordering::SeqCst),
        }
    }

    /// Request cooperative cancellation. Observed before the next step and
    /// after each awaited response.
    pub fn cancel(&self) {
        debug!(running = self.is_running(), "chain cancel requested");
        self.flags.cancelled.store(true, Ordering::SeqCst);
    }

    /// Run to settlement. `true` only when every step completed.
    pub async fn run(&self, request: ChainRequest) -> bool {
        match self.try_run(request).await {
            Ok(outcome) => outcome.is_completed(),
            Err(err) => {
                debug!(code = %err.code(), "chain run rejected");
                false
            }
        }
    }

    /// Like `run`, reporting how the run ended or why it was rejected.
    pub async fn try_run(&self, request: ChainRequest) -> Result<ChainOutcome, ChainError> {
        let guard = self.claim(&request)?;
        Ok(self.execute(request, guard).await)
    }

    /// Claim the executor now and run in a background task.
    ///
    /// The rejection is synchronous: a second `start` or `run` issued right
    /// after this returns is refused even before the task is polled.
    pub fn start(
        self: &Arc<Self>,
        request: ChainRequest,
    ) -> Result<JoinHandle<ChainOutcome>, ChainError> {
        let guard = self.claim(&request)?;
        let executor = Arc::clone(self);
        Ok(tokio::spawn(async move {
            executor.execute(request, guard).await
        }))
    }

    fn claim(&self, request: &ChainRequest) -> Result<RunningGuard, ChainError> {
        if request.steps.is_empty() {
            return Err(ChainError::NoSteps);
        }
        if self
            .flags
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(ChainError::AlreadyRunning);
        }
        self.flags.cancelled.store(false, Ordering::SeqCst);
        Ok(RunningGuard(Arc::clone(&self.flags)))
    }

    fn is_cancelled(&self) -> bool {
        self.flags.cancelled.load(Ordering::SeqCst)
    }

    fn emit(&self, step_index: usize, total_steps: usize, status: ChainStatus) {
        self.progress
            .emit(ChainProgress::new(step_index, total_steps, status));
    }

    async fn execute(&self, request: ChainRequest, _guard: RunningGuard) -> ChainOutcome {
        let total = request.steps.len();
        let mode = request.effective_mode();
        info!(
            adapter = %self.adapter.id(),
            steps = total,
            %mode,
            "chain started"
        );
        self.emit(0, total, ChainStatus::Starting);

        match self.execute_steps(&request, mode).await {
            Ok(ChainOutcome::Completed) => {
                self.emit(total - 1, total, ChainStatus::Completed);
                info!(steps = total, "chain completed");
                ChainOutcome::Completed
            }
            Ok(outcome) => {
                info!(?outcome, "chain stopped");
                outcome
            }
            Err(err) => {
                let code = err.code();
                let step_index = err.step_index().unwrap_or(0);
                warn!(step = step_index, %code, error = %err, "chain aborted");
                self.progress
                    .emit(ChainProgress::failed(step_index, total, code));
                ChainOutcome::Failed { step_index, code }
            }
        }
    }

    fn stop_cancelled(&self, step_index: usize, total: usize) -> ChainOutcome {
        self.emit(step_index, total, ChainStatus::Cancelled);
        ChainOutcome::Cancelled { step_index }
    }

    async fn execute_steps(
        &self,
        request: &ChainRequest,
        mode: InsertionMode,
    ) -> Result<ChainOutcome, ChainError> {
        let total = request.steps.len();

        for (index, step) in request.steps.iter().enumerate() {
            if self.is_cancelled() {
                return Ok(self.stop_cancelled(index, total));
            }

            let input = self
                .adapter
                .find_input()
                .await
                .ok_or(ChainError::InputNotFound { step_index: index })?;

            self.composer
                .insert(&input, mode, &step.content)
                .await
                .map_err(|source| ChainError::InjectionFailed {
                    step_index: index,
                    source,
                })?;

            let policy = ResolvedStep::resolve(step, &request.defaults);
            debug!(step = index, ?policy, "step injected");

            if policy.auto_send {
                self.emit(index, total, ChainStatus::Sending);
                if !self.adapter.click_send(Some(&input)).await {
                    return Err(ChainError::SendFailed { step_index: index });
                }

                if policy.await_response {
                    self.emit(index, total, ChainStatus::AwaitingResponse);
                    if !self.adapter.wait_for_idle(self.config.idle_wait).await {
                        debug!(step = index, "no idle confirmation, continuing");
                    }
                    sleep(self.config.settle_delay).await;
                    if self.is_cancelled() {
                        return Ok(self.stop_cancelled(index, total));
                    }
                }
            }

            if !policy.delay.is_zero() {
                self.emit(index, total, ChainStatus::Delayed);
                sleep(policy.delay).await;
            }
        }

        Ok(ChainOutcome::Completed)
    }
}
