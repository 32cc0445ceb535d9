//! Progress delivery

use std::sync::Arc;

use langqueue_event_bus::InMemoryBus;
use tokio::sync::mpsc;
use tracing::trace;

use crate::types::ChainProgress;

/// Receives progress notifications. Must not block.
pub trait ProgressSink: Send + Sync {
    fn emit(&self, progress: ChainProgress);
}

/// Drops every notification.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopProgress;

impl ProgressSink for NoopProgress {
    fn emit(&self, _progress: ChainProgress) {}
}

impl ProgressSink for InMemoryBus<ChainProgress> {
    fn emit(&self, progress: ChainProgress) {
        self.notify(progress);
    }
}

impl ProgressSink for mpsc::UnboundedSender<ChainProgress> {
    fn emit(&self, progress: ChainProgress) {
        if self.send(progress).is_err() {
            trace!("progress receiver dropped");
        }
    }
}

impl<S> ProgressSink for Arc<S>
where
    S: ProgressSink + ?Sized,
{
    fn emit(&self, progress: ChainProgress) {
        (**self).emit(progress);
    }
}
