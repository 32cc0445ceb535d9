//! Prompt orchestration
//!
//! Two drivers sit on top of a site adapter:
//! - [`PromptQueue`] serialises single prompts typed while the host is busy
//! - [`ChainExecutor`] runs an ordered list of steps with per-step send, await
//!   and delay policy, reporting progress and honouring cooperative cancel
//!
//! Neither caches the host input across a suspension point; the handle is
//! resolved through the adapter right before every write.

pub mod errors;
pub mod executor;
pub mod progress;
pub mod queue;
pub mod types;

pub use errors::{ChainError, ChainErrorCode};
pub use executor::{ChainConfig, ChainExecutor, SETTLE_DELAY};
pub use progress::{NoopProgress, ProgressSink};
pub use queue::PromptQueue;
pub use types::{ChainOutcome, ChainProgress, ChainRequest, ChainStatus, ResolvedStep};

#[cfg(test)]
pub(crate) mod testing;
