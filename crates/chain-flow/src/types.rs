//! Core types for chain orchestration

use std::time::Duration;

use langqueue_core_types::{AppSettings, ChainDefaults, ChainStep, InsertionMode};
use serde::{Deserialize, Serialize};

use crate::errors::ChainErrorCode;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChainStatus {
    Starting,
    Sending,
    AwaitingResponse,
    Delayed,
    Completed,
    Cancelled,
    Error,
}

/// One progress notification. Emitted, never stored.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainProgress {
    pub step_index: usize,
    pub total_steps: usize,
    pub status: ChainStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ChainErrorCode>,
}

impl ChainProgress {
    pub fn new(step_index: usize, total_steps: usize, status: ChainStatus) -> Self {
        Self {
            step_index,
            total_steps,
            status,
            error: None,
        }
    }

    pub fn failed(step_index: usize, total_steps: usize, code: ChainErrorCode) -> Self {
        Self {
            error: Some(code),
            ..Self::new(step_index, total_steps, ChainStatus::Error)
        }
    }
}

/// How a started run ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChainOutcome {
    Completed,
    Cancelled { step_index: usize },
    Failed { step_index: usize, code: ChainErrorCode },
}

impl ChainOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, ChainOutcome::Completed)
    }
}

/// Snapshot of the executor flags.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ChainExecutionState {
    pub running: bool,
    pub cancelled: bool,
}

/// Step policy after applying chain defaults and fallbacks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResolvedStep {
    pub auto_send: bool,
    pub await_response: bool,
    pub delay: Duration,
}

impl ResolvedStep {
    /// Step value, else chain default, else `true`/`true`/`0`.
    pub fn resolve(step: &ChainStep, defaults: &ChainDefaults) -> Self {
        Self {
            auto_send: step.auto_send.or(defaults.auto_send).unwrap_or(true),
            await_response: step
                .await_response
                .or(defaults.await_response)
                .unwrap_or(true),
            delay: Duration::from_millis(
                step.delay_ms.or(defaults.default_delay_ms).unwrap_or(0),
            ),
        }
    }
}

/// Everything one run needs, captured when the run is requested.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChainRequest {
    pub steps: Vec<ChainStep>,
    pub defaults: ChainDefaults,
    /// Stored preference
    pub insertion_mode: Option<InsertionMode>,
    /// Per-run override, wins over the stored preference
    pub insertion_mode_override: Option<InsertionMode>,
}

impl ChainRequest {
    pub fn new(steps: Vec<ChainStep>) -> Self {
        Self {
            steps,
            ..Self::default()
        }
    }

    /// Take defaults and insertion mode from a settings snapshot.
    pub fn with_settings(mut self, settings: &AppSettings) -> Self {
        self.defaults = settings.chain_defaults.clone();
        self.insertion_mode = settings.insertion_mode;
        self
    }

    pub fn with_defaults(mut self, defaults: ChainDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn with_override(mut self, mode: Option<InsertionMode>) -> Self {
        self.insertion_mode_override = mode;
        self
    }

    pub fn effective_mode(&self) -> InsertionMode {
        self.insertion_mode_override
            .or(self.insertion_mode)
            .unwrap_or_default()
    }
}
