//! Chain execution error types

use std::fmt;

use composer::ComposeError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Wire code attached to `error` progress events and rejected runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChainErrorCode {
    NoSteps,
    AlreadyRunning,
    InputNotFound,
    SendFailed,
    InjectionFailed,
}

impl ChainErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChainErrorCode::NoSteps => "NO_STEPS",
            ChainErrorCode::AlreadyRunning => "ALREADY_RUNNING",
            ChainErrorCode::InputNotFound => "INPUT_NOT_FOUND",
            ChainErrorCode::SendFailed => "SEND_FAILED",
            ChainErrorCode::InjectionFailed => "INJECTION_FAILED",
        }
    }
}

impl fmt::Display for ChainErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Chain execution errors
#[derive(Debug, Error)]
pub enum ChainError {
    /// Empty step list; rejected before any state change
    #[error("chain has no steps")]
    NoSteps,

    /// Another run holds the executor
    #[error("a chain is already running")]
    AlreadyRunning,

    #[error("step {step_index}: no usable input found")]
    InputNotFound { step_index: usize },

    #[error("step {step_index}: every send strategy failed")]
    SendFailed { step_index: usize },

    #[error("step {step_index}: text injection failed: {source}")]
    InjectionFailed {
        step_index: usize,
        #[source]
        source: ComposeError,
    },
}

impl ChainError {
    pub fn code(&self) -> ChainErrorCode {
        match self {
            ChainError::NoSteps => ChainErrorCode::NoSteps,
            ChainError::AlreadyRunning => ChainErrorCode::AlreadyRunning,
            ChainError::InputNotFound { .. } => ChainErrorCode::InputNotFound,
            ChainError::SendFailed { .. } => ChainErrorCode::SendFailed,
            ChainError::InjectionFailed { .. } => ChainErrorCode::InjectionFailed,
        }
    }

    /// Step the failure happened at; `None` for rejected runs
    pub fn step_index(&self) -> Option<usize> {
        match self {
            ChainError::NoSteps | ChainError::AlreadyRunning => None,
            ChainError::InputNotFound { step_index }
            | ChainError::SendFailed { step_index }
            | ChainError::InjectionFailed { step_index, .. } => Some(*step_index),
        }
    }

    /// Rejected before starting, so no progress was emitted
    pub fn is_rejection(&self) -> bool {
        self.step_index().is_none()
    }
}
