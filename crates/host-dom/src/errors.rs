//! Error types for host page access

use thiserror::Error;

/// Errors raised while talking to the host page.
///
/// These never cross the public surface of the automation core: adapters and
/// the composer turn them into `None`, `false` or a typed failure code.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomError {
    /// The element reference no longer points at a connected node
    #[error("element detached: {0}")]
    Detached(String),

    /// The element exists but does not support the requested operation
    #[error("unsupported operation on {element}: {operation}")]
    Unsupported {
        element: String,
        operation: &'static str,
    },

    /// A range offset fell outside the field content
    #[error("range {start}..{end} outside field of length {len}")]
    InvalidRange { start: usize, end: usize, len: usize },

    /// A page script threw or returned an unexpected shape
    #[error("script error: {0}")]
    Script(String),

    /// Protocol or connection failure
    #[error("transport error: {0}")]
    Transport(String),
}

impl DomError {
    /// Check if the failure may clear up on a later attempt
    pub fn is_retryable(&self) -> bool {
        matches!(self, DomError::Detached(_) | DomError::Transport(_))
    }
}
