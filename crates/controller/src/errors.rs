//! Controller error types

use host_dom::DomError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ControllerError {
    /// The line is not a known inbound message
    #[error("invalid message: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("page unavailable: {0}")]
    Page(#[from] DomError),

    /// No supported host matched the page
    #[error("no adapter for host '{0}'")]
    UnsupportedHost(String),
}
