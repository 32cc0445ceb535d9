use thiserror::Error;

/// Failures while attaching to a browser.
#[derive(Debug, Error)]
pub enum CdpHostError {
    #[error("no DevTools websocket url configured")]
    MissingUrl,

    #[error("failed to connect to {url}: {reason}")]
    Connect { url: String, reason: String },

    #[error("no page matching '{0}'")]
    NoPage(String),
}
