//! DevTools-backed host page
//!
//! Implements the `HostPage` port against a page in an already running
//! Chromium. Element references are `data-lq-ref` attributes the page scripts
//! assign on first sight, so a reference survives between calls until the host
//! removes the node.

pub mod config;
pub mod errors;
pub mod page;
mod scripts;
pub mod transport;

pub use config::CdpHostConfig;
pub use errors::CdpHostError;
pub use page::CdpHostPage;
pub use transport::{ChromiumTransport, ScriptTransport};
