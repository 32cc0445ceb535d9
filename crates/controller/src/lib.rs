//! LangQueue controller
//!
//! Binds one [`SiteAdapter`](site_adapters::SiteAdapter) to the rest of the
//! automation core and exposes it through a typed message boundary:
//! - `INJECT_PROMPT`, `COMPAT_CHECK`, `RUN_CHAIN` get a direct reply
//! - `CLICK_SEND`, `CANCEL_CHAIN`, `ENQUEUE_PROMPT` are fire-and-forget
//! - `TEXTAREA_READY` and `CHAIN_PROGRESS` are published to subscribers
//!
//! Submits intercepted while the host is generating go through the
//! [`PromptQueue`](chain_flow::PromptQueue) instead of the host.

pub mod controller;
pub mod errors;
pub mod messages;
pub mod settings;

pub use controller::Controller;
pub use errors::ControllerError;
pub use messages::{
    CompatStatus, EnqueuePrompt, InjectFailure, InjectPrompt, InjectPromptResult, Inbound,
    Outbound, RunChain, RunChainResult,
};
pub use settings::{SettingsStore, SharedSettings};
