//! LangQueue command line host
//!
//! Attaches the automation core to a chat page in a running Chromium and
//! exposes it as a JSON-lines message stream, a one-shot chain runner and a
//! couple of diagnostics.

pub mod cli;
pub mod config;

pub use config::Config;
