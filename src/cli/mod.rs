pub mod app;
pub mod check;
pub mod commands;
pub mod detect;
pub mod env;
pub mod run_chain;
pub mod runtime;
pub mod serve;
pub mod session;

pub use check::{cmd_check, CheckArgs};
pub use detect::{cmd_detect, DetectArgs};
pub use run_chain::{cmd_run_chain, RunChainArgs};
pub use serve::{cmd_serve, serve_lines, ServeArgs};
