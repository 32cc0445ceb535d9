use clap::Subcommand;

use super::check::CheckArgs;
use super::detect::DetectArgs;
use super::run_chain::RunChainArgs;
use super::serve::ServeArgs;

#[derive(Subcommand, Clone)]
pub enum Commands {
    /// Drive the attached chat page from JSON lines on stdin
    Serve(ServeArgs),

    /// Run a prompt chain from a YAML file
    RunChain(RunChainArgs),

    /// Report which adapter matches the page and whether its input is ready
    Check(CheckArgs),

    /// Run the slash trigger detector over a piece of text
    Detect(DetectArgs),
}
