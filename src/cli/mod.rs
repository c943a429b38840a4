//! CLI module for the headless runner.
//!
//! All logic lives here rather than in `main.rs` so it can be tested.

mod args;
mod commands;
mod output;

pub use args::{Args, Command, RunOptions, DEFAULT_DURATION, DEFAULT_FRAME_DT};
pub use commands::{run_cli, run_scenario, RunOutcome};
pub use output::{print_help, print_outcome, print_version};

#[cfg(test)]
mod tests;
