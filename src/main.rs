//! physlab runner - headless physics demo driver
//!
//! Loads a scenario, ticks it at a fixed frame rate and prints the final
//! snapshot as JSON.

use std::process::ExitCode;

use physlab::cli::{run_cli, Args};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    run_cli(Args::parse())
}
