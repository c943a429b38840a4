//! CLI output formatting.

use super::commands::RunOutcome;
use crate::error::{SimError, SimResult};

/// Print version information.
pub fn print_version() {
    println!(
        "physlab {} ({})",
        env!("CARGO_PKG_VERSION"),
        option_env!("GIT_HASH").unwrap_or("unknown")
    );
}

/// Print help message.
pub fn print_help() {
    println!(
        r"physlab - fixed-substep physics demo runner

USAGE:
    physlab <scenario.yaml> [OPTIONS]

OPTIONS:
    --duration <SECONDS>    Wall-clock time to simulate (default: 10)
    --frame-dt <SECONDS>    Frame delta fed to the engine (default: 1/60)
    --history               Include the sampled history in the output
    -h, --help              Show this help message
    -V, --version           Show version information

The final snapshot is printed to stdout as JSON. Set RUST_LOG=debug to
trace friction transitions, contacts and terminal events.

EXAMPLES:
    physlab configs/pendulum.yaml --duration 20
    physlab configs/orbit.yaml --history > orbit.json"
    );
}

/// Print a run outcome as pretty JSON.
///
/// # Errors
///
/// Returns a serialization error if encoding fails.
pub fn print_outcome(outcome: &RunOutcome) -> SimResult<()> {
    let json = serde_json::to_string_pretty(outcome)
        .map_err(|e| SimError::serialization(e.to_string()))?;
    println!("{json}");
    Ok(())
}
