//! CLI argument parsing.
//!
//! Hand-rolled so the parser can be exercised from tests with any
//! iterator of strings.

use std::path::PathBuf;

/// Frame delta used when `--frame-dt` is absent (60 Hz).
pub const DEFAULT_FRAME_DT: f64 = 1.0 / 60.0;

/// Simulated duration used when `--duration` is absent (s).
pub const DEFAULT_DURATION: f64 = 10.0;

/// CLI arguments container.
#[derive(Debug, Clone, PartialEq)]
pub struct Args {
    /// The command to execute.
    pub command: Command,
}

/// Available CLI commands.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Run a scenario headless.
    Run(RunOptions),
    /// Show help
    Help,
    /// Show version
    Version,
}

/// Options of a headless run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOptions {
    /// Path to the scenario YAML file.
    pub scenario_path: PathBuf,
    /// Wall-clock seconds to feed the engine.
    pub duration: f64,
    /// Wall-clock seconds per frame.
    pub frame_dt: f64,
    /// Print the history table after the snapshot.
    pub history: bool,
}

impl RunOptions {
    /// Options with defaults for `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            scenario_path: path.into(),
            duration: DEFAULT_DURATION,
            frame_dt: DEFAULT_FRAME_DT,
            history: false,
        }
    }
}

impl Args {
    /// Parse command-line arguments from an iterator.
    ///
    /// The first item is the program name.
    #[must_use]
    pub fn parse_from<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let args: Vec<String> = args.into_iter().map(|s| s.as_ref().to_string()).collect();
        Self::parse_from_vec(&args)
    }

    /// Parse command-line arguments from the environment.
    #[must_use]
    pub fn parse() -> Self {
        Self::parse_from(std::env::args())
    }

    fn parse_from_vec(args: &[String]) -> Self {
        if args.len() < 2 {
            return Self {
                command: Command::Help,
            };
        }

        let command = match args[1].as_str() {
            "-h" | "--help" | "help" => Command::Help,
            "-V" | "--version" | "version" => Command::Version,
            flag if flag.starts_with('-') => {
                eprintln!("Error: expected a scenario path before '{flag}'");
                Command::Help
            }
            _ => Self::parse_run_command(args).unwrap_or(Command::Help),
        };

        Self { command }
    }

    fn parse_run_command(args: &[String]) -> Option<Command> {
        let mut options = RunOptions::new(&args[1]);

        let mut i = 2;
        while i < args.len() {
            match args[i].as_str() {
                "--duration" => {
                    options.duration = Self::positive_value(args, i)?;
                    i += 2;
                }
                "--frame-dt" => {
                    options.frame_dt = Self::positive_value(args, i)?;
                    i += 2;
                }
                "--history" => {
                    options.history = true;
                    i += 1;
                }
                unknown => {
                    eprintln!("Warning: ignoring unknown argument '{unknown}'");
                    i += 1;
                }
            }
        }

        Some(Command::Run(options))
    }

    fn positive_value(args: &[String], i: usize) -> Option<f64> {
        let flag = &args[i];
        let Some(raw) = args.get(i + 1) else {
            eprintln!("Error: '{flag}' requires a value");
            return None;
        };
        match raw.parse::<f64>() {
            Ok(v) if v.is_finite() && v > 0.0 => Some(v),
            _ => {
                eprintln!("Error: '{flag}' expects a positive number of seconds, got '{raw}'");
                None
            }
        }
    }
}
