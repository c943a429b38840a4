//! CLI module tests.

use super::args::{Args, Command, RunOptions, DEFAULT_DURATION, DEFAULT_FRAME_DT};
use super::commands::run_scenario;
use super::output::print_outcome;
use crate::demos::Terminal;
use std::path::PathBuf;

// ============================================================================
// Args parsing tests
// ============================================================================

#[test]
fn test_parse_no_args_shows_help() {
    let args = Args::parse_from(["physlab"]);
    assert_eq!(args.command, Command::Help);
}

#[test]
fn test_parse_help_flags() {
    for flag in ["-h", "--help", "help"] {
        assert_eq!(Args::parse_from(["physlab", flag]).command, Command::Help);
    }
}

#[test]
fn test_parse_version_flags() {
    for flag in ["-V", "--version", "version"] {
        assert_eq!(Args::parse_from(["physlab", flag]).command, Command::Version);
    }
}

#[test]
fn test_parse_scenario_defaults() {
    let args = Args::parse_from(["physlab", "pendulum.yaml"]);
    let Command::Run(options) = args.command else {
        panic!("expected run");
    };
    assert_eq!(options.scenario_path, PathBuf::from("pendulum.yaml"));
    assert!((options.duration - DEFAULT_DURATION).abs() < f64::EPSILON);
    assert!((options.frame_dt - DEFAULT_FRAME_DT).abs() < f64::EPSILON);
    assert!(!options.history);
}

#[test]
fn test_parse_scenario_options() {
    let args = Args::parse_from([
        "physlab",
        "orbit.yaml",
        "--duration",
        "30",
        "--frame-dt",
        "0.02",
        "--history",
    ]);
    let Command::Run(options) = args.command else {
        panic!("expected run");
    };
    assert!((options.duration - 30.0).abs() < f64::EPSILON);
    assert!((options.frame_dt - 0.02).abs() < f64::EPSILON);
    assert!(options.history);
}

#[test]
fn test_parse_rejects_bad_duration() {
    let args = Args::parse_from(["physlab", "x.yaml", "--duration", "-1"]);
    assert_eq!(args.command, Command::Help);

    let args = Args::parse_from(["physlab", "x.yaml", "--frame-dt", "fast"]);
    assert_eq!(args.command, Command::Help);
}

#[test]
fn test_parse_missing_value() {
    let args = Args::parse_from(["physlab", "x.yaml", "--duration"]);
    assert_eq!(args.command, Command::Help);
}

#[test]
fn test_parse_unknown_flag_is_ignored() {
    let args = Args::parse_from(["physlab", "x.yaml", "--turbo"]);
    assert!(matches!(args.command, Command::Run(_)));
}

#[test]
fn test_parse_flag_without_scenario() {
    let args = Args::parse_from(["physlab", "--history"]);
    assert_eq!(args.command, Command::Help);
}

// ============================================================================
// Command tests
// ============================================================================

fn scenario(yaml: &str) -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scenario.yaml");
    std::fs::write(&path, yaml).unwrap();
    (dir, path)
}

#[test]
fn test_run_scenario_for_duration() {
    let (_dir, path) = scenario("name: swing\ndemo:\n  kind: pendulum\n");
    let options = RunOptions {
        duration: 1.0,
        ..RunOptions::new(&path)
    };
    let outcome = run_scenario(&options).unwrap();

    assert_eq!(outcome.scenario, "swing");
    assert_eq!(outcome.demo, "pendulum");
    assert_eq!(outcome.frames, 60);
    assert_eq!(outcome.substeps, 240);
    assert!((outcome.time - 1.0).abs() < 1e-9);
    assert!(outcome.terminal.is_none());
    assert!(outcome.history.is_none());
}

#[test]
fn test_run_scenario_stops_at_terminal() {
    let (_dir, path) = scenario(
        "demo:\n  kind: kinematics\n  params:\n    track_length: 1.0\n",
    );
    let options = RunOptions {
        duration: 10.0,
        history: true,
        ..RunOptions::new(&path)
    };
    let outcome = run_scenario(&options).unwrap();

    assert_eq!(outcome.terminal, Some(Terminal::TrackEnd));
    assert!(outcome.frames < 600);
    assert!(outcome.history.is_some());
    print_outcome(&outcome).unwrap();
}

#[test]
fn test_run_scenario_missing_file() {
    let options = RunOptions::new("/nonexistent/scenario.yaml");
    assert!(run_scenario(&options).is_err());
}

#[test]
fn test_run_scenario_invalid_config() {
    let (_dir, path) = scenario("demo:\n  kind: disk\n  params:\n    mass: 0.0\n");
    assert!(run_scenario(&RunOptions::new(&path)).is_err());
}
