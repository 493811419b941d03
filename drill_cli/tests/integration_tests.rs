//! Integration tests for the fretdrill binary.
//!
//! These tests verify end-to-end behavior including:
//! - Queue editing and persistence
//! - Metronome settings
//! - Simulated playback of a whole practice queue

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Helper to create a test data directory
fn setup_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// Helper to get the path to the CLI binary
fn cli() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("fretdrill"))
}

/// Run a command against an isolated data directory
fn run_in(data_dir: &Path, args: &[&str]) -> assert_cmd::assert::Assert {
    cli().args(args).arg("--data-dir").arg(data_dir).assert()
}

#[test]
fn test_cli_help() {
    cli()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Guitar practice trainer"));
}

#[test]
fn test_empty_queue_listing() {
    let temp_dir = setup_test_dir();

    run_in(temp_dir.path(), &["queue"])
        .success()
        .stdout(predicate::str::contains("Practice queue is empty"));
}

#[test]
fn test_add_persists_queue() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    run_in(data_dir, &["add", "from-to", "--from", "C", "--to", "G,Am"])
        .success()
        .stdout(predicate::str::contains("Added: Chord Changes From C to G,Am"));

    run_in(data_dir, &["add", "spider", "--pattern", "woven", "--seconds", "90"])
        .success();

    run_in(data_dir, &["queue"])
        .success()
        .stdout(predicate::str::contains("Practice Queue (Total: 3 minutes)"))
        .stdout(predicate::str::contains("1. Chord Changes From C to G,Am (1min)"))
        .stdout(predicate::str::contains("2. Spider Walk Woven (90s)"));

    // Durable tier holds the queue
    let stored = fs::read_to_string(data_dir.join("exercise_list.json"))
        .expect("Queue file should exist");
    let envelope: serde_json::Value = serde_json::from_str(&stored).unwrap();
    assert_eq!(envelope["value"].as_array().unwrap().len(), 2);
    assert_eq!(envelope["value"][0]["kind"], "chord_from_to");
}

#[test]
fn test_invalid_exercises_rejected() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    // Too few chords for random changes
    run_in(data_dir, &["add", "random", "--chords", "A,C"])
        .failure()
        .stderr(predicate::str::contains("at least 4 chords"));

    // Unknown chord
    run_in(data_dir, &["add", "from-to", "--from", "C", "--to", "H"])
        .failure()
        .stderr(predicate::str::contains("Unknown chord"));

    // Up strum on a down slot
    run_in(data_dir, &["add", "strum", "--pattern", "UUUUUUUU", "--chords", "C"])
        .failure();

    run_in(data_dir, &["add", "spider", "--pattern", "nope"])
        .failure()
        .stderr(predicate::str::contains("Unknown spider pattern"));

    run_in(data_dir, &["queue"])
        .success()
        .stdout(predicate::str::contains("Practice queue is empty"));
}

#[test]
fn test_remove_and_clear() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    run_in(data_dir, &["add", "from-to", "--from", "C", "--to", "G"]).success();
    run_in(data_dir, &["add", "random", "--chords", "A,C,D,E"]).success();

    run_in(data_dir, &["remove", "1"])
        .success()
        .stdout(predicate::str::contains("Removed: Chord Changes From C to G"));

    run_in(data_dir, &["queue"])
        .success()
        .stdout(predicate::str::contains("1. Chord Changes Random to A,C,D,E"));

    run_in(data_dir, &["remove", "5"])
        .failure()
        .stderr(predicate::str::contains("No exercise at position 5"));

    run_in(data_dir, &["clear"]).success();
    run_in(data_dir, &["queue"])
        .success()
        .stdout(predicate::str::contains("Practice queue is empty"));
}

#[test]
fn test_metronome_settings_persist() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    run_in(data_dir, &["metronome", "--bpm", "72", "--sound", "true"])
        .success()
        .stdout(predicate::str::contains("Metronome settings saved"));

    run_in(data_dir, &["metronome"])
        .success()
        .stdout(predicate::str::contains("Tempo: 72 bpm"))
        .stdout(predicate::str::contains("Sound: on"));

    // Out of range values are clamped
    run_in(data_dir, &["metronome", "--bpm", "500"])
        .success()
        .stdout(predicate::str::contains("Tempo: 200 bpm"));
}

#[test]
fn test_run_with_empty_queue_fails() {
    let temp_dir = setup_test_dir();

    run_in(temp_dir.path(), &["run", "--simulate"])
        .failure()
        .stderr(predicate::str::contains("Practice queue is empty"))
        .stdout(predicate::str::contains("Get ready").not());
}

#[test]
fn test_simulated_run_completes() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    run_in(data_dir, &["add", "from-to", "--from", "C", "--to", "G", "--seconds", "2"])
        .success();
    run_in(data_dir, &["add", "spider", "--pattern", "Triangle", "--seconds", "3"])
        .success();

    run_in(data_dir, &["run", "--simulate", "--seed", "7"])
        .success()
        .stdout(predicate::str::contains("[1] Get ready: Chord Changes From C to G (2s)"))
        .stdout(predicate::str::contains("[1] Go: Chord Changes From C to G"))
        .stdout(predicate::str::contains("[1] Done"))
        .stdout(predicate::str::contains("[2] Go: Spider Walk Triangle"))
        .stdout(predicate::str::contains("[2] Done"))
        .stdout(predicate::str::contains("Workout complete!"));
}

#[test]
fn test_strumming_restores_tempo_after_run() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    run_in(data_dir, &["metronome", "--bpm", "70"]).success();
    run_in(
        data_dir,
        &["add", "strum", "--pattern", "D-DU-UDU", "--chords", "C,G", "--seconds", "2"],
    )
    .success();

    run_in(data_dir, &["run", "--simulate", "--seed", "1"])
        .success()
        .stdout(predicate::str::contains("Workout complete!"));

    run_in(data_dir, &["metronome"])
        .success()
        .stdout(predicate::str::contains("Tempo: 70 bpm"));
    assert!(!data_dir.join("runtime/tempo_override.json").exists());
}
