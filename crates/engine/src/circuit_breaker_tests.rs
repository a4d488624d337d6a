// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use sv_adapters::forge::fake::FakeForgeCli;
use std::path::Path;
use tempfile::tempdir;

#[test]
fn load_defaults_when_file_absent() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("circuit_breaker.json");
    let state = load(&path).expect("load");
    assert_eq!(state, CircuitBreakerState::default());
}

#[test]
fn save_then_load_round_trips() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("circuit_breaker.json");
    let state = CircuitBreakerState::default().record_failure(1_000, 3, 1_800_000);
    save(&path, state).expect("save");
    assert_eq!(load(&path).expect("load"), state);
}

#[test]
fn record_failure_trips_at_threshold_and_persists() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("circuit_breaker.json");
    record_failure(&path, 1_000, 3, Duration::from_secs(1800)).expect("1");
    record_failure(&path, 1_001, 3, Duration::from_secs(1800)).expect("2");
    let state = record_failure(&path, 1_002, 3, Duration::from_secs(1800)).expect("3");
    assert!(state.is_tripped(1_002));
    assert!(!check(&path, 1_002).expect("check"));
}

#[test]
fn reset_clears_state_on_disk() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("circuit_breaker.json");
    record_failure(&path, 1_000, 1, Duration::from_secs(1800)).expect("trip");
    reset(&path).expect("reset");
    assert!(check(&path, 1_000).expect("check"));
}

#[test]
fn auto_reset_if_elapsed_clears_after_cooldown() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("circuit_breaker.json");
    record_failure(&path, 1_000, 1, Duration::from_secs(1)).expect("trip");
    let still_tripped = auto_reset_if_elapsed(&path, 1_000).expect("no-op");
    assert!(still_tripped.is_tripped(1_000));
    let reset_state = auto_reset_if_elapsed(&path, 10_000).expect("elapsed");
    assert!(!reset_state.is_tripped(10_000));
}

#[tokio::test]
async fn announce_trip_opens_an_issue_when_none_exists() {
    let forge = FakeForgeCli::new();
    announce_trip(&forge, Path::new("/repo"), 3).await;
    let outcome = forge.list_issues_by_label(Path::new("/repo"), "circuit-breaker").await;
    assert!(outcome.known().is_some());
}

#[tokio::test]
async fn announce_reset_closes_existing_issues() {
    let forge = FakeForgeCli::new();
    forge.set_issues(vec![sv_adapters::forge::IssueRef {
        number: 7,
        title: "Circuit breaker tripped".to_string(),
        labels: vec!["circuit-breaker".to_string()],
    }]);
    announce_reset(&forge, Path::new("/repo")).await;
    assert_eq!(forge.closed_issues(), vec![7]);
}
