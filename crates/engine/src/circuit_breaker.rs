// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! File-backed circuit breaker (spec.md §4.8): the global kill-switch
//! tripped by consecutive task failures, persisted to
//! [`sv_core::env::Paths::circuit_breaker_file`] rather than the database
//! so it survives a failed schema migration. Tripping and resetting are
//! additionally announced via an external tracking issue.

use sv_adapters::forge::{ForgeCli, IssueRef};
use sv_core::circuit::CircuitBreakerState;
use std::path::{Path, PathBuf};
use std::time::Duration;

const TRACKING_ISSUE_LABEL: &str = "circuit-breaker";

#[derive(Debug, thiserror::Error)]
pub enum CircuitBreakerError {
    #[error("reading circuit breaker state at {path}: {source}")]
    Read { path: PathBuf, source: std::io::Error },
    #[error("writing circuit breaker state at {path}: {source}")]
    Write { path: PathBuf, source: std::io::Error },
    #[error("parsing circuit breaker state at {path}: {source}")]
    Parse { path: PathBuf, source: serde_json::Error },
}

/// Load the circuit-breaker state from disk, defaulting to untripped/zero
/// if the file doesn't exist yet (first run, or a fresh supervisor dir).
pub fn load(path: &Path) -> Result<CircuitBreakerState, CircuitBreakerError> {
    match std::fs::read_to_string(path) {
        Ok(raw) => serde_json::from_str(&raw)
            .map_err(|source| CircuitBreakerError::Parse { path: path.to_path_buf(), source }),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(CircuitBreakerState::default()),
        Err(source) => Err(CircuitBreakerError::Read { path: path.to_path_buf(), source }),
    }
}

/// Persist the state atomically: write to a sibling temp file, then rename
/// over the live path (same discipline as `sv_storage::backup::restore_latest`).
pub fn save(path: &Path, state: CircuitBreakerState) -> Result<(), CircuitBreakerError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|source| CircuitBreakerError::Write { path: path.to_path_buf(), source })?;
    }
    let tmp = path.with_extension("json.tmp");
    let body = serde_json::to_string_pretty(&state).expect("CircuitBreakerState always serializes");
    std::fs::write(&tmp, body)
        .map_err(|source| CircuitBreakerError::Write { path: path.to_path_buf(), source })?;
    std::fs::rename(&tmp, path)
        .map_err(|source| CircuitBreakerError::Write { path: path.to_path_buf(), source })?;
    Ok(())
}

/// Whether dispatch should proceed, read fresh from disk.
pub fn check(path: &Path, now_ms: i64) -> Result<bool, CircuitBreakerError> {
    Ok(!load(path)?.is_tripped(now_ms))
}

/// Record a task failure. Returns the new state; the caller announces a
/// trip transition (untripped -> tripped) via [`announce_trip`].
pub fn record_failure(
    path: &Path,
    now_ms: i64,
    threshold: u32,
    cooldown: Duration,
) -> Result<CircuitBreakerState, CircuitBreakerError> {
    let before = load(path)?;
    let after = before.record_failure(now_ms, threshold, cooldown.as_millis() as i64);
    save(path, after)?;
    Ok(after)
}

/// Clear the breaker on the first successful task completion, or when the
/// cooldown elapses (spec.md §4.8 "auto-resets ... or on the first
/// successful task completion").
pub fn reset(path: &Path) -> Result<(), CircuitBreakerError> {
    save(path, CircuitBreakerState::default())
}

/// Auto-reset the state if its cooldown has elapsed, a no-op otherwise.
/// Returns the state a caller should act on next.
pub fn auto_reset_if_elapsed(
    path: &Path,
    now_ms: i64,
) -> Result<CircuitBreakerState, CircuitBreakerError> {
    let state = load(path)?;
    if state.is_tripped(now_ms) || !state.cooldown_elapsed(now_ms) {
        return Ok(state);
    }
    let reset_state = state.reset();
    save(path, reset_state)?;
    Ok(reset_state)
}

/// Open (or leave open) an external tracking issue for a freshly-tripped
/// breaker. Best-effort: forge failures are logged, never propagated
/// (spec.md §4.8, §7 "Notification is best-effort").
pub async fn announce_trip(forge: &dyn ForgeCli, repo: &Path, threshold: u32) {
    let existing = forge.list_issues_by_label(repo, TRACKING_ISSUE_LABEL).await;
    if existing.known().is_some_and(|issues: Vec<IssueRef>| !issues.is_empty()) {
        return;
    }
    let outcome = forge
        .create_issue(
            repo,
            "Circuit breaker tripped",
            &format!(
                "{threshold} consecutive task failures tripped the circuit breaker. Dispatch is paused until cooldown elapses or a human intervenes."
            ),
            &[TRACKING_ISSUE_LABEL.to_string()],
        )
        .await;
    if outcome.known().is_none() {
        tracing::warn!("failed to open circuit-breaker tracking issue");
    }
}

/// Close the external tracking issue once the breaker resets.
pub async fn announce_reset(forge: &dyn ForgeCli, repo: &Path) {
    let existing = forge.list_issues_by_label(repo, TRACKING_ISSUE_LABEL).await;
    let Some(issues) = existing.known() else {
        return;
    };
    for issue in issues {
        let _ = forge.close_issue(repo, issue.number, Some("circuit breaker reset")).await;
    }
}

#[cfg(test)]
#[path = "circuit_breaker_tests.rs"]
mod tests;
