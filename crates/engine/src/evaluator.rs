// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker outcome classification (spec.md §4.4): parse the log file's
//! sentinels, combine with PR/diff state, and classify into a discrete
//! [`OutcomeKind`]. Parsing and classification are pure functions; the
//! only I/O is reading the log file and asking the forge CLI for PR state.

use sv_adapters::forge::{ForgeCli, PrState};
use sv_core::outcome::OutcomeKind;
use std::path::Path;

const TRIVIAL_LOG_BYTES: usize = 2 * 1024;

/// Sentinels and tail content pulled from a worker's log file (spec.md §4.4,
/// §6 "Worker lifecycle (file-based protocol)").
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogSentinels {
    pub wrapper_started: bool,
    pub worker_started: bool,
    pub full_loop_complete: bool,
    pub exit_code: Option<i32>,
    pub pr_url: Option<String>,
    pub size_bytes: usize,
    /// Lowercased tail (last ~4 KiB), used for quota/auth/rate-limit pattern
    /// matching so a multi-megabyte log doesn't get scanned in full.
    pub tail: String,
}

/// Scan a raw log file's contents for the sentinels the evaluator classifies
/// on. Independent of how the log was obtained — safe to unit test on a
/// literal string.
pub fn parse_log(raw: &str) -> LogSentinels {
    let mut sentinels = LogSentinels { size_bytes: raw.len(), ..Default::default() };
    for line in raw.lines() {
        if line.starts_with("WRAPPER_STARTED") {
            sentinels.wrapper_started = true;
        } else if line.starts_with("WORKER_STARTED") {
            sentinels.worker_started = true;
        } else if line.starts_with("FULL_LOOP_COMPLETE") {
            sentinels.full_loop_complete = true;
        } else if let Some(code) = line.strip_prefix("EXIT:") {
            sentinels.exit_code = code.trim().parse().ok();
        } else if let Some(url) = line.strip_prefix("PR_URL:") {
            sentinels.pr_url = Some(url.trim().to_string());
        }
    }
    const TAIL_BYTES: usize = 4 * 1024;
    let tail_start = raw.len().saturating_sub(TAIL_BYTES);
    sentinels.tail = raw[tail_start..].to_lowercase();
    sentinels
}

/// A pattern (key, needle) searched for in the log tail, in priority order,
/// for the failure kinds spec.md §4.4 names as tail-scanned.
const TAIL_PATTERNS: &[(OutcomeKind, &[&str])] = &[
    (OutcomeKind::AuthError, &["invalid api key", "authentication failed", "401 unauthorized", "key is invalid"]),
    (OutcomeKind::QuotaError, &["credits exhausted", "quota exceeded", "insufficient credits", "billing"]),
    (OutcomeKind::RateLimited, &["rate limit", "429 too many requests", "overloaded_error"]),
];

/// All facts the classifier needs (spec.md §4.4 disambiguation rules, first
/// match wins).
#[derive(Debug, Clone)]
pub struct EvaluationFacts {
    pub sentinels: LogSentinels,
    /// `None` if no PR URL was ever recorded, or the forge call was
    /// best-effort-unknown.
    pub pr_state: Option<PrState>,
    pub worktree_has_changes: bool,
    pub hang_detected: bool,
}

pub fn classify_outcome(facts: &EvaluationFacts) -> OutcomeKind {
    let s = &facts.sentinels;

    if !s.wrapper_started {
        return OutcomeKind::WorkerNeverStarted;
    }
    if !s.worker_started {
        return OutcomeKind::WorkerDispatchError;
    }
    if s.full_loop_complete {
        if facts.pr_state.as_ref().is_some_and(|pr| pr.merged) {
            return OutcomeKind::Complete;
        }
        if s.pr_url.is_none() && !facts.worktree_has_changes {
            return OutcomeKind::CompleteNoPr;
        }
        return OutcomeKind::WorkInProgress;
    }
    if facts.hang_detected {
        return OutcomeKind::Timeout;
    }
    for (kind, needles) in TAIL_PATTERNS {
        if needles.iter().any(|needle| s.tail.contains(needle)) {
            return *kind;
        }
    }
    if s.exit_code == Some(0) {
        return OutcomeKind::CleanExitNoSignal;
    }
    if s.size_bytes < TRIVIAL_LOG_BYTES {
        return OutcomeKind::TrivialOutput;
    }
    OutcomeKind::WorkInProgress
}

/// Read the log file and resolve PR state (if recorded), then classify.
/// Best-effort: a forge timeout/failure degrades `pr_state` to `None` rather
/// than failing the evaluation (spec.md §6 "best-effort").
pub async fn evaluate(
    log_path: &Path,
    repo: &Path,
    worktree_has_changes: bool,
    hang_detected: bool,
    forge: &dyn ForgeCli,
) -> std::io::Result<(OutcomeKind, LogSentinels)> {
    let raw = tokio::fs::read_to_string(log_path).await.unwrap_or_default();
    let sentinels = parse_log(&raw);
    let pr_state = match &sentinels.pr_url {
        Some(url) => forge.pr_state(repo, url).await.known(),
        None => None,
    };
    let facts = EvaluationFacts { sentinels: sentinels.clone(), pr_state, worktree_has_changes, hang_detected };
    Ok((classify_outcome(&facts), sentinels))
}

/// Per-file quality-gate check result (spec.md §4.4 "quality gate").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualityGateInput {
    pub changed_files: u32,
    pub insertions_plus_deletions: u32,
    pub log_has_panic_marker: bool,
    pub shell_script_syntax_ok: bool,
    pub log_size_bytes: usize,
    /// Non-whitespace, non-boilerplate line count in the log, used for the
    /// minimum substance ratio on large logs.
    pub substantive_lines: usize,
    pub total_lines: usize,
}

const LARGE_LOG_BYTES: usize = 64 * 1024;
const MIN_SUBSTANCE_RATIO: f64 = 0.05;

/// True if a `complete`-classified worker's diff/log passes the quality
/// gate; `false` means the task should be upgraded to "needs escalation"
/// (spec.md §4.4).
pub fn passes_quality_gate(input: &QualityGateInput) -> bool {
    if input.changed_files == 0 || input.insertions_plus_deletions == 0 {
        return false;
    }
    if input.log_has_panic_marker {
        return false;
    }
    if !input.shell_script_syntax_ok {
        return false;
    }
    if input.log_size_bytes > LARGE_LOG_BYTES && input.total_lines > 0 {
        let ratio = input.substantive_lines as f64 / input.total_lines as f64;
        if ratio < MIN_SUBSTANCE_RATIO {
            return false;
        }
    }
    true
}

#[cfg(test)]
#[path = "evaluator_tests.rs"]
mod tests;
