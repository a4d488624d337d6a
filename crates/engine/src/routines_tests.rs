// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn config() -> RoutineConfig {
    RoutineConfig { min_interval: Duration::from_secs(3600), zero_findings_backoff_threshold: 3, is_cosmetic: true }
}

fn state() -> RoutineState {
    RoutineState { name: "prune-logs".to_string(), ..Default::default() }
}

#[test]
fn runs_when_nothing_blocks_it() {
    let decision = decide(&state(), &config(), &ProjectSignals::default(), 10_000, None);
    assert_eq!(decision, RoutineDecision::Run);
}

#[test]
fn skips_within_cooldown_window() {
    let decision = decide(&state(), &config(), &ProjectSignals::default(), 10_000, Some(9_900));
    assert_eq!(decision, RoutineDecision::SkipCooldown);
}

#[test]
fn runs_once_cooldown_elapses() {
    let decision = decide(&state(), &config(), &ProjectSignals::default(), 10_000_000, Some(0));
    assert_eq!(decision, RoutineDecision::Run);
}

#[test]
fn explicit_deferral_wins_over_everything() {
    let mut s = state();
    s.deferred_until_ms = Some(50_000);
    let decision = decide(&s, &config(), &ProjectSignals::default(), 10_000, None);
    assert_eq!(decision, RoutineDecision::Defer);
}

#[test]
fn cosmetic_routine_defers_under_critical_issues() {
    let signals = ProjectSignals { open_critical_issues: 1, recent_failure_count: 0 };
    let decision = decide(&state(), &config(), &signals, 10_000, None);
    assert_eq!(decision, RoutineDecision::DeferForPriorityWork);
}

#[test]
fn cosmetic_routine_defers_under_heavy_self_heal_activity() {
    let signals = ProjectSignals { open_critical_issues: 0, recent_failure_count: 5 };
    let decision = decide(&state(), &config(), &signals, 10_000, None);
    assert_eq!(decision, RoutineDecision::DeferForPriorityWork);
}

#[test]
fn non_cosmetic_routine_ignores_priority_signals() {
    let mut c = config();
    c.is_cosmetic = false;
    let signals = ProjectSignals { open_critical_issues: 5, recent_failure_count: 5 };
    let decision = decide(&state(), &c, &signals, 10_000, None);
    assert_eq!(decision, RoutineDecision::Run);
}

#[test]
fn record_run_with_findings_resets_streak() {
    let mut s = state();
    s.consecutive_zero_findings = 2;
    let next = record_run(&s, &config(), true, 10_000);
    assert_eq!(next.consecutive_zero_findings, 0);
    assert!(next.deferred_until_ms.is_none());
    assert_eq!(next.run_count, 1);
}

#[test]
fn record_run_without_findings_increments_streak() {
    let next = record_run(&state(), &config(), false, 10_000);
    assert_eq!(next.consecutive_zero_findings, 1);
    assert!(next.deferred_until_ms.is_none());
}

#[test]
fn record_run_backs_off_after_threshold_is_crossed() {
    let mut s = state();
    s.consecutive_zero_findings = 2;
    let next = record_run(&s, &config(), false, 10_000);
    assert_eq!(next.consecutive_zero_findings, 3);
    assert_eq!(next.deferred_until_ms, Some(10_000 + config().min_interval.as_millis() as i64));
}
