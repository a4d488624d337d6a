// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::entry::ClassificationHint;

#[test]
fn parses_the_spec_example_line() {
    let entry = parse_line("- [ ] t100 Update docs #auto-dispatch ~30m model:sonnet").expect("parses");
    assert_eq!(entry.id, "t100");
    assert_eq!(entry.title, "Update docs");
    assert!(entry.auto_dispatch());
    assert_eq!(entry.time_estimate.as_deref(), Some("30m"));
    assert_eq!(entry.model.as_deref(), Some("sonnet"));
    assert!(!entry.checked);
}

#[test]
fn parses_claim_and_dependency_fields() {
    let entry = parse_line(
        "- [ ] t500 Fix flaky test assignee:alice started:2026-07-01T10:00:00Z blocked-by:t400,t410",
    )
    .expect("parses");
    assert_eq!(entry.assignee.as_deref(), Some("alice"));
    assert_eq!(entry.started.as_deref(), Some("2026-07-01T10:00:00Z"));
    assert_eq!(entry.blocked_by, vec!["t400", "t410"]);
    assert!(entry.is_claimed());
}

#[test]
fn parses_pr_ref_and_notes() {
    let entry = parse_line("- [x] t200 Ship release pr:#42 ref:GH#7 — waiting on review").expect("parses");
    assert!(entry.checked);
    assert_eq!(entry.pr.as_deref(), Some("#42"));
    assert_eq!(entry.reference.as_deref(), Some("GH#7"));
    assert_eq!(entry.notes.as_deref(), Some("waiting on review"));
}

#[test]
fn parses_classification_tags() {
    let entry = parse_line("- [ ] t300 Investigate crash #investigation #complex").expect("parses");
    assert_eq!(entry.tags, vec!["investigation", "complex"]);
    assert_eq!(
        entry.classification_hints(),
        vec![ClassificationHint::Investigation, ClassificationHint::Complex]
    );
}

#[test]
fn parses_proposed_marker() {
    let entry = parse_line("- [ ] t600 New feature [proposed:auto-dispatch model:opus]").expect("parses");
    let marker = entry.proposed.expect("marker present");
    assert!(marker.auto_dispatch);
    assert_eq!(marker.model.as_deref(), Some("opus"));
}

#[test]
fn non_task_lines_are_skipped() {
    assert!(parse_line("# Backlog").is_none());
    assert!(parse_line("Some prose about the project.").is_none());
    assert!(parse_line("").is_none());
}

#[test]
fn parse_backlog_extracts_only_task_lines() {
    let text = "# Backlog\n\n- [ ] t1 First task #auto-dispatch\nSome notes here.\n- [x] t2 Second task\n";
    let entries = parse_backlog(text);
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].id, "t1");
    assert_eq!(entries[1].id, "t2");
}
