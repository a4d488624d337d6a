// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn dotted_id_splits_into_parent_and_index() {
    let id = TaskId::new("t400.2");
    assert_eq!(id.parent_and_index(), Some(("t400", 2)));
    assert_eq!(id.parent(), Some(TaskId::new("t400")));
    assert!(id.is_subtask());
}

#[test]
fn top_level_id_has_no_parent() {
    let id = TaskId::new("t100");
    assert_eq!(id.parent_and_index(), None);
    assert!(!id.is_subtask());
}

#[test]
fn nested_dotted_suffix_splits_on_last_dot() {
    // `parent.1.2` is treated as subtask "2" of parent id "parent.1".
    let id = TaskId::new("t1.1.2");
    assert_eq!(id.parent_and_index(), Some(("t1.1", 2)));
}

#[test]
fn model_tier_escalation_chain() {
    assert_eq!(ModelTier::Haiku.escalate(), Some(ModelTier::Sonnet));
    assert_eq!(ModelTier::Sonnet.escalate(), Some(ModelTier::Opus));
    assert_eq!(ModelTier::Opus.escalate(), None);
}

#[test]
fn model_tier_downgrade_chain() {
    assert_eq!(ModelTier::Opus.downgrade(), Some(ModelTier::Sonnet));
    assert_eq!(ModelTier::Sonnet.downgrade(), Some(ModelTier::Haiku));
    assert_eq!(ModelTier::Haiku.downgrade(), None);
}

#[test]
fn model_tier_parses_case_insensitively() {
    assert_eq!("OPUS".parse::<ModelTier>().unwrap(), ModelTier::Opus);
    assert!("gpt5".parse::<ModelTier>().is_err());
}

#[test]
fn sentinel_pr_urls_are_not_real() {
    assert!(!is_real_pr_url(PR_SENTINEL_NONE));
    assert!(!is_real_pr_url(PR_SENTINEL_TASK_ONLY));
    assert!(!is_real_pr_url(PR_SENTINEL_VERIFIED_COMPLETE));
    assert!(is_real_pr_url("https://github.com/acme/repo/pull/42"));
}

#[test]
fn has_real_pr_reflects_sentinel_check() {
    let mut task = Task::test_queued("t1", "/repo");
    assert!(!task.has_real_pr());
    task.pr_url = Some(PR_SENTINEL_NONE.to_string());
    assert!(!task.has_real_pr());
    task.pr_url = Some("https://github.com/acme/repo/pull/1".to_string());
    assert!(task.has_real_pr());
}

#[test]
fn retries_and_escalation_remaining() {
    let mut task = Task::test_queued("t1", "/repo");
    task.retries = 2;
    task.max_retries = 3;
    assert!(task.retries_remaining());
    task.retries = 3;
    assert!(!task.retries_remaining());

    task.escalation_depth = 1;
    task.max_escalation = 2;
    assert!(task.escalation_remaining());
    task.escalation_depth = 2;
    assert!(!task.escalation_remaining());
}
