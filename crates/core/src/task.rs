// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task identifier and the primary [`Task`] entity.

use crate::batch::BatchId;
use crate::state::TaskState;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::path::PathBuf;

/// Opaque, stable textual task identifier.
///
/// Unlike the supervisor-minted IDs in [`crate::id`], task IDs are assigned
/// by the backlog file and are never generated here. A dotted suffix
/// (`parent.N`) indicates a subtask/parent relation (spec.md §3); the core
/// treats the format as opaque beyond recognizing that one convention.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(SmolStr);

impl TaskId {
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(SmolStr::new(id.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Splits a dotted-suffix ID into `(parent, index)`, e.g. `t400.2` ->
    /// `Some(("t400", 2))`. Returns `None` for IDs with no numeric dotted
    /// suffix (i.e. top-level tasks).
    pub fn parent_and_index(&self) -> Option<(&str, u32)> {
        let (parent, suffix) = self.0.rsplit_once('.')?;
        let index: u32 = suffix.parse().ok()?;
        Some((parent, index))
    }

    /// The parent task ID, if this is a dotted subtask.
    pub fn parent(&self) -> Option<TaskId> {
        self.parent_and_index().map(|(p, _)| TaskId::new(p))
    }

    /// True if this ID is a dotted-suffix subtask of some parent.
    pub fn is_subtask(&self) -> bool {
        self.parent_and_index().is_some()
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for TaskId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for TaskId {
    fn from(s: String) -> Self {
        Self(SmolStr::new(s))
    }
}

impl AsRef<str> for TaskId {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl std::borrow::Borrow<str> for TaskId {
    fn borrow(&self) -> &str {
        self.0.as_str()
    }
}

/// Requested or resolved model tier (spec.md §4.3 model resolution cascade).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelTier {
    Haiku,
    Sonnet,
    Opus,
}

impl ModelTier {
    /// The next tier in the escalation chain `haiku -> sonnet -> opus`,
    /// or `None` if already at the top (spec.md §4.5.2).
    pub fn escalate(self) -> Option<ModelTier> {
        match self {
            ModelTier::Haiku => Some(ModelTier::Sonnet),
            ModelTier::Sonnet => Some(ModelTier::Opus),
            ModelTier::Opus => None,
        }
    }

    /// The previous (cheaper) tier, used by cost-efficiency downgrades.
    pub fn downgrade(self) -> Option<ModelTier> {
        match self {
            ModelTier::Haiku => None,
            ModelTier::Sonnet => Some(ModelTier::Haiku),
            ModelTier::Opus => Some(ModelTier::Sonnet),
        }
    }
}

crate::simple_display! {
    ModelTier {
        Haiku => "haiku",
        Sonnet => "sonnet",
        Opus => "opus",
    }
}

impl std::str::FromStr for ModelTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "haiku" => Ok(ModelTier::Haiku),
            "sonnet" => Ok(ModelTier::Sonnet),
            "opus" => Ok(ModelTier::Opus),
            other => Err(format!("unknown model tier: {other}")),
        }
    }
}

/// Synthetic PR-URL sentinels that the `complete -> deployed` guard must
/// treat as "not a real PR" (spec.md §4.2 guard, §9 open question (b)).
pub const PR_SENTINEL_NONE: &str = "no_pr";
pub const PR_SENTINEL_TASK_ONLY: &str = "task_only";
pub const PR_SENTINEL_VERIFIED_COMPLETE: &str = "verified_complete";

/// Returns true if `pr_url` is a real upstream PR URL rather than one of the
/// synthetic sentinel values above.
pub fn is_real_pr_url(pr_url: &str) -> bool {
    !matches!(
        pr_url,
        PR_SENTINEL_NONE | PR_SENTINEL_TASK_ONLY | PR_SENTINEL_VERIFIED_COMPLETE
    )
}

/// The primary task entity (spec.md §3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub repo: PathBuf,
    pub description: String,
    pub status: TaskState,

    pub requested_tier: Option<ModelTier>,
    pub resolved_model: Option<String>,

    pub retries: u32,
    pub max_retries: u32,
    pub escalation_depth: u32,
    pub max_escalation: u32,

    pub session_handle: Option<String>,
    pub worktree_path: Option<PathBuf>,
    pub branch: Option<String>,
    pub log_path: Option<PathBuf>,
    pub pr_url: Option<String>,
    pub issue_url: Option<String>,

    /// Non-null iff this task exists to diagnose another task's failure
    /// (spec.md §3 invariant (c), §4.5.3).
    pub diagnostic_of: Option<TaskId>,

    pub last_failure_at: Option<i64>,
    pub consecutive_failure_count: u32,
    pub prompt_repeat_done: bool,
    pub pre_dispatch_main_sha: Option<String>,

    pub created_at: i64,
    pub started_at: Option<i64>,
    pub evaluating_started_at: Option<i64>,
    pub completed_at: Option<i64>,
    pub evaluation_duration_ms: Option<i64>,

    pub batch_id: Option<BatchId>,
    pub tags: Vec<String>,
    pub blocked_by: Vec<TaskId>,

    /// Normalized error key (prefix before first colon) of the most recent
    /// failure, used by the dedup guard (spec.md §4.7).
    pub error_key: Option<String>,
}

impl Task {
    /// True if `status` is one of the terminal states subtask ordering
    /// (spec.md §3 invariant (e), §8) treats as "done enough to unblock a
    /// later sibling".
    pub fn is_terminal_for_subtask_ordering(&self) -> bool {
        matches!(
            self.status,
            TaskState::Verified
                | TaskState::Cancelled
                | TaskState::Deployed
                | TaskState::Complete
                | TaskState::Failed
                | TaskState::Blocked
        )
    }

    pub fn retries_remaining(&self) -> bool {
        self.retries < self.max_retries
    }

    pub fn escalation_remaining(&self) -> bool {
        self.escalation_depth < self.max_escalation
    }

    /// True if this task carries a real (non-sentinel) PR URL.
    pub fn has_real_pr(&self) -> bool {
        self.pr_url.as_deref().is_some_and(is_real_pr_url)
    }
}

#[cfg(any(test, feature = "test-support"))]
impl Task {
    /// Minimal builder for tests: a freshly-queued task with sane defaults.
    pub fn test_queued(id: &str, repo: impl Into<PathBuf>) -> Self {
        Task {
            id: TaskId::new(id),
            repo: repo.into(),
            description: format!("test task {id}"),
            status: TaskState::Queued,
            requested_tier: None,
            resolved_model: None,
            retries: 0,
            max_retries: 3,
            escalation_depth: 0,
            max_escalation: 2,
            session_handle: None,
            worktree_path: None,
            branch: None,
            log_path: None,
            pr_url: None,
            issue_url: None,
            diagnostic_of: None,
            last_failure_at: None,
            consecutive_failure_count: 0,
            prompt_repeat_done: false,
            pre_dispatch_main_sha: None,
            created_at: 0,
            started_at: None,
            evaluating_started_at: None,
            completed_at: None,
            evaluation_duration_ms: None,
            batch_id: None,
            tags: Vec::new(),
            blocked_by: Vec::new(),
            error_key: None,
        }
    }
}

#[cfg(test)]
#[path = "task_tests.rs"]
mod tests;
