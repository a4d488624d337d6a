// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task row mapping and CRUD (spec.md §3 Task, §4.1 Store).

use crate::error::StorageError;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::PathBuf;
use std::str::FromStr;
use sv_core::batch::BatchId;
use sv_core::records::ProofLogEntry;
use sv_core::state::{check_deployed_guard, validate_transition, TaskState};
use sv_core::task::{ModelTier, Task, TaskId};

pub fn insert_task(conn: &Connection, task: &Task) -> Result<(), StorageError> {
    conn.execute(
        "INSERT INTO tasks (
            id, repo, description, status, requested_tier, resolved_model,
            retries, max_retries, escalation_depth, max_escalation,
            session_handle, worktree_path, branch, log_path, pr_url, issue_url,
            diagnostic_of, last_failure_at, consecutive_failure_count,
            prompt_repeat_done, pre_dispatch_main_sha, created_at, started_at,
            evaluating_started_at, completed_at, evaluation_duration_ms,
            batch_id, tags, blocked_by, error_key
        ) VALUES (
            ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15,
            ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25, ?26, ?27, ?28, ?29, ?30
        )",
        params![
            task.id.as_str(),
            task.repo.to_string_lossy(),
            task.description,
            task.status.to_string(),
            task.requested_tier.map(|t| t.to_string()),
            task.resolved_model,
            task.retries,
            task.max_retries,
            task.escalation_depth,
            task.max_escalation,
            task.session_handle,
            task.worktree_path.as_ref().map(|p| p.to_string_lossy().to_string()),
            task.branch,
            task.log_path.as_ref().map(|p| p.to_string_lossy().to_string()),
            task.pr_url,
            task.issue_url,
            task.diagnostic_of.as_ref().map(|id| id.as_str().to_string()),
            task.last_failure_at,
            task.consecutive_failure_count,
            task.prompt_repeat_done,
            task.pre_dispatch_main_sha,
            task.created_at,
            task.started_at,
            task.evaluating_started_at,
            task.completed_at,
            task.evaluation_duration_ms,
            task.batch_id.as_ref().map(|id| id.as_str().to_string()),
            serde_json::to_string(&task.tags)?,
            serde_json::to_string(&task.blocked_by)?,
            task.error_key,
        ],
    )?;
    Ok(())
}

pub fn get_task(conn: &Connection, id: &TaskId) -> Result<Option<Task>, StorageError> {
    conn.query_row("SELECT * FROM tasks WHERE id = ?1", params![id.as_str()], row_to_task)
        .optional()
        .map_err(StorageError::from)
}

pub fn require_task(conn: &Connection, id: &TaskId) -> Result<Task, StorageError> {
    get_task(conn, id)?.ok_or_else(|| StorageError::TaskNotFound(id.as_str().to_string()))
}

pub fn list_tasks(conn: &Connection, status: Option<TaskState>) -> Result<Vec<Task>, StorageError> {
    let mut stmt = match status {
        Some(_) => conn.prepare("SELECT * FROM tasks WHERE status = ?1 ORDER BY created_at ASC")?,
        None => conn.prepare("SELECT * FROM tasks ORDER BY created_at ASC")?,
    };
    let rows = match status {
        Some(s) => stmt.query_map(params![s.to_string()], row_to_task)?,
        None => stmt.query_map([], row_to_task)?,
    };
    rows.collect::<Result<Vec<_>, _>>().map_err(StorageError::from)
}

pub fn list_tasks_for_batch(conn: &Connection, batch_id: &BatchId) -> Result<Vec<Task>, StorageError> {
    let mut stmt = conn.prepare("SELECT * FROM tasks WHERE batch_id = ?1 ORDER BY created_at ASC")?;
    let rows = stmt.query_map(params![batch_id.as_str()], row_to_task)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(StorageError::from)
}

pub fn list_subtasks(conn: &Connection, parent: &TaskId) -> Result<Vec<Task>, StorageError> {
    let mut stmt = conn.prepare("SELECT * FROM tasks WHERE id LIKE ?1 || '.%' ORDER BY id ASC")?;
    let rows = stmt.query_map(params![parent.as_str()], row_to_task)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(StorageError::from)
}

/// Edges on the "happy" pipeline chain past `complete` (spec.md §4.2): each
/// one gets a `proof_log` row carrying the wall-clock duration since the
/// previous stage transition for that task, in addition to the state-log
/// row every transition gets.
const PIPELINE_EDGES: &[(TaskState, TaskState)] = &[
    (TaskState::Dispatched, TaskState::Running),
    (TaskState::Running, TaskState::Evaluating),
    (TaskState::Evaluating, TaskState::Complete),
    (TaskState::Complete, TaskState::PrReview),
    (TaskState::PrReview, TaskState::ReviewTriage),
    (TaskState::ReviewTriage, TaskState::Merging),
    (TaskState::Merging, TaskState::Merged),
    (TaskState::Merged, TaskState::Deploying),
    (TaskState::Deploying, TaskState::Deployed),
    (TaskState::Deployed, TaskState::Verifying),
    (TaskState::Verifying, TaskState::Verified),
];

/// Validate and persist a state transition, appending a state-log row in
/// the same call (spec.md §4.2). Guard predicates that need external facts
/// this module doesn't otherwise have (upstream PR merge state) are
/// supplied by the caller via `upstream_pr_merged`; pass `None` for any
/// transition not headed to `deployed`.
pub fn transition(
    conn: &Connection,
    id: &TaskId,
    to: TaskState,
    reason: &str,
    at_ms: i64,
    upstream_pr_merged: Option<bool>,
) -> Result<Task, StorageError> {
    let mut task = require_task(conn, id)?;
    validate_transition(task.status, to)?;
    if to == TaskState::Deployed {
        check_deployed_guard(task.pr_url.as_deref(), upstream_pr_merged.unwrap_or(false))?;
    }
    let from = task.status;
    conn.execute(
        "UPDATE tasks SET status = ?1 WHERE id = ?2",
        params![to.to_string(), id.as_str()],
    )?;
    conn.execute(
        "INSERT INTO state_log (task_id, from_state, to_state, reason, at_ms) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![id.as_str(), from.to_string(), to.to_string(), reason, at_ms],
    )?;
    if PIPELINE_EDGES.contains(&(from, to)) {
        let previous_stage_at_ms = crate::logs::proof_log_for_task(conn, id)?.last().map(|p| p.at_ms).unwrap_or(task.created_at);
        crate::logs::append_proof(
            conn,
            &ProofLogEntry {
                task_id: id.clone(),
                event: format!("{from}_to_{to}"),
                stage: to,
                decision: reason.to_string(),
                evidence: format!("state table transition {from} -> {to}"),
                decision_maker: "supervisor".to_string(),
                pr_url: task.pr_url.clone(),
                duration_ms: Some(at_ms.saturating_sub(previous_stage_at_ms)),
                metadata: serde_json::Value::Null,
                at_ms,
            },
        )?;
    }
    task.status = to;
    Ok(task)
}

pub fn update_task(conn: &Connection, task: &Task) -> Result<(), StorageError> {
    conn.execute(
        "UPDATE tasks SET
            status = ?2, requested_tier = ?3, resolved_model = ?4, retries = ?5,
            escalation_depth = ?6, session_handle = ?7, worktree_path = ?8, branch = ?9,
            log_path = ?10, pr_url = ?11, issue_url = ?12, last_failure_at = ?13,
            consecutive_failure_count = ?14, prompt_repeat_done = ?15,
            pre_dispatch_main_sha = ?16, started_at = ?17, evaluating_started_at = ?18,
            completed_at = ?19, evaluation_duration_ms = ?20, batch_id = ?21,
            tags = ?22, blocked_by = ?23, error_key = ?24
         WHERE id = ?1",
        params![
            task.id.as_str(),
            task.status.to_string(),
            task.requested_tier.map(|t| t.to_string()),
            task.resolved_model,
            task.retries,
            task.escalation_depth,
            task.session_handle,
            task.worktree_path.as_ref().map(|p| p.to_string_lossy().to_string()),
            task.branch,
            task.log_path.as_ref().map(|p| p.to_string_lossy().to_string()),
            task.pr_url,
            task.issue_url,
            task.last_failure_at,
            task.consecutive_failure_count,
            task.prompt_repeat_done,
            task.pre_dispatch_main_sha,
            task.started_at,
            task.evaluating_started_at,
            task.completed_at,
            task.evaluation_duration_ms,
            task.batch_id.as_ref().map(|id| id.as_str().to_string()),
            serde_json::to_string(&task.tags)?,
            serde_json::to_string(&task.blocked_by)?,
            task.error_key,
        ],
    )?;
    Ok(())
}

fn row_to_task(row: &Row) -> rusqlite::Result<Task> {
    let tags_json: String = row.get("tags")?;
    let blocked_by_json: String = row.get("blocked_by")?;
    let tags: Vec<String> = serde_json::from_str(&tags_json).unwrap_or_default();
    let blocked_by_raw: Vec<String> = serde_json::from_str(&blocked_by_json).unwrap_or_default();

    let status: String = row.get("status")?;
    let requested_tier: Option<String> = row.get("requested_tier")?;
    let diagnostic_of: Option<String> = row.get("diagnostic_of")?;
    let batch_id: Option<String> = row.get("batch_id")?;
    let repo: String = row.get("repo")?;
    let worktree_path: Option<String> = row.get("worktree_path")?;
    let log_path: Option<String> = row.get("log_path")?;

    Ok(Task {
        id: TaskId::new(row.get::<_, String>("id")?),
        repo: PathBuf::from(repo),
        description: row.get("description")?,
        status: TaskState::from_str(&status)
            .map_err(|e| rusqlite::Error::InvalidColumnType(0, e, rusqlite::types::Type::Text))?,
        requested_tier: requested_tier.and_then(|s| ModelTier::from_str(&s).ok()),
        resolved_model: row.get("resolved_model")?,
        retries: row.get("retries")?,
        max_retries: row.get("max_retries")?,
        escalation_depth: row.get("escalation_depth")?,
        max_escalation: row.get("max_escalation")?,
        session_handle: row.get("session_handle")?,
        worktree_path: worktree_path.map(PathBuf::from),
        branch: row.get("branch")?,
        log_path: log_path.map(PathBuf::from),
        pr_url: row.get("pr_url")?,
        issue_url: row.get("issue_url")?,
        diagnostic_of: diagnostic_of.map(TaskId::new),
        last_failure_at: row.get("last_failure_at")?,
        consecutive_failure_count: row.get("consecutive_failure_count")?,
        prompt_repeat_done: row.get("prompt_repeat_done")?,
        pre_dispatch_main_sha: row.get("pre_dispatch_main_sha")?,
        created_at: row.get("created_at")?,
        started_at: row.get("started_at")?,
        evaluating_started_at: row.get("evaluating_started_at")?,
        completed_at: row.get("completed_at")?,
        evaluation_duration_ms: row.get("evaluation_duration_ms")?,
        batch_id: batch_id.map(BatchId::from_string),
        tags,
        blocked_by: blocked_by_raw.into_iter().map(TaskId::new).collect(),
        error_key: row.get("error_key")?,
    })
}

#[cfg(test)]
#[path = "tasks_tests.rs"]
mod tests;
