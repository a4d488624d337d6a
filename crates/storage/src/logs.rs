// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only audit logs: proof log, action dedup log, stale recovery log
//! (spec.md §3, §4.7, §4.9).

use crate::error::StorageError;
use rusqlite::{params, Connection, Row};
use sv_core::records::{ActionDedupEntry, ActionDedupStatus, ProofLogEntry, StaleRecoveryEntry};
use sv_core::task::TaskId;
use std::str::FromStr;

pub fn append_proof(conn: &Connection, entry: &ProofLogEntry) -> Result<(), StorageError> {
    conn.execute(
        "INSERT INTO proof_log (
            task_id, event, stage, decision, evidence, decision_maker, pr_url,
            duration_ms, metadata, at_ms
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            entry.task_id.as_str(),
            entry.event,
            entry.stage.to_string(),
            entry.decision,
            entry.evidence,
            entry.decision_maker,
            entry.pr_url,
            entry.duration_ms,
            entry.metadata.to_string(),
            entry.at_ms,
        ],
    )?;
    Ok(())
}

pub fn proof_log_for_task(conn: &Connection, task_id: &TaskId) -> Result<Vec<ProofLogEntry>, StorageError> {
    let mut stmt =
        conn.prepare("SELECT * FROM proof_log WHERE task_id = ?1 ORDER BY seq ASC")?;
    let rows = stmt.query_map(params![task_id.as_str()], row_to_proof)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(StorageError::from)
}

fn row_to_proof(row: &Row) -> rusqlite::Result<ProofLogEntry> {
    let stage: String = row.get("stage")?;
    let metadata: String = row.get("metadata")?;
    Ok(ProofLogEntry {
        task_id: TaskId::new(row.get::<_, String>("task_id")?),
        event: row.get("event")?,
        stage: sv_core::state::TaskState::from_str(&stage)
            .map_err(|e| rusqlite::Error::InvalidColumnType(0, e, rusqlite::types::Type::Text))?,
        decision: row.get("decision")?,
        evidence: row.get("evidence")?,
        decision_maker: row.get("decision_maker")?,
        pr_url: row.get("pr_url")?,
        duration_ms: row.get("duration_ms")?,
        metadata: serde_json::from_str(&metadata).unwrap_or(serde_json::Value::Null),
        at_ms: row.get("at_ms")?,
    })
}

/// Record a dedup-log row (spec.md §4.7, §8: the rolling-window action
/// dedup log, distinct from the task-level `consecutive_failure_count`).
pub fn record_action_dedup(conn: &Connection, entry: &ActionDedupEntry) -> Result<(), StorageError> {
    conn.execute(
        "INSERT INTO action_dedup_log (cycle_id, action_type, target, status, state_hash, at_ms)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            entry.cycle_id,
            entry.action_type,
            entry.target,
            entry.status.to_string(),
            entry.state_hash,
            entry.at_ms,
        ],
    )?;
    Ok(())
}

/// True if an identical `(action_type, target, state_hash)` action was
/// already executed within `window_ms` before `now_ms` (spec.md §8: a
/// differing state hash bypasses suppression even inside the window).
pub fn was_recently_executed(
    conn: &Connection,
    action_type: &str,
    target: &str,
    state_hash: &str,
    now_ms: i64,
    window_ms: i64,
) -> Result<bool, StorageError> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM action_dedup_log
         WHERE action_type = ?1 AND target = ?2 AND state_hash = ?3
           AND status = ?4 AND at_ms > ?5",
        params![
            action_type,
            target,
            state_hash,
            ActionDedupStatus::Executed.to_string(),
            now_ms - window_ms,
        ],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

pub fn append_stale_recovery(conn: &Connection, entry: &StaleRecoveryEntry) -> Result<(), StorageError> {
    conn.execute(
        "INSERT INTO stale_recovery_log (
            task_id, detecting_phase, from_state, to_state, stale_seconds, root_cause,
            had_pr, had_live_worker, retries_at_recovery, worker_completed_at_ms,
            eval_started_at_ms, eval_lag_seconds, at_ms
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        params![
            entry.task_id.as_str(),
            entry.detecting_phase,
            entry.from.to_string(),
            entry.to.to_string(),
            entry.stale_seconds,
            entry.root_cause,
            entry.had_pr,
            entry.had_live_worker,
            entry.retries_at_recovery,
            entry.worker_completed_at_ms,
            entry.eval_started_at_ms,
            entry.eval_lag_seconds,
            entry.at_ms,
        ],
    )?;
    Ok(())
}

#[cfg(test)]
#[path = "logs_tests.rs"]
mod tests;
