// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Schema DDL and the current schema version, tracked via SQLite's
//! `PRAGMA user_version` (spec.md §4.1).

use rusqlite::Connection;

pub const CURRENT_SCHEMA_VERSION: u32 = 1;

const DDL: &str = r#"
CREATE TABLE IF NOT EXISTS tasks (
    id                      TEXT PRIMARY KEY,
    repo                    TEXT NOT NULL,
    description             TEXT NOT NULL,
    status                  TEXT NOT NULL,
    requested_tier          TEXT,
    resolved_model          TEXT,
    retries                 INTEGER NOT NULL DEFAULT 0,
    max_retries             INTEGER NOT NULL DEFAULT 3,
    escalation_depth         INTEGER NOT NULL DEFAULT 0,
    max_escalation           INTEGER NOT NULL DEFAULT 2,
    session_handle          TEXT,
    worktree_path            TEXT,
    branch                  TEXT,
    log_path                 TEXT,
    pr_url                  TEXT,
    issue_url               TEXT,
    diagnostic_of            TEXT REFERENCES tasks(id),
    last_failure_at          INTEGER,
    consecutive_failure_count INTEGER NOT NULL DEFAULT 0,
    prompt_repeat_done       INTEGER NOT NULL DEFAULT 0,
    pre_dispatch_main_sha     TEXT,
    created_at              INTEGER NOT NULL,
    started_at              INTEGER,
    evaluating_started_at     INTEGER,
    completed_at             INTEGER,
    evaluation_duration_ms    INTEGER,
    batch_id                TEXT,
    tags                    TEXT NOT NULL DEFAULT '[]',
    blocked_by               TEXT NOT NULL DEFAULT '[]',
    error_key                TEXT
);

CREATE INDEX IF NOT EXISTS idx_tasks_status ON tasks(status);
CREATE INDEX IF NOT EXISTS idx_tasks_batch ON tasks(batch_id);
CREATE INDEX IF NOT EXISTS idx_tasks_diagnostic_of ON tasks(diagnostic_of);

CREATE TABLE IF NOT EXISTS batches (
    id                     TEXT PRIMARY KEY,
    name                   TEXT NOT NULL,
    target_concurrency      INTEGER NOT NULL,
    max_concurrency         INTEGER NOT NULL,
    load_factor             REAL NOT NULL DEFAULT 1.0,
    release_on_completion    INTEGER NOT NULL DEFAULT 0,
    release_type            TEXT,
    skip_quality_gate       INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS state_log (
    seq       INTEGER PRIMARY KEY AUTOINCREMENT,
    task_id   TEXT NOT NULL REFERENCES tasks(id),
    from_state TEXT NOT NULL,
    to_state   TEXT NOT NULL,
    reason    TEXT NOT NULL,
    at_ms     INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_state_log_task ON state_log(task_id);

CREATE TABLE IF NOT EXISTS proof_log (
    seq             INTEGER PRIMARY KEY AUTOINCREMENT,
    task_id         TEXT NOT NULL REFERENCES tasks(id),
    event           TEXT NOT NULL,
    stage           TEXT NOT NULL,
    decision        TEXT NOT NULL,
    evidence        TEXT NOT NULL,
    decision_maker   TEXT NOT NULL,
    pr_url          TEXT,
    duration_ms      INTEGER,
    metadata        TEXT NOT NULL DEFAULT '{}',
    at_ms           INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_proof_log_task ON proof_log(task_id);

CREATE TABLE IF NOT EXISTS action_dedup_log (
    seq         INTEGER PRIMARY KEY AUTOINCREMENT,
    cycle_id    TEXT NOT NULL,
    action_type  TEXT NOT NULL,
    target      TEXT NOT NULL,
    status      TEXT NOT NULL,
    state_hash   TEXT NOT NULL,
    at_ms       INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_dedup_log_target ON action_dedup_log(target, action_type, at_ms);

CREATE TABLE IF NOT EXISTS stale_recovery_log (
    seq                     INTEGER PRIMARY KEY AUTOINCREMENT,
    task_id                 TEXT NOT NULL REFERENCES tasks(id),
    detecting_phase          TEXT NOT NULL,
    from_state               TEXT NOT NULL,
    to_state                 TEXT NOT NULL,
    stale_seconds            INTEGER NOT NULL,
    root_cause               TEXT NOT NULL,
    had_pr                  INTEGER NOT NULL,
    had_live_worker           INTEGER NOT NULL,
    retries_at_recovery       INTEGER NOT NULL,
    worker_completed_at_ms     INTEGER,
    eval_started_at_ms        INTEGER,
    eval_lag_seconds          INTEGER,
    at_ms                    INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS routine_state (
    name                    TEXT PRIMARY KEY,
    run_count               INTEGER NOT NULL DEFAULT 0,
    consecutive_zero_findings INTEGER NOT NULL DEFAULT 0,
    deferred_until_ms         INTEGER
);
"#;

pub fn apply_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(DDL)?;
    Ok(())
}

#[cfg(test)]
#[path = "schema_tests.rs"]
mod tests;
