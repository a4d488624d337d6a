// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! [`Store`]: the single entry point the rest of the supervisor uses to
//! talk to SQLite (spec.md §4.1). Holds the connection behind a
//! `parking_lot::Mutex` — one supervisor process, one pulse at a time, but
//! CLI subcommands issued concurrently with a running pulse must not race
//! on the same `Connection` handle.

use crate::backup;
use crate::batches;
use crate::conn::open_connection;
use crate::error::StorageError;
use crate::logs;
use crate::migration::MigrationRegistry;
use crate::routine;
use crate::schema::{apply_schema, CURRENT_SCHEMA_VERSION};
use crate::tasks;
use parking_lot::Mutex;
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use sv_core::batch::{Batch, BatchId};
use sv_core::records::{ActionDedupEntry, ProofLogEntry, RoutineState, StaleRecoveryEntry};
use sv_core::state::TaskState;
use sv_core::task::{Task, TaskId};

pub struct Store {
    conn: Mutex<Connection>,
    db_file: PathBuf,
    backup_dir: PathBuf,
}

impl Store {
    /// Open (creating if absent) the database at `db_file`, apply the
    /// schema, and run any pending migrations.
    pub fn open(db_file: impl Into<PathBuf>, backup_dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let db_file = db_file.into();
        let mut conn = open_connection(&db_file)?;
        apply_schema(&conn)?;
        MigrationRegistry::new().migrate_to(&mut conn, CURRENT_SCHEMA_VERSION)?;
        Ok(Self { conn: Mutex::new(conn), db_file, backup_dir: backup_dir.into() })
    }

    /// In-memory store for tests — no file, no backups.
    #[cfg(any(test, feature = "test-support"))]
    pub fn open_in_memory() -> Result<Self, StorageError> {
        let conn = crate::conn::open_in_memory()?;
        apply_schema(&conn)?;
        Ok(Self { conn: Mutex::new(conn), db_file: PathBuf::new(), backup_dir: PathBuf::new() })
    }

    pub fn insert_task(&self, task: &Task) -> Result<(), StorageError> {
        tasks::insert_task(&self.conn.lock(), task)
    }

    pub fn get_task(&self, id: &TaskId) -> Result<Option<Task>, StorageError> {
        tasks::get_task(&self.conn.lock(), id)
    }

    pub fn require_task(&self, id: &TaskId) -> Result<Task, StorageError> {
        tasks::require_task(&self.conn.lock(), id)
    }

    pub fn list_tasks(&self, status: Option<TaskState>) -> Result<Vec<Task>, StorageError> {
        tasks::list_tasks(&self.conn.lock(), status)
    }

    pub fn list_tasks_for_batch(&self, batch_id: &BatchId) -> Result<Vec<Task>, StorageError> {
        tasks::list_tasks_for_batch(&self.conn.lock(), batch_id)
    }

    pub fn list_subtasks(&self, parent: &TaskId) -> Result<Vec<Task>, StorageError> {
        tasks::list_subtasks(&self.conn.lock(), parent)
    }

    pub fn transition(
        &self,
        id: &TaskId,
        to: TaskState,
        reason: &str,
        at_ms: i64,
        upstream_pr_merged: Option<bool>,
    ) -> Result<Task, StorageError> {
        tasks::transition(&self.conn.lock(), id, to, reason, at_ms, upstream_pr_merged)
    }

    pub fn update_task(&self, task: &Task) -> Result<(), StorageError> {
        tasks::update_task(&self.conn.lock(), task)
    }

    pub fn insert_batch(&self, batch: &Batch) -> Result<(), StorageError> {
        batches::insert_batch(&self.conn.lock(), batch)
    }

    pub fn get_batch(&self, id: &BatchId) -> Result<Option<Batch>, StorageError> {
        batches::get_batch(&self.conn.lock(), id)
    }

    pub fn require_batch(&self, id: &BatchId) -> Result<Batch, StorageError> {
        batches::require_batch(&self.conn.lock(), id)
    }

    pub fn append_proof(&self, entry: &ProofLogEntry) -> Result<(), StorageError> {
        logs::append_proof(&self.conn.lock(), entry)
    }

    pub fn proof_log_for_task(&self, task_id: &TaskId) -> Result<Vec<ProofLogEntry>, StorageError> {
        logs::proof_log_for_task(&self.conn.lock(), task_id)
    }

    pub fn record_action_dedup(&self, entry: &ActionDedupEntry) -> Result<(), StorageError> {
        logs::record_action_dedup(&self.conn.lock(), entry)
    }

    pub fn was_recently_executed(
        &self,
        action_type: &str,
        target: &str,
        state_hash: &str,
        now_ms: i64,
        window_ms: i64,
    ) -> Result<bool, StorageError> {
        logs::was_recently_executed(&self.conn.lock(), action_type, target, state_hash, now_ms, window_ms)
    }

    pub fn append_stale_recovery(&self, entry: &StaleRecoveryEntry) -> Result<(), StorageError> {
        logs::append_stale_recovery(&self.conn.lock(), entry)
    }

    pub fn get_routine_state(&self, name: &str) -> Result<RoutineState, StorageError> {
        routine::get_routine_state(&self.conn.lock(), name)
    }

    pub fn upsert_routine_state(&self, state: &RoutineState) -> Result<(), StorageError> {
        routine::upsert_routine_state(&self.conn.lock(), state)
    }

    /// Take a timestamped backup of the live database file (spec.md §4.1,
    /// `sv backup`). No-op (returns `None`) for an in-memory store.
    pub fn backup(&self, epoch_ms: i64) -> Result<Option<PathBuf>, StorageError> {
        if self.db_file.as_os_str().is_empty() {
            return Ok(None);
        }
        let _guard = self.conn.lock();
        Ok(Some(backup::take_backup(&self.db_file, &self.backup_dir, epoch_ms)?))
    }

    pub fn db_file(&self) -> &Path {
        &self.db_file
    }

    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }
}

pub use backup::KEEP_BACKUPS as MAX_RETAINED_BACKUPS;

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
