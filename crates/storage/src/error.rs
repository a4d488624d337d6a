// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use sv_core::{GuardError, IllegalTransition};

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error(transparent)]
    IllegalTransition(#[from] IllegalTransition),

    #[error(transparent)]
    Guard(#[from] GuardError),

    #[error("task {0} not found")]
    TaskNotFound(String),

    #[error("batch {0} not found")]
    BatchNotFound(String),

    #[error(transparent)]
    Migration(#[from] MigrationError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MigrationError {
    #[error("database schema version {0} is newer than this binary supports ({1})")]
    TooNew(u32, u32),
    #[error("no migration path from version {0} to {1}")]
    NoPath(u32, u32),
    #[error("migration from {0} to {1} shrank row count in {2} ({3} -> {4}); rolled back")]
    RowCountShrank(u32, u32, &'static str, i64, i64),
}
