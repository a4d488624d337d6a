// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::error::StorageError;
use rusqlite::{params, Connection, OptionalExtension, Row};
use sv_core::batch::{Batch, BatchId, ReleaseType};
use std::str::FromStr;

pub fn insert_batch(conn: &Connection, batch: &Batch) -> Result<(), StorageError> {
    conn.execute(
        "INSERT INTO batches (
            id, name, target_concurrency, max_concurrency, load_factor,
            release_on_completion, release_type, skip_quality_gate
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            batch.id.as_str(),
            batch.name,
            batch.target_concurrency,
            batch.max_concurrency,
            batch.load_factor,
            batch.release_on_completion,
            batch.release_type.to_string(),
            batch.skip_quality_gate,
        ],
    )?;
    Ok(())
}

pub fn get_batch(conn: &Connection, id: &BatchId) -> Result<Option<Batch>, StorageError> {
    conn.query_row("SELECT * FROM batches WHERE id = ?1", params![id.as_str()], row_to_batch)
        .optional()
        .map_err(StorageError::from)
}

pub fn require_batch(conn: &Connection, id: &BatchId) -> Result<Batch, StorageError> {
    get_batch(conn, id)?.ok_or_else(|| StorageError::BatchNotFound(id.as_str().to_string()))
}

fn row_to_batch(row: &Row) -> rusqlite::Result<Batch> {
    let release_type: String = row.get("release_type")?;
    Ok(Batch {
        id: BatchId::from_string(row.get::<_, String>("id")?),
        name: row.get("name")?,
        target_concurrency: row.get("target_concurrency")?,
        max_concurrency: row.get("max_concurrency")?,
        load_factor: row.get("load_factor")?,
        release_on_completion: row.get("release_on_completion")?,
        release_type: ReleaseType::from_str(&release_type)
            .map_err(|e| rusqlite::Error::InvalidColumnType(0, e, rusqlite::types::Type::Text))?,
        skip_quality_gate: row.get("skip_quality_gate")?,
    })
}

#[cfg(test)]
#[path = "batches_tests.rs"]
mod tests;
