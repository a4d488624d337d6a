// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-routine maintenance scheduler bookkeeping (spec.md §3, §4.9.a).

use crate::error::StorageError;
use rusqlite::{params, Connection, OptionalExtension};
use sv_core::records::RoutineState;

pub fn get_routine_state(conn: &Connection, name: &str) -> Result<RoutineState, StorageError> {
    let found = conn
        .query_row(
            "SELECT name, run_count, consecutive_zero_findings, deferred_until_ms FROM routine_state WHERE name = ?1",
            params![name],
            |row| {
                Ok(RoutineState {
                    name: row.get(0)?,
                    run_count: row.get(1)?,
                    consecutive_zero_findings: row.get(2)?,
                    deferred_until_ms: row.get(3)?,
                })
            },
        )
        .optional()?;
    Ok(found.unwrap_or_else(|| RoutineState { name: name.to_string(), ..Default::default() }))
}

pub fn upsert_routine_state(conn: &Connection, state: &RoutineState) -> Result<(), StorageError> {
    conn.execute(
        "INSERT INTO routine_state (name, run_count, consecutive_zero_findings, deferred_until_ms)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(name) DO UPDATE SET
            run_count = excluded.run_count,
            consecutive_zero_findings = excluded.consecutive_zero_findings,
            deferred_until_ms = excluded.deferred_until_ms",
        params![state.name, state.run_count, state.consecutive_zero_findings, state.deferred_until_ms],
    )?;
    Ok(())
}

#[cfg(test)]
#[path = "routine_tests.rs"]
mod tests;
