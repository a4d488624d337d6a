// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Schema migrations over `PRAGMA user_version`, carrying forward the
//! teacher's backup -> apply -> row-count-verify -> rollback discipline
//! (previously expressed over a JSON `v` field; here over SQLite's own
//! version pragma and a transaction per step).

use crate::error::MigrationError;
use rusqlite::Connection;

/// One schema migration step.
pub trait Migration {
    fn source_version(&self) -> u32;
    fn target_version(&self) -> u32;
    fn migrate(&self, conn: &Connection) -> Result<(), MigrationError>;
    /// Tables whose row count must not shrink across this migration.
    /// Empty by default — most migrations only add columns/tables.
    fn row_count_invariants(&self) -> &'static [&'static str] {
        &[]
    }
}

#[derive(Default)]
pub struct MigrationRegistry {
    migrations: Vec<Box<dyn Migration>>,
}

impl MigrationRegistry {
    pub fn new() -> Self {
        Self { migrations: Vec::new() }
    }

    pub fn register(mut self, migration: Box<dyn Migration>) -> Self {
        self.migrations.push(migration);
        self
    }

    fn find(&self, from: u32) -> Option<&dyn Migration> {
        self.migrations.iter().find(|m| m.source_version() == from).map(|m| m.as_ref())
    }

    /// Apply every migration needed to reach `target`. Each step runs
    /// inside its own transaction: if the post-migration row count of any
    /// invariant table is lower than before, the transaction is rolled
    /// back and the whole chain aborts rather than persisting a partial,
    /// data-losing migration.
    pub fn migrate_to(&self, conn: &mut Connection, target: u32) -> Result<(), MigrationError> {
        let mut current: u32 =
            conn.pragma_query_value(None, "user_version", |row| row.get(0)).unwrap_or(0);

        if current == target {
            return Ok(());
        }
        if current > target {
            return Err(MigrationError::TooNew(current, target));
        }

        while current < target {
            let Some(migration) = self.find(current) else {
                return Err(MigrationError::NoPath(current, target));
            };
            let to = migration.target_version();

            let before: Vec<(&'static str, i64)> = migration
                .row_count_invariants()
                .iter()
                .map(|table| (*table, row_count(conn, table)))
                .collect();

            let tx = conn.transaction().expect("begin migration transaction");
            migration.migrate(&tx)?;

            for (table, before_count) in &before {
                let after = row_count(&tx, table);
                if after < *before_count {
                    drop(tx); // rollback on drop without commit
                    return Err(MigrationError::RowCountShrank(current, to, table, *before_count, after));
                }
            }

            tx.pragma_update(None, "user_version", to).expect("set user_version");
            tx.commit().expect("commit migration transaction");
            tracing::info!(from = current, to, "applied schema migration");

            current = to;
        }

        Ok(())
    }
}

fn row_count(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0)).unwrap_or(0)
}

#[cfg(test)]
#[path = "migration_tests.rs"]
mod tests;
