// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Timestamped database backups, pruned to the most recent N (spec.md
//! §4.1 "Store"), taken before every migration and on demand via `sv
//! backup`.

use std::path::{Path, PathBuf};

pub const KEEP_BACKUPS: usize = 5;

/// Copy `db_file` into `backup_dir/supervisor-{epoch_ms}.sqlite3`, then
/// prune older backups beyond [`KEEP_BACKUPS`].
pub fn take_backup(db_file: &Path, backup_dir: &Path, epoch_ms: i64) -> std::io::Result<PathBuf> {
    std::fs::create_dir_all(backup_dir)?;
    let dest = backup_dir.join(format!("supervisor-{epoch_ms}.sqlite3"));
    std::fs::copy(db_file, &dest)?;
    prune_backups(backup_dir)?;
    tracing::info!(path = %dest.display(), "wrote database backup");
    Ok(dest)
}

/// Keep only the most recent [`KEEP_BACKUPS`] files (sorted by name, which
/// sorts by timestamp since the prefix is fixed width-agnostic epoch ms).
pub fn prune_backups(backup_dir: &Path) -> std::io::Result<()> {
    let mut entries: Vec<PathBuf> = std::fs::read_dir(backup_dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "sqlite3"))
        .collect();
    entries.sort();
    if entries.len() > KEEP_BACKUPS {
        for stale in &entries[..entries.len() - KEEP_BACKUPS] {
            std::fs::remove_file(stale)?;
        }
    }
    Ok(())
}

/// The most recent backup file, if any.
pub fn latest_backup(backup_dir: &Path) -> std::io::Result<Option<PathBuf>> {
    if !backup_dir.is_dir() {
        return Ok(None);
    }
    let mut entries: Vec<PathBuf> = std::fs::read_dir(backup_dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "sqlite3"))
        .collect();
    entries.sort();
    Ok(entries.pop())
}

/// Restore `db_file` from the most recent backup, atomically (write to a
/// sibling temp path, then rename over the live file).
pub fn restore_latest(db_file: &Path, backup_dir: &Path) -> std::io::Result<Option<PathBuf>> {
    let Some(backup) = latest_backup(backup_dir)? else {
        return Ok(None);
    };
    let tmp = db_file.with_extension("sqlite3.restoring");
    std::fs::copy(&backup, &tmp)?;
    std::fs::rename(&tmp, db_file)?;
    Ok(Some(backup))
}

#[cfg(test)]
#[path = "backup_tests.rs"]
mod tests;
