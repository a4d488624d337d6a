// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `sv backup [reason]` / `sv restore [file]` (spec.md §4.1, §6): on-demand
//! database snapshot and restore, on top of the same backup directory the
//! engine writes to before every migration.

use crate::context::Context;
use crate::exit_error::ExitError;

pub fn run(ctx: &Context, reason: Option<String>) -> anyhow::Result<()> {
    let Some(path) = ctx.store.backup(ctx.now_ms())? else {
        println!("no database file to back up yet");
        return Ok(());
    };
    match reason {
        Some(reason) => println!("backed up to {} ({reason})", path.display()),
        None => println!("backed up to {}", path.display()),
    }
    Ok(())
}

pub fn restore(ctx: &Context, file: Option<String>) -> anyhow::Result<()> {
    match file {
        Some(path) => {
            let source = std::path::PathBuf::from(&path);
            if !source.is_file() {
                return Err(ExitError::new(1, format!("backup file not found: {path}")).into());
            }
            let tmp = ctx.store.db_file().with_extension("sqlite3.restoring");
            std::fs::copy(&source, &tmp)?;
            std::fs::rename(&tmp, ctx.store.db_file())?;
            println!("restored from {path}");
        }
        None => match sv_storage::backup::restore_latest(ctx.store.db_file(), ctx.store.backup_dir())? {
            Some(backup) => println!("restored from {}", backup.display()),
            None => return Err(ExitError::new(1, "no backups found".to_string()).into()),
        },
    }
    Ok(())
}
