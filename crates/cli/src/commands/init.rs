// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `sv init`: create the supervisor directory layout and an empty,
//! migrated database (spec.md §9 "a single supervisor directory").

use std::path::PathBuf;
use sv_core::env::Paths;
use sv_storage::Store;

pub fn run(root: PathBuf) -> anyhow::Result<()> {
    let paths = Paths::new(&root);
    std::fs::create_dir_all(paths.root())?;
    std::fs::create_dir_all(paths.scripts_dir())?;
    std::fs::create_dir_all(paths.logs_dir())?;
    std::fs::create_dir_all(paths.worktrees_dir())?;
    std::fs::create_dir_all(paths.backup_dir())?;
    let _ = Store::open(paths.db_file(), paths.backup_dir())?;
    println!("Initialized supervisor directory at {}", paths.root().display());
    Ok(())
}
