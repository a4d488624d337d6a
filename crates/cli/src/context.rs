// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wires together [`SupervisorEnv`] and the collaborators every command
//! needs: the store, the forge CLI, and the LLM-CLI selector. Built once
//! in `main` and threaded by reference into each command.

use std::path::PathBuf;
use sv_adapters::forge::GhForgeCli;
use sv_core::config::Config;
use sv_core::env::{Paths, SupervisorEnv};
use sv_storage::Store;

pub struct Context {
    pub env: SupervisorEnv,
    pub store: Store,
    pub forge: GhForgeCli,
}

impl Context {
    pub fn open(root: PathBuf) -> anyhow::Result<Self> {
        let config = Config::from_env()?;
        let paths = Paths::new(root);
        std::fs::create_dir_all(paths.root())?;
        let store = Store::open(paths.db_file(), paths.backup_dir())?;
        let env = SupervisorEnv::new(config, paths);
        Ok(Self { env, store, forge: GhForgeCli::new() })
    }

    pub fn now_ms(&self) -> i64 {
        self.env.clock.epoch_ms()
    }
}

/// Default supervisor home: `$SUPERVISOR_HOME`, or `~/.sv-supervisor`.
pub fn default_root() -> PathBuf {
    std::env::var_os("SUPERVISOR_HOME").map(PathBuf::from).unwrap_or_else(|| {
        dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")).join(".sv-supervisor")
    })
}
