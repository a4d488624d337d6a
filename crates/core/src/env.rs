// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! [`SupervisorEnv`]: the single explicit value threading config, clock,
//! and on-disk layout through every component (spec.md §9 "Global mutable
//! state" — no process-wide singletons).

use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// The supervisor's on-disk layout: one directory holding the DB, wrapper
/// scripts, logs, and lock file (spec.md §9).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    root: PathBuf,
}

impl Paths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn db_file(&self) -> PathBuf {
        self.root.join("supervisor.sqlite3")
    }

    pub fn backup_dir(&self) -> PathBuf {
        self.root.join("backups")
    }

    pub fn scripts_dir(&self) -> PathBuf {
        self.root.join("scripts")
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.root.join("logs")
    }

    pub fn worktrees_dir(&self) -> PathBuf {
        self.root.join("worktrees")
    }

    pub fn lock_file(&self) -> PathBuf {
        self.root.join("supervisor.lock")
    }

    /// Circuit-breaker state file, kept outside the SQLite database so it
    /// survives a failed schema migration (spec.md §4.8).
    pub fn circuit_breaker_file(&self) -> PathBuf {
        self.root.join("circuit_breaker.json")
    }
}

/// Explicit environment passed by value/reference to every component that
/// needs config, time, or on-disk paths — never read from globals.
#[derive(Clone)]
pub struct SupervisorEnv {
    pub config: Config,
    pub clock: Arc<dyn Clock>,
    pub paths: Paths,
}

impl SupervisorEnv {
    pub fn new(config: Config, paths: Paths) -> Self {
        Self { config, clock: Arc::new(SystemClock), paths }
    }

    /// Build an env with a fake clock, for deterministic tests.
    #[cfg(any(test, feature = "test-support"))]
    pub fn for_tests(root: impl Into<PathBuf>) -> (Self, Arc<crate::clock::FakeClock>) {
        let fake = Arc::new(crate::clock::FakeClock::new());
        let env = Self { config: Config::default(), clock: fake.clone(), paths: Paths::new(root) };
        (env, fake)
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
