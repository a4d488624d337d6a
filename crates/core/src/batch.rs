// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Batches: ordered groups of tasks with shared dispatch policy (spec.md §3).

use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Unique identifier for a batch.
    pub struct BatchId("bat-");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReleaseType {
    Major,
    Minor,
    Patch,
}

crate::simple_display! {
    ReleaseType {
        Major => "major",
        Minor => "minor",
        Patch => "patch",
    }
}

impl std::str::FromStr for ReleaseType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "major" => Ok(ReleaseType::Major),
            "minor" => Ok(ReleaseType::Minor),
            "patch" => Ok(ReleaseType::Patch),
            other => Err(format!("unknown release type: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Batch {
    pub id: BatchId,
    pub name: String,
    /// Target concurrency under normal load.
    pub target_concurrency: u32,
    /// Hard cap; 0 means auto-derive from CPU count (spec.md §4.3).
    pub max_concurrency: u32,
    /// Scales the effective cap with current system load.
    pub load_factor: f64,
    pub release_on_completion: bool,
    pub release_type: ReleaseType,
    pub skip_quality_gate: bool,
}

impl Batch {
    pub fn new(id: BatchId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            target_concurrency: 4,
            max_concurrency: 0,
            load_factor: 1.0,
            release_on_completion: false,
            release_type: ReleaseType::Patch,
            skip_quality_gate: false,
        }
    }

    /// Effective hard cap: the configured `max_concurrency`, or `hard_cap`
    /// (machine-derived) when `max_concurrency` is 0 (auto).
    pub fn effective_hard_cap(&self, hard_cap: u32) -> u32 {
        if self.max_concurrency == 0 {
            hard_cap
        } else {
            self.max_concurrency.min(hard_cap)
        }
    }
}

#[cfg(test)]
#[path = "batch_tests.rs"]
mod tests;
