// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Circuit-breaker state and pure decision logic (spec.md §4.8). The state
//! is persisted to a file outside the SQLite database so it survives a
//! failed schema migration ([`crate::env::Paths::circuit_breaker_file`]);
//! [`sv_engine::circuit_breaker`] owns that file I/O, this module owns the
//! arithmetic.

use serde::{Deserialize, Serialize};

/// Global counter of consecutive task failures across all tasks, and the
/// trip/cooldown window it produces once it reaches the threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CircuitBreakerState {
    pub consecutive_failures: u32,
    pub tripped_at_ms: Option<i64>,
    pub cooldown_until_ms: Option<i64>,
}

impl CircuitBreakerState {
    /// True while `now_ms` is still inside a tripped cooldown window.
    pub fn is_tripped(&self, now_ms: i64) -> bool {
        self.cooldown_until_ms.is_some_and(|until| now_ms < until)
    }

    /// Apply one more failure observation, tripping the breaker once
    /// `threshold` is reached (spec.md §4.8).
    pub fn record_failure(self, now_ms: i64, threshold: u32, cooldown_ms: i64) -> Self {
        let consecutive_failures = self.consecutive_failures + 1;
        if consecutive_failures >= threshold {
            Self {
                consecutive_failures,
                tripped_at_ms: Some(now_ms),
                cooldown_until_ms: Some(now_ms + cooldown_ms),
            }
        } else {
            Self { consecutive_failures, tripped_at_ms: None, cooldown_until_ms: None }
        }
    }

    /// Clear the counter on the first successful completion, or on an
    /// explicit administrative reset (spec.md §4.8).
    pub fn reset(self) -> Self {
        Self::default()
    }

    /// True once the cooldown has elapsed, even though `cooldown_until_ms`
    /// is still set (auto-reset eligibility, spec.md §4.8).
    pub fn cooldown_elapsed(&self, now_ms: i64) -> bool {
        match self.cooldown_until_ms {
            Some(until) => now_ms >= until,
            None => false,
        }
    }
}

#[cfg(test)]
#[path = "circuit_tests.rs"]
mod tests;
