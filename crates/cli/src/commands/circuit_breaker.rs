// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `sv circuit-breaker {status|reset|check|trip}` (spec.md §4.8, §6): the
//! global dispatch kill-switch, file-backed so it survives a failed
//! migration.

use crate::context::Context;
use crate::exit_error::ExitError;
use clap::Subcommand;
use sv_core::circuit::CircuitBreakerState;

#[derive(Subcommand, Clone)]
pub enum Action {
    Status,
    Reset,
    /// Exit non-zero if the breaker is currently tripped, for use in scripts.
    Check,
    /// Force-trip the breaker without waiting for the failure threshold.
    Trip,
}

pub async fn run(ctx: &Context, action: Action) -> anyhow::Result<()> {
    let path = ctx.env.paths.circuit_breaker_file();
    let now_ms = ctx.now_ms();

    match action {
        Action::Status => {
            let state = sv_engine::circuit_breaker::load(&path)?;
            if state.is_tripped(now_ms) {
                let remaining_ms = state.cooldown_until_ms.unwrap_or(now_ms) - now_ms;
                println!("tripped ({} consecutive failures, {}s left in cooldown)", state.consecutive_failures, remaining_ms.max(0) / 1000);
            } else {
                println!("closed ({} consecutive failures recorded)", state.consecutive_failures);
            }
        }
        Action::Reset => {
            sv_engine::circuit_breaker::reset(&path)?;
            let repo = std::env::current_dir().unwrap_or_default();
            sv_engine::circuit_breaker::announce_reset(&ctx.forge, &repo).await;
            println!("circuit breaker reset");
        }
        Action::Check => {
            if sv_engine::circuit_breaker::check(&path, now_ms)? {
                println!("closed");
            } else {
                return Err(ExitError::new(1, "circuit breaker is tripped".to_string()).into());
            }
        }
        Action::Trip => {
            let cooldown_ms = ctx.env.config.circuit_breaker_cooldown.as_millis() as i64;
            let state = CircuitBreakerState {
                consecutive_failures: ctx.env.config.circuit_breaker_threshold,
                tripped_at_ms: Some(now_ms),
                cooldown_until_ms: Some(now_ms + cooldown_ms),
            };
            sv_engine::circuit_breaker::save(&path, state)?;
            let repo = std::env::current_dir().unwrap_or_default();
            sv_engine::circuit_breaker::announce_trip(&ctx.forge, &repo, ctx.env.config.circuit_breaker_threshold).await;
            println!("circuit breaker force-tripped");
        }
    }
    Ok(())
}
