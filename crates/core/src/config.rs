// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed configuration, read once at startup from the environment
//! (spec.md §6 "Environment variables"). No component reads `std::env`
//! directly; everything is threaded through [`Config`] /
//! [`crate::env::SupervisorEnv`].

use std::env::VarError;
use std::time::Duration;

/// Typed, defaulted view over the `SUPERVISOR_*` environment variables.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub max_concurrency: u32,
    pub self_heal: bool,
    pub self_heal_ai: bool,
    pub circuit_breaker_threshold: u32,
    pub circuit_breaker_cooldown: Duration,
    pub failure_cooldown: Duration,
    pub max_consecutive_failures: u32,
    pub heartbeat_interval: Duration,
    pub prompt_repeat_enabled: bool,
    pub prefer_oauth: bool,
    /// Explicit LLM CLI override (`opencode` | `claude`); `None` lets
    /// `sv_adapters::llm::select_cli` probe for an available provider.
    pub cli_override: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_concurrency: 4,
            self_heal: true,
            self_heal_ai: true,
            circuit_breaker_threshold: 3,
            circuit_breaker_cooldown: Duration::from_secs(1800),
            failure_cooldown: Duration::from_secs(600),
            max_consecutive_failures: 2,
            heartbeat_interval: Duration::from_secs(300),
            prompt_repeat_enabled: true,
            prefer_oauth: true,
            cli_override: None,
        }
    }
}

impl Config {
    /// Build a [`Config`] from `SUPERVISOR_*` environment variables,
    /// falling back to spec.md §6 defaults for anything unset. Malformed
    /// values (non-bool, non-integer) are reported rather than silently
    /// ignored.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_reader(|key| std::env::var(key))
    }

    /// Testable entry point: takes a reader function instead of touching
    /// the process environment directly.
    pub fn from_env_reader(
        read: impl Fn(&str) -> Result<String, VarError>,
    ) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            max_concurrency: parse_u32(&read, "SUPERVISOR_MAX_CONCURRENCY", defaults.max_concurrency)?,
            self_heal: parse_bool(&read, "SUPERVISOR_SELF_HEAL", defaults.self_heal)?,
            self_heal_ai: parse_bool(&read, "SUPERVISOR_SELF_HEAL_AI", defaults.self_heal_ai)?,
            circuit_breaker_threshold: parse_u32(
                &read,
                "SUPERVISOR_CIRCUIT_BREAKER_THRESHOLD",
                defaults.circuit_breaker_threshold,
            )?,
            circuit_breaker_cooldown: parse_secs(
                &read,
                "SUPERVISOR_CIRCUIT_BREAKER_COOLDOWN_SECS",
                defaults.circuit_breaker_cooldown,
            )?,
            failure_cooldown: parse_secs(
                &read,
                "SUPERVISOR_FAILURE_COOLDOWN_SECS",
                defaults.failure_cooldown,
            )?,
            max_consecutive_failures: parse_u32(
                &read,
                "SUPERVISOR_MAX_CONSECUTIVE_FAILURES",
                defaults.max_consecutive_failures,
            )?,
            heartbeat_interval: parse_secs(
                &read,
                "SUPERVISOR_HEARTBEAT_INTERVAL",
                defaults.heartbeat_interval,
            )?,
            prompt_repeat_enabled: parse_bool(
                &read,
                "SUPERVISOR_PROMPT_REPEAT_ENABLED",
                defaults.prompt_repeat_enabled,
            )?,
            prefer_oauth: parse_bool(&read, "SUPERVISOR_PREFER_OAUTH", defaults.prefer_oauth)?,
            cli_override: match read("SUPERVISOR_CLI") {
                Ok(v) if !v.is_empty() => Some(v),
                _ => None,
            },
        })
    }
}

fn parse_bool(
    read: &impl Fn(&str) -> Result<String, VarError>,
    key: &'static str,
    default: bool,
) -> Result<bool, ConfigError> {
    match read(key) {
        Err(_) => Ok(default),
        Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::InvalidBool { key, value: raw }),
        },
    }
}

fn parse_u32(
    read: &impl Fn(&str) -> Result<String, VarError>,
    key: &'static str,
    default: u32,
) -> Result<u32, ConfigError> {
    match read(key) {
        Err(_) => Ok(default),
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidInt { key, value: raw }),
    }
}

fn parse_secs(
    read: &impl Fn(&str) -> Result<String, VarError>,
    key: &'static str,
    default: Duration,
) -> Result<Duration, ConfigError> {
    match read(key) {
        Err(_) => Ok(default),
        Ok(raw) => {
            let secs: u64 = raw.trim().parse().map_err(|_| ConfigError::InvalidInt {
                key,
                value: raw.clone(),
            })?;
            Ok(Duration::from_secs(secs))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{key} must be a boolean (true/false/1/0), got {value:?}")]
    InvalidBool { key: &'static str, value: String },
    #[error("{key} must be an integer, got {value:?}")]
    InvalidInt { key: &'static str, value: String },
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
