// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::collections::HashMap;

fn reader(vars: HashMap<&'static str, &'static str>) -> impl Fn(&str) -> Result<String, VarError> {
    move |key| vars.get(key).map(|v| v.to_string()).ok_or(VarError::NotPresent)
}

#[test]
fn defaults_match_spec() {
    let cfg = Config::from_env_reader(reader(HashMap::new())).expect("defaults parse");
    assert_eq!(cfg, Config::default());
    assert_eq!(cfg.max_concurrency, 4);
    assert_eq!(cfg.circuit_breaker_threshold, 3);
    assert_eq!(cfg.circuit_breaker_cooldown, Duration::from_secs(1800));
    assert_eq!(cfg.failure_cooldown, Duration::from_secs(600));
    assert_eq!(cfg.max_consecutive_failures, 2);
    assert_eq!(cfg.heartbeat_interval, Duration::from_secs(300));
    assert!(cfg.self_heal);
    assert!(cfg.self_heal_ai);
    assert!(cfg.prompt_repeat_enabled);
    assert!(cfg.prefer_oauth);
    assert_eq!(cfg.cli_override, None);
}

#[test]
fn overrides_are_applied() {
    let mut vars = HashMap::new();
    vars.insert("SUPERVISOR_MAX_CONCURRENCY", "8");
    vars.insert("SUPERVISOR_SELF_HEAL", "false");
    vars.insert("SUPERVISOR_CLI", "opencode");
    let cfg = Config::from_env_reader(reader(vars)).expect("overrides parse");
    assert_eq!(cfg.max_concurrency, 8);
    assert!(!cfg.self_heal);
    assert_eq!(cfg.cli_override.as_deref(), Some("opencode"));
}

#[test]
fn bool_accepts_common_spellings() {
    for (raw, expected) in [("1", true), ("yes", true), ("on", true), ("0", false), ("off", false)] {
        let mut vars = HashMap::new();
        vars.insert("SUPERVISOR_SELF_HEAL", raw);
        let cfg = Config::from_env_reader(reader(vars)).expect("parses");
        assert_eq!(cfg.self_heal, expected, "input {raw:?}");
    }
}

#[test]
fn invalid_bool_is_reported_not_defaulted() {
    let mut vars = HashMap::new();
    vars.insert("SUPERVISOR_SELF_HEAL", "maybe");
    let err = Config::from_env_reader(reader(vars)).unwrap_err();
    assert_eq!(
        err,
        ConfigError::InvalidBool { key: "SUPERVISOR_SELF_HEAL", value: "maybe".into() }
    );
}

#[test]
fn invalid_int_is_reported_not_defaulted() {
    let mut vars = HashMap::new();
    vars.insert("SUPERVISOR_MAX_CONCURRENCY", "four");
    let err = Config::from_env_reader(reader(vars)).unwrap_err();
    assert_eq!(
        err,
        ConfigError::InvalidInt { key: "SUPERVISOR_MAX_CONCURRENCY", value: "four".into() }
    );
}

#[test]
fn empty_cli_override_is_treated_as_unset() {
    let mut vars = HashMap::new();
    vars.insert("SUPERVISOR_CLI", "");
    let cfg = Config::from_env_reader(reader(vars)).expect("parses");
    assert_eq!(cfg.cli_override, None);
}
