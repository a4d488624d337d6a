// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! LLM CLI back ends (spec.md §6 "LLM CLI"): a multi-provider back end and
//! a model-family-native one, both invoked as external processes with a
//! prompt, a model identifier, and an output-format flag.

use async_trait::async_trait;
use sv_core::task::ModelTier;
use thiserror::Error;
use tokio::process::Command;

#[derive(Debug, Error)]
pub enum LlmCliError {
    #[error("failed to spawn {binary}: {source}")]
    Spawn { binary: String, #[source] source: std::io::Error },
    #[error("{binary} exited with status {status}: {stderr}")]
    NonZeroExit { binary: String, status: i32, stderr: String },
}

/// Provider health, probed before dispatch (spec.md §4.3 step 6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderHealth {
    Healthy,
    Unavailable,
    RateLimited,
    KeyInvalid,
}

/// A back end capable of running one prompt to completion.
#[async_trait]
pub trait LlmCli: Send + Sync {
    /// Invoke the CLI with `prompt` at the given `model` tier, returning its
    /// raw stdout. `mcp_config` is honored only by back ends that support
    /// per-worker MCP configuration (spec.md §6).
    async fn run(&self, prompt: &str, model: ModelTier, mcp_config: Option<&std::path::Path>) -> Result<String, LlmCliError>;

    /// Probe whether this back end's provider is reachable and authorized.
    async fn probe_health(&self) -> ProviderHealth;

    /// True if this back end has usable OAuth credentials on this host for
    /// `model`'s family (spec.md §6 "CLI selection is OAuth-aware").
    fn has_oauth_for(&self, model: ModelTier) -> bool;
}

/// Multi-provider back end (e.g. a router CLI that accepts any model ID).
pub struct MultiProviderCli {
    binary: String,
}

impl MultiProviderCli {
    pub fn new(binary: impl Into<String>) -> Self {
        Self { binary: binary.into() }
    }
}

impl Default for MultiProviderCli {
    fn default() -> Self {
        Self::new("opencode")
    }
}

#[async_trait]
impl LlmCli for MultiProviderCli {
    async fn run(&self, prompt: &str, model: ModelTier, _mcp_config: Option<&std::path::Path>) -> Result<String, LlmCliError> {
        run_cli(&self.binary, &["run", "--model", &model.to_string(), "--format", "json", prompt]).await
    }

    async fn probe_health(&self) -> ProviderHealth {
        probe_via_version(&self.binary).await
    }

    fn has_oauth_for(&self, _model: ModelTier) -> bool {
        false
    }
}

/// Model-family-native back end, additionally taking an MCP config path and
/// a strict-MCP-config flag (spec.md §6).
pub struct NativeCli {
    binary: String,
    strict_mcp_config: bool,
}

impl NativeCli {
    pub fn new(binary: impl Into<String>) -> Self {
        Self { binary: binary.into(), strict_mcp_config: true }
    }
}

impl Default for NativeCli {
    fn default() -> Self {
        Self::new("claude")
    }
}

#[async_trait]
impl LlmCli for NativeCli {
    async fn run(&self, prompt: &str, model: ModelTier, mcp_config: Option<&std::path::Path>) -> Result<String, LlmCliError> {
        let model_str = model.to_string();
        let mut args = vec!["--model", &model_str, "--output-format", "json"];
        let mcp_path;
        if let Some(path) = mcp_config {
            mcp_path = path.display().to_string();
            args.push("--mcp-config");
            args.push(&mcp_path);
            if self.strict_mcp_config {
                args.push("--strict-mcp-config");
            }
        }
        args.push("-p");
        args.push(prompt);
        run_cli(&self.binary, &args).await
    }

    async fn probe_health(&self) -> ProviderHealth {
        probe_via_version(&self.binary).await
    }

    fn has_oauth_for(&self, model: ModelTier) -> bool {
        matches!(model, ModelTier::Haiku | ModelTier::Sonnet | ModelTier::Opus)
            && which_on_path(&self.binary)
            && std::env::var_os(oauth_env_var(&self.binary)).is_some()
    }
}

fn oauth_env_var(binary: &str) -> String {
    format!("{}_OAUTH_TOKEN", binary.to_ascii_uppercase())
}

fn which_on_path(binary: &str) -> bool {
    std::env::var_os("PATH").is_some_and(|paths| {
        std::env::split_paths(&paths).any(|dir| dir.join(binary).is_file())
    })
}

async fn run_cli(binary: &str, args: &[&str]) -> Result<String, LlmCliError> {
    let output = Command::new(binary)
        .args(args)
        .output()
        .await
        .map_err(|source| LlmCliError::Spawn { binary: binary.to_string(), source })?;

    if !output.status.success() {
        return Err(LlmCliError::NonZeroExit {
            binary: binary.to_string(),
            status: output.status.code().unwrap_or(-1),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

async fn probe_via_version(binary: &str) -> ProviderHealth {
    match Command::new(binary).arg("--version").output().await {
        Ok(output) if output.status.success() => ProviderHealth::Healthy,
        Ok(_) => ProviderHealth::Unavailable,
        Err(_) => ProviderHealth::Unavailable,
    }
}

/// Resolve which CLI to dispatch with for `model`, honoring
/// `SUPERVISOR_PREFER_OAUTH` / `SUPERVISOR_CLI` (spec.md §6, §9).
pub fn select_cli(model: ModelTier, prefer_oauth: bool, cli_override: Option<&str>) -> Box<dyn LlmCli> {
    if let Some(name) = cli_override {
        return match name {
            "opencode" => Box::new(MultiProviderCli::new("opencode")),
            "claude" => Box::new(NativeCli::new("claude")),
            other => Box::new(MultiProviderCli::new(other.to_string())),
        };
    }

    let native = NativeCli::default();
    if prefer_oauth && native.has_oauth_for(model) {
        Box::new(native)
    } else {
        Box::new(MultiProviderCli::default())
    }
}

#[cfg(any(test, feature = "test-support"))]
pub mod fake {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    /// One recorded invocation.
    #[derive(Debug, Clone)]
    pub struct LlmCall {
        pub prompt: String,
        pub model: ModelTier,
    }

    /// A scripted [`LlmCli`] for hermetic tests: returns a fixed response
    /// (or error) and records every call.
    pub struct FakeLlmCli {
        calls: Arc<Mutex<Vec<LlmCall>>>,
        response: Result<String, String>,
        health: ProviderHealth,
        oauth: bool,
    }

    impl FakeLlmCli {
        pub fn succeeding(response: impl Into<String>) -> Self {
            Self {
                calls: Arc::new(Mutex::new(Vec::new())),
                response: Ok(response.into()),
                health: ProviderHealth::Healthy,
                oauth: false,
            }
        }

        pub fn failing(message: impl Into<String>) -> Self {
            Self {
                calls: Arc::new(Mutex::new(Vec::new())),
                response: Err(message.into()),
                health: ProviderHealth::Healthy,
                oauth: false,
            }
        }

        pub fn with_health(mut self, health: ProviderHealth) -> Self {
            self.health = health;
            self
        }

        pub fn with_oauth(mut self, oauth: bool) -> Self {
            self.oauth = oauth;
            self
        }

        pub fn calls(&self) -> Vec<LlmCall> {
            self.calls.lock().clone()
        }
    }

    #[async_trait]
    impl LlmCli for FakeLlmCli {
        async fn run(&self, prompt: &str, model: ModelTier, _mcp_config: Option<&std::path::Path>) -> Result<String, LlmCliError> {
            self.calls.lock().push(LlmCall { prompt: prompt.to_string(), model });
            self.response.clone().map_err(|stderr| LlmCliError::NonZeroExit {
                binary: "fake".to_string(),
                status: 1,
                stderr,
            })
        }

        async fn probe_health(&self) -> ProviderHealth {
            self.health
        }

        fn has_oauth_for(&self, _model: ModelTier) -> bool {
            self.oauth
        }
    }
}

#[cfg(test)]
#[path = "llm_tests.rs"]
mod tests;
