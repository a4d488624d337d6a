// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Upstream code-forge CLI (spec.md §6): viewing PR state, creating/editing
//! issues and PRs, listing open issues by label. Every call is wrapped in a
//! short timeout and treated as best-effort — failures degrade to
//! [`ForgeOutcome::Unknown`] rather than propagating to the pulse.

use async_trait::async_trait;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Best-effort outcome of a forge call: a real `gh` process failure, a
/// timeout, and a clean failure exit code are all folded into `Unknown`
/// rather than surfaced as an error (spec.md §6).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForgeOutcome<T> {
    Known(T),
    Unknown,
}

impl<T> ForgeOutcome<T> {
    pub fn known(self) -> Option<T> {
        match self {
            ForgeOutcome::Known(v) => Some(v),
            ForgeOutcome::Unknown => None,
        }
    }
}

/// State of an upstream pull request, as reported by the forge CLI.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PrState {
    pub merged: bool,
    pub closed: bool,
    pub changed_files: u32,
}

/// An open issue, as listed by label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueRef {
    pub number: u64,
    pub title: String,
    pub labels: Vec<String>,
}

#[async_trait]
pub trait ForgeCli: Send + Sync {
    async fn pr_state(&self, repo: &std::path::Path, pr_url: &str) -> ForgeOutcome<PrState>;
    async fn create_issue(&self, repo: &std::path::Path, title: &str, body: &str, labels: &[String]) -> ForgeOutcome<u64>;
    async fn close_issue(&self, repo: &std::path::Path, number: u64, comment: Option<&str>) -> ForgeOutcome<()>;
    async fn list_issues_by_label(&self, repo: &std::path::Path, label: &str) -> ForgeOutcome<Vec<IssueRef>>;
}

/// `gh`-backed forge adapter.
pub struct GhForgeCli {
    binary: String,
    timeout: Duration,
}

impl Default for GhForgeCli {
    fn default() -> Self {
        Self { binary: "gh".to_string(), timeout: DEFAULT_TIMEOUT }
    }
}

impl GhForgeCli {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn run(&self, repo: &std::path::Path, args: &[&str]) -> Option<String> {
        let call = Command::new(&self.binary).args(args).current_dir(repo).output();
        match timeout(self.timeout, call).await {
            Ok(Ok(output)) if output.status.success() => {
                Some(String::from_utf8_lossy(&output.stdout).into_owned())
            }
            Ok(Ok(output)) => {
                tracing::warn!(
                    status = ?output.status.code(),
                    stderr = %String::from_utf8_lossy(&output.stderr),
                    "gh call failed"
                );
                None
            }
            Ok(Err(error)) => {
                tracing::warn!(%error, "failed to spawn gh");
                None
            }
            Err(_) => {
                tracing::warn!(?args, "gh call timed out");
                None
            }
        }
    }
}

#[async_trait]
impl ForgeCli for GhForgeCli {
    async fn pr_state(&self, repo: &std::path::Path, pr_url: &str) -> ForgeOutcome<PrState> {
        let args = ["pr", "view", pr_url, "--json", "mergedAt,closed,changedFiles"];
        let Some(stdout) = self.run(repo, &args).await else {
            return ForgeOutcome::Unknown;
        };
        let Ok(json) = serde_json::from_str::<serde_json::Value>(&stdout) else {
            return ForgeOutcome::Unknown;
        };
        ForgeOutcome::Known(PrState {
            merged: json.get("mergedAt").is_some_and(|v| !v.is_null()),
            closed: json.get("closed").and_then(|v| v.as_bool()).unwrap_or(false),
            changed_files: json.get("changedFiles").and_then(|v| v.as_u64()).unwrap_or(0) as u32,
        })
    }

    async fn create_issue(&self, repo: &std::path::Path, title: &str, body: &str, labels: &[String]) -> ForgeOutcome<u64> {
        let label_arg = labels.join(",");
        let mut args = vec!["issue", "create", "--title", title, "--body", body];
        if !labels.is_empty() {
            args.push("--label");
            args.push(&label_arg);
        }
        let Some(stdout) = self.run(repo, &args).await else {
            return ForgeOutcome::Unknown;
        };
        match stdout.trim().rsplit('/').next().and_then(|n| n.parse().ok()) {
            Some(number) => ForgeOutcome::Known(number),
            None => ForgeOutcome::Unknown,
        }
    }

    async fn close_issue(&self, repo: &std::path::Path, number: u64, comment: Option<&str>) -> ForgeOutcome<()> {
        let number_str = number.to_string();
        let mut args = vec!["issue", "close", &number_str];
        if let Some(comment) = comment {
            args.push("--comment");
            args.push(comment);
        }
        match self.run(repo, &args).await {
            Some(_) => ForgeOutcome::Known(()),
            None => ForgeOutcome::Unknown,
        }
    }

    async fn list_issues_by_label(&self, repo: &std::path::Path, label: &str) -> ForgeOutcome<Vec<IssueRef>> {
        let args = ["issue", "list", "--label", label, "--json", "number,title,labels"];
        let Some(stdout) = self.run(repo, &args).await else {
            return ForgeOutcome::Unknown;
        };
        let Ok(json) = serde_json::from_str::<Vec<serde_json::Value>>(&stdout) else {
            return ForgeOutcome::Unknown;
        };
        let issues = json
            .iter()
            .map(|entry| IssueRef {
                number: entry.get("number").and_then(|v| v.as_u64()).unwrap_or(0),
                title: entry.get("title").and_then(|v| v.as_str()).unwrap_or_default().to_string(),
                labels: entry
                    .get("labels")
                    .and_then(|v| v.as_array())
                    .map(|arr| {
                        arr.iter()
                            .filter_map(|l| l.get("name").and_then(|n| n.as_str()).map(str::to_string))
                            .collect()
                    })
                    .unwrap_or_default(),
            })
            .collect();
        ForgeOutcome::Known(issues)
    }
}

#[cfg(any(test, feature = "test-support"))]
pub mod fake {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::sync::Arc;

    /// Scripted forge adapter for hermetic tests.
    #[derive(Default)]
    pub struct FakeForgeCli {
        pr_states: Arc<Mutex<HashMap<String, PrState>>>,
        issues: Arc<Mutex<Vec<IssueRef>>>,
        closed: Arc<Mutex<Vec<u64>>>,
    }

    impl FakeForgeCli {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn set_pr_state(&self, pr_url: &str, state: PrState) {
            self.pr_states.lock().insert(pr_url.to_string(), state);
        }

        pub fn set_issues(&self, issues: Vec<IssueRef>) {
            *self.issues.lock() = issues;
        }

        pub fn closed_issues(&self) -> Vec<u64> {
            self.closed.lock().clone()
        }
    }

    #[async_trait]
    impl ForgeCli for FakeForgeCli {
        async fn pr_state(&self, _repo: &std::path::Path, pr_url: &str) -> ForgeOutcome<PrState> {
            match self.pr_states.lock().get(pr_url) {
                Some(state) => ForgeOutcome::Known(state.clone()),
                None => ForgeOutcome::Unknown,
            }
        }

        async fn create_issue(&self, _repo: &std::path::Path, _title: &str, _body: &str, _labels: &[String]) -> ForgeOutcome<u64> {
            let number = self.issues.lock().len() as u64 + 1;
            ForgeOutcome::Known(number)
        }

        async fn close_issue(&self, _repo: &std::path::Path, number: u64, _comment: Option<&str>) -> ForgeOutcome<()> {
            self.closed.lock().push(number);
            ForgeOutcome::Known(())
        }

        async fn list_issues_by_label(&self, _repo: &std::path::Path, label: &str) -> ForgeOutcome<Vec<IssueRef>> {
            ForgeOutcome::Known(
                self.issues.lock().iter().filter(|i| i.labels.iter().any(|l| l == label)).cloned().collect(),
            )
        }
    }
}

#[cfg(test)]
#[path = "forge_tests.rs"]
mod tests;
