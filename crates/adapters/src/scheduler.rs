// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Periodic pulse-trigger installation (spec.md §6 "Schedulers"): a
//! platform abstraction with an identical public surface —
//! `install`/`uninstall`/`status` — backed by the user crontab on Linux and
//! a per-user Launch Agent on macOS, selected at compile time by
//! `cfg(target_os)` (matching the teacher's conditional-dependency pattern
//! for `mac-notification-sys`).

use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("failed to run {command}: {source}")]
    Spawn { command: String, #[source] source: std::io::Error },
    #[error("{command} exited non-zero: {stderr}")]
    NonZeroExit { command: String, stderr: String },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleStatus {
    Installed,
    NotInstalled,
}

/// Parameters for installing the periodic pulse trigger.
#[derive(Debug, Clone)]
pub struct ScheduleSpec {
    pub interval_minutes: u32,
    pub batch: Option<String>,
    pub sv_binary: PathBuf,
}

#[async_trait]
pub trait Scheduler: Send + Sync {
    async fn install(&self, spec: &ScheduleSpec) -> Result<(), SchedulerError>;
    async fn uninstall(&self) -> Result<(), SchedulerError>;
    async fn status(&self) -> Result<ScheduleStatus, SchedulerError>;
}

const MARKER: &str = "# sv-supervisor-pulse";

fn pulse_command(spec: &ScheduleSpec) -> String {
    let mut cmd = format!("{} pulse", spec.sv_binary.display());
    if let Some(batch) = &spec.batch {
        cmd.push_str(" --batch ");
        cmd.push_str(batch);
    }
    cmd
}

/// Linux crontab-backed scheduler: edits the user crontab via
/// `crontab -l` / `crontab -` (spec.md §6).
pub struct CrontabScheduler;

impl Default for CrontabScheduler {
    fn default() -> Self {
        Self
    }
}

impl CrontabScheduler {
    pub fn new() -> Self {
        Self
    }

    async fn current_crontab() -> Result<String, SchedulerError> {
        let output = tokio::process::Command::new("crontab").arg("-l").output().await;
        match output {
            Ok(out) if out.status.success() => Ok(String::from_utf8_lossy(&out.stdout).into_owned()),
            // `crontab -l` exits non-zero (and warns) when no crontab exists yet.
            Ok(_) => Ok(String::new()),
            Err(source) => Err(SchedulerError::Spawn { command: "crontab -l".to_string(), source }),
        }
    }

    async fn install_crontab(body: &str) -> Result<(), SchedulerError> {
        use tokio::io::AsyncWriteExt;
        let mut child = tokio::process::Command::new("crontab")
            .arg("-")
            .stdin(std::process::Stdio::piped())
            .spawn()
            .map_err(|source| SchedulerError::Spawn { command: "crontab -".to_string(), source })?;
        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(body.as_bytes()).await?;
        }
        let status = child.wait().await?;
        if !status.success() {
            return Err(SchedulerError::NonZeroExit { command: "crontab -".to_string(), stderr: String::new() });
        }
        Ok(())
    }
}

#[async_trait]
impl Scheduler for CrontabScheduler {
    async fn install(&self, spec: &ScheduleSpec) -> Result<(), SchedulerError> {
        let existing = Self::current_crontab().await?;
        let without_ours: String =
            existing.lines().filter(|line| !line.contains(MARKER)).collect::<Vec<_>>().join("\n");
        let line = format!("*/{} * * * * {} {}", spec.interval_minutes, pulse_command(spec), MARKER);
        let updated = format!("{}\n{}\n", without_ours.trim_end(), line);
        Self::install_crontab(&updated).await
    }

    async fn uninstall(&self) -> Result<(), SchedulerError> {
        let existing = Self::current_crontab().await?;
        let without_ours: String =
            existing.lines().filter(|line| !line.contains(MARKER)).collect::<Vec<_>>().join("\n");
        Self::install_crontab(&format!("{}\n", without_ours.trim_end())).await
    }

    async fn status(&self) -> Result<ScheduleStatus, SchedulerError> {
        let existing = Self::current_crontab().await?;
        if existing.lines().any(|line| line.contains(MARKER)) {
            Ok(ScheduleStatus::Installed)
        } else {
            Ok(ScheduleStatus::NotInstalled)
        }
    }
}

/// macOS Launch Agent-backed scheduler: writes/loads a per-user plist with
/// `WatchPaths` (spec.md §6).
pub struct LaunchdScheduler {
    label: String,
    plist_dir: PathBuf,
}

impl LaunchdScheduler {
    pub fn new(plist_dir: PathBuf) -> Self {
        Self { label: "com.sv-supervisor.pulse".to_string(), plist_dir }
    }

    /// `~/Library/LaunchAgents`, the conventional per-user Launch Agent
    /// directory.
    pub fn default_plist_dir() -> PathBuf {
        dirs::home_dir()
            .map(|home| home.join("Library/LaunchAgents"))
            .unwrap_or_else(|| PathBuf::from("/tmp"))
    }

    fn plist_path(&self) -> PathBuf {
        self.plist_dir.join(format!("{}.plist", self.label))
    }

    fn render_plist(&self, spec: &ScheduleSpec) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
<plist version="1.0">
<dict>
    <key>Label</key>
    <string>{label}</string>
    <key>ProgramArguments</key>
    <array>
        <string>{binary}</string>
        <string>pulse</string>
    </array>
    <key>StartInterval</key>
    <integer>{interval_seconds}</integer>
    <key>RunAtLoad</key>
    <true/>
</dict>
</plist>
"#,
            label = self.label,
            binary = spec.sv_binary.display(),
            interval_seconds = spec.interval_minutes * 60,
        )
    }

    async fn launchctl(&self, args: &[&str]) -> Result<(), SchedulerError> {
        let output = tokio::process::Command::new("launchctl")
            .args(args)
            .output()
            .await
            .map_err(|source| SchedulerError::Spawn { command: "launchctl".to_string(), source })?;
        if !output.status.success() {
            return Err(SchedulerError::NonZeroExit {
                command: "launchctl".to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl Scheduler for LaunchdScheduler {
    async fn install(&self, spec: &ScheduleSpec) -> Result<(), SchedulerError> {
        std::fs::create_dir_all(&self.plist_dir)?;
        std::fs::write(self.plist_path(), self.render_plist(spec))?;
        self.launchctl(&["load", "-w", &self.plist_path().display().to_string()]).await
    }

    async fn uninstall(&self) -> Result<(), SchedulerError> {
        let _ = self.launchctl(&["unload", &self.plist_path().display().to_string()]).await;
        if self.plist_path().exists() {
            std::fs::remove_file(self.plist_path())?;
        }
        Ok(())
    }

    async fn status(&self) -> Result<ScheduleStatus, SchedulerError> {
        if self.plist_path().exists() {
            Ok(ScheduleStatus::Installed)
        } else {
            Ok(ScheduleStatus::NotInstalled)
        }
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
