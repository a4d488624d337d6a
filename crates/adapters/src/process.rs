// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The worker lifecycle file-based protocol (spec.md §4.3 "Worker spawn",
//! §6 "Worker lifecycle"): a wrapper/dispatch shell-script pair per
//! dispatch, and descendant-process-tree cleanup on wrapper exit.

use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tokio::process::{Child, Command};

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("failed to write {path}: {source}")]
    Write { path: PathBuf, #[source] source: std::io::Error },
    #[error("failed to spawn wrapper: {0}")]
    Spawn(#[source] std::io::Error),
}

/// The file set for one dispatch attempt (spec.md §6). Filenames carry a
/// timestamp suffix so a rapid second dispatch of the same task cannot
/// clobber a still-running first attempt's scripts.
#[derive(Debug, Clone)]
pub struct WorkerPaths {
    pub pid_file: PathBuf,
    pub dispatch_script: PathBuf,
    pub wrapper_script: PathBuf,
    pub log_file: PathBuf,
}

impl WorkerPaths {
    pub fn new(dir: &Path, task_id: &str, at_ms: i64, retry: Option<u32>) -> Self {
        let suffix = match retry {
            Some(n) => format!("-retry{n}-{at_ms}"),
            None => format!("-{at_ms}"),
        };
        Self {
            pid_file: dir.join(format!("{task_id}.pid")),
            dispatch_script: dir.join(format!("{task_id}-dispatch{suffix}.sh")),
            wrapper_script: dir.join(format!("{task_id}-wrapper{suffix}.sh")),
            log_file: dir.join(format!("{task_id}{suffix}.log")),
        }
    }
}

/// Render the dispatch script: writes `WORKER_STARTED`, then `exec`s the
/// CLI invocation (spec.md §4.3).
pub fn render_dispatch_script(cli_binary: &str, args: &[String]) -> String {
    let quoted: Vec<String> = args.iter().map(|a| shell_quote(a)).collect();
    format!(
        "#!/usr/bin/env bash\nset -euo pipefail\necho \"WORKER_STARTED $(date -u +%Y-%m-%dT%H:%M:%SZ)\"\nexec {} {}\n",
        shell_quote(cli_binary),
        quoted.join(" "),
    )
}

/// Render the wrapper script (spec.md §4.3):
/// - writes `WRAPPER_STARTED` before invoking the dispatch script;
/// - runs the dispatch script, redirecting both streams to the log file;
/// - forks a heartbeat child emitting a timestamped `HEARTBEAT` line every
///   `heartbeat_interval_secs`;
/// - on EXIT/INT/TERM (not KILL, which cannot be trapped), recursively
///   kills its own descendant process tree.
pub fn render_wrapper_script(dispatch_script: &Path, log_file: &Path, pid_file: &Path, heartbeat_interval_secs: u64) -> String {
    format!(
        r#"#!/usr/bin/env bash
set -uo pipefail
echo $$ > {pid_file}

cleanup() {{
    local root=$$
    local pids
    pids=$(pgrep -P "$root" 2>/dev/null || true)
    if [ -n "$pids" ]; then
        kill -TERM $pids 2>/dev/null || true
        sleep 2
        pids=$(pgrep -P "$root" 2>/dev/null || true)
        [ -n "$pids" ] && kill -KILL $pids 2>/dev/null || true
    fi
}}
trap cleanup EXIT INT TERM

echo "WRAPPER_STARTED $(date -u +%Y-%m-%dT%H:%M:%SZ)" >> {log_file}

(
    while true; do
        sleep {heartbeat_interval_secs}
        echo "HEARTBEAT: $(date -u +%Y-%m-%dT%H:%M:%SZ) worker still running" >> {log_file}
    done
) &

{dispatch_script} >> {log_file} 2>&1
rc=$?
echo "EXIT:$rc" >> {log_file}
exit $rc
"#,
        pid_file = shell_quote(&pid_file.display().to_string()),
        log_file = shell_quote(&log_file.display().to_string()),
        dispatch_script = shell_quote(&dispatch_script.display().to_string()),
        heartbeat_interval_secs = heartbeat_interval_secs,
    )
}

fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', "'\\''"))
}

/// Write the dispatch and wrapper scripts to disk with executable
/// permissions, without spawning anything yet.
pub fn write_scripts(paths: &WorkerPaths, dispatch_body: &str, wrapper_body: &str) -> Result<(), ProcessError> {
    write_executable(&paths.dispatch_script, dispatch_body)?;
    write_executable(&paths.wrapper_script, wrapper_body)?;
    Ok(())
}

#[cfg(unix)]
fn write_executable(path: &Path, body: &str) -> Result<(), ProcessError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::write(path, body).map_err(|source| ProcessError::Write { path: path.to_path_buf(), source })?;
    let mut perms = std::fs::metadata(path)
        .map_err(|source| ProcessError::Write { path: path.to_path_buf(), source })?
        .permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(path, perms).map_err(|source| ProcessError::Write { path: path.to_path_buf(), source })
}

#[cfg(not(unix))]
fn write_executable(path: &Path, body: &str) -> Result<(), ProcessError> {
    std::fs::write(path, body).map_err(|source| ProcessError::Write { path: path.to_path_buf(), source })
}

/// Spawn the wrapper script as a detached child process.
pub async fn spawn_wrapper(wrapper_script: &Path) -> Result<Child, ProcessError> {
    Command::new(wrapper_script)
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .spawn()
        .map_err(ProcessError::Spawn)
}

/// Returns true if a wrapper hasn't emitted a heartbeat (or
/// `WORKER_STARTED`, if none yet) in at least `hung_timeout` (spec.md §4.3
/// "Heartbeat and hang detection").
pub fn is_hung(last_activity_at_ms: i64, now_ms: i64, hung_timeout: Duration) -> bool {
    let elapsed_ms = now_ms.saturating_sub(last_activity_at_ms);
    elapsed_ms >= hung_timeout.as_millis() as i64
}

/// The per-task hung timeout: `2 × time estimate`, clamped to `[30min, 4h]`
/// (spec.md §4.3).
pub fn hung_timeout(time_estimate: Option<Duration>) -> Duration {
    const MIN: Duration = Duration::from_secs(30 * 60);
    const MAX: Duration = Duration::from_secs(4 * 60 * 60);
    match time_estimate {
        Some(estimate) => (estimate * 2).clamp(MIN, MAX),
        None => MIN,
    }
}

/// Send `SIGTERM` to a wrapper's process group so its own EXIT trap runs
/// the descendant-tree cleanup (spec.md §5 "Cancellation").
pub fn signal_wrapper(pid: i32, signal_kind: Signal) -> nix::Result<()> {
    signal::kill(Pid::from_raw(pid), signal_kind)
}

#[cfg(test)]
#[path = "process_tests.rs"]
mod tests;
