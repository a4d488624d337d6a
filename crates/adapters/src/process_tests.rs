// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::time::Duration;

#[test]
fn worker_paths_include_timestamp_suffix() {
    let dir = std::path::Path::new("/tmp/sv");
    let paths = WorkerPaths::new(dir, "t100", 1_700_000_000_000, None);
    assert_eq!(paths.pid_file, dir.join("t100.pid"));
    assert_eq!(paths.dispatch_script, dir.join("t100-dispatch-1700000000000.sh"));
    assert_eq!(paths.wrapper_script, dir.join("t100-wrapper-1700000000000.sh"));
    assert_eq!(paths.log_file, dir.join("t100-1700000000000.log"));
}

#[test]
fn worker_paths_retry_suffix_differs_from_first_attempt() {
    let dir = std::path::Path::new("/tmp/sv");
    let first = WorkerPaths::new(dir, "t100", 1_700_000_000_000, None);
    let retry = WorkerPaths::new(dir, "t100", 1_700_000_001_000, Some(1));
    assert_ne!(first.log_file, retry.log_file);
    assert!(retry.log_file.to_string_lossy().contains("retry1"));
}

#[test]
fn dispatch_script_writes_sentinel_then_execs() {
    let script = render_dispatch_script("claude", &["--model".to_string(), "sonnet".to_string()]);
    assert!(script.contains("WORKER_STARTED"));
    assert!(script.contains("exec 'claude' '--model' 'sonnet'"));
}

#[test]
fn wrapper_script_writes_sentinel_and_traps_signals() {
    let dispatch = std::path::Path::new("/tmp/sv/t100-dispatch-1.sh");
    let log = std::path::Path::new("/tmp/sv/t100-1.log");
    let pid = std::path::Path::new("/tmp/sv/t100.pid");
    let script = render_wrapper_script(dispatch, log, pid, 300);
    assert!(script.contains("WRAPPER_STARTED"));
    assert!(script.contains("trap cleanup EXIT INT TERM"));
    assert!(script.contains("HEARTBEAT"));
    assert!(script.contains("sleep 300"));
}

#[test]
fn shell_quote_escapes_single_quotes() {
    assert_eq!(shell_quote("it's"), "'it'\\''s'");
}

#[test]
fn hung_timeout_clamps_to_bounds() {
    assert_eq!(hung_timeout(None), Duration::from_secs(30 * 60));
    assert_eq!(hung_timeout(Some(Duration::from_secs(60))), Duration::from_secs(30 * 60));
    assert_eq!(hung_timeout(Some(Duration::from_secs(10 * 60 * 60))), Duration::from_secs(4 * 60 * 60));
    assert_eq!(hung_timeout(Some(Duration::from_secs(40 * 60))), Duration::from_secs(80 * 60));
}

#[test]
fn is_hung_detects_elapsed_past_timeout() {
    assert!(is_hung(0, 2_000_000, Duration::from_secs(1)));
    assert!(!is_hung(0, 500, Duration::from_secs(1)));
}

#[test]
fn write_scripts_creates_executable_files() {
    let dir = tempfile::tempdir().expect("tempdir");
    let paths = WorkerPaths::new(dir.path(), "t100", 1, None);
    write_scripts(&paths, "#!/bin/sh\necho hi\n", "#!/bin/sh\necho wrapper\n").expect("writes");
    assert!(paths.dispatch_script.exists());
    assert!(paths.wrapper_script.exists());

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = std::fs::metadata(&paths.wrapper_script).expect("meta").permissions().mode();
        assert_eq!(mode & 0o111, 0o111);
    }
}
