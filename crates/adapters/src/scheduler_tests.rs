// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn sample_spec() -> ScheduleSpec {
    ScheduleSpec { interval_minutes: 5, batch: Some("release-1".to_string()), sv_binary: PathBuf::from("/usr/local/bin/sv") }
}

#[test]
fn pulse_command_includes_batch_when_present() {
    let spec = sample_spec();
    assert_eq!(pulse_command(&spec), "/usr/local/bin/sv pulse --batch release-1");
}

#[test]
fn pulse_command_omits_batch_when_absent() {
    let spec = ScheduleSpec { batch: None, ..sample_spec() };
    assert_eq!(pulse_command(&spec), "/usr/local/bin/sv pulse");
}

#[test]
fn default_plist_dir_points_under_library_launch_agents() {
    let dir = LaunchdScheduler::default_plist_dir();
    assert!(dir.ends_with("Library/LaunchAgents") || dir == PathBuf::from("/tmp"));
}

#[test]
fn launchd_plist_renders_interval_in_seconds_and_binary_path() {
    let dir = tempfile::tempdir().expect("tempdir");
    let scheduler = LaunchdScheduler::new(dir.path().to_path_buf());
    let plist = scheduler.render_plist(&sample_spec());
    assert!(plist.contains("<integer>300</integer>"));
    assert!(plist.contains("/usr/local/bin/sv"));
    assert!(plist.contains("com.sv-supervisor.pulse"));
}

#[tokio::test]
async fn launchd_status_reports_not_installed_when_plist_absent() {
    let dir = tempfile::tempdir().expect("tempdir");
    let scheduler = LaunchdScheduler::new(dir.path().to_path_buf());
    assert_eq!(scheduler.status().await.expect("status ok"), ScheduleStatus::NotInstalled);
}

#[tokio::test]
async fn launchd_status_reports_installed_when_plist_present() {
    let dir = tempfile::tempdir().expect("tempdir");
    let scheduler = LaunchdScheduler::new(dir.path().to_path_buf());
    std::fs::write(scheduler.plist_path(), "placeholder").expect("write");
    assert_eq!(scheduler.status().await.expect("status ok"), ScheduleStatus::Installed);
}
