// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `sv cron {install|uninstall|status}` (spec.md §6): wires the platform
//! [`Scheduler`] to install/uninstall/inspect the periodic `sv pulse`
//! trigger.

use crate::context::Context;
use clap::Subcommand;
use sv_adapters::scheduler::{ScheduleSpec, ScheduleStatus, Scheduler};

#[derive(Subcommand, Clone)]
pub enum Action {
    Install,
    Uninstall,
    Status,
}

#[cfg(target_os = "macos")]
fn platform_scheduler() -> impl Scheduler {
    sv_adapters::scheduler::LaunchdScheduler::new(sv_adapters::scheduler::LaunchdScheduler::default_plist_dir())
}

#[cfg(not(target_os = "macos"))]
fn platform_scheduler() -> impl Scheduler {
    sv_adapters::scheduler::CrontabScheduler::new()
}

pub async fn run(_ctx: &Context, action: Action, interval: u32, batch: Option<String>) -> anyhow::Result<()> {
    let scheduler = platform_scheduler();
    let sv_binary = std::env::current_exe().unwrap_or_else(|_| "sv".into());
    let spec = ScheduleSpec { interval_minutes: interval, batch, sv_binary };

    match action {
        Action::Install => {
            scheduler.install(&spec).await?;
            println!("installed pulse schedule: every {interval} minute(s)");
        }
        Action::Uninstall => {
            scheduler.uninstall().await?;
            println!("uninstalled pulse schedule");
        }
        Action::Status => match scheduler.status().await? {
            ScheduleStatus::Installed => println!("installed"),
            ScheduleStatus::NotInstalled => println!("not installed"),
        },
    }
    Ok(())
}
