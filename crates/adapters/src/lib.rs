// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! External-world adapters: the LLM CLI, the code-forge CLI, the worker
//! process protocol, the periodic-pulse scheduler, and desktop
//! notifications (spec.md §6).

pub mod forge;
pub mod llm;
pub mod notify;
pub mod process;
pub mod scheduler;
pub mod worktree;

pub use forge::{ForgeCli, ForgeOutcome, GhForgeCli};
pub use llm::{select_cli, LlmCli, MultiProviderCli, NativeCli, ProviderHealth};
pub use notify::{DesktopNotifyAdapter, NotifyAdapter};
pub use process::{ProcessError, WorkerPaths};
pub use scheduler::{Scheduler, ScheduleSpec, ScheduleStatus};
pub use worktree::WorktreeError;

#[cfg(target_os = "linux")]
pub use scheduler::CrontabScheduler as PlatformScheduler;

#[cfg(target_os = "macos")]
pub use scheduler::LaunchdScheduler as PlatformScheduler;
