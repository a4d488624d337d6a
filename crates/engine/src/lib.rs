// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The pulse-cycle engine: wires the pure domain types in `sv-core` and
//! the I/O adapters in `sv-storage`/`sv-backlog`/`sv-adapters` into the
//! supervisor's actual control loop (spec.md §4.3-§4.9).

pub mod ai;
pub mod circuit_breaker;
pub mod dispatch;
pub mod evaluator;
pub mod pulse;
pub mod routines;
pub mod sanity;
pub mod self_heal;

pub use ai::{CliAdvisor, DeterministicAdvisor, HealAdvice, HealAdvisor};
pub use circuit_breaker::CircuitBreakerError;
pub use dispatch::{EligibilityDecision, EligibilityFacts, ModelResolutionInput, ResolvedModel};
pub use evaluator::{EvaluationFacts, LogSentinels, QualityGateInput};
pub use pulse::{run_pulse, NoopAdvancer, PostDispatchAdvancer, PulseReport};
pub use sanity::{BlockerAction, BlockerFacts, SanityFixCounts, StallBreakdown};
pub use self_heal::{SelfHealAction, SelfHealFacts};
