// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! AI-assisted self-heal decision points (spec.md §4.5, §9): wherever a
//! small model could refine an eligibility / escalation / description
//! decision, the call sits behind [`HealAdvisor`] with a ≤60s budget and a
//! deterministic fallback on any failure, empty, or malformed response —
//! tests exercise [`DeterministicAdvisor`] directly, never a live process.

use crate::self_heal::{self, FailureNature, SelfHealAction, SelfHealFacts};
use async_trait::async_trait;
use sv_adapters::llm::LlmCli;
use sv_core::task::{ModelTier, Task};
use tokio::time::{timeout, Duration};

const AI_BUDGET: Duration = Duration::from_secs(60);

/// Advice for one failed task's self-heal decision. Mirrors
/// [`SelfHealAction`]'s shape but is the advisor's opinion, not the final
/// word — the caller still applies [`self_heal::decide`]'s gating (budgets,
/// non-retryable keys, existing live diagnostics) on top.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealAdvice {
    pub nature: FailureNature,
    /// A refined diagnostic-subtask description, if the advisor thinks one
    /// is warranted and can do better than the deterministic template.
    pub diagnostic_description: Option<String>,
}

#[async_trait]
pub trait HealAdvisor: Send + Sync {
    async fn advise(&self, task: &Task, facts: &SelfHealFacts, failure_log_tail: &str) -> HealAdvice;
}

/// Static-rule fallback: always used when no AI advisor is configured, or
/// when the AI path fails/times out/returns garbage (spec.md §9).
pub struct DeterministicAdvisor;

#[async_trait]
impl HealAdvisor for DeterministicAdvisor {
    async fn advise(&self, task: &Task, facts: &SelfHealFacts, failure_log_tail: &str) -> HealAdvice {
        HealAdvice {
            nature: self_heal::classify_failure_nature(facts.outcome),
            diagnostic_description: Some(self_heal::build_diagnostic_description(task, failure_log_tail)),
        }
    }
}

/// Small-model-backed advisor: asks the configured [`LlmCli`] for a
/// capability-vs-infrastructure verdict and (if warranted) a diagnostic
/// description, bounded to [`AI_BUDGET`] and falling back to
/// [`DeterministicAdvisor`] on any failure.
pub struct CliAdvisor<C: LlmCli> {
    cli: C,
    tier: ModelTier,
    fallback: DeterministicAdvisor,
}

impl<C: LlmCli> CliAdvisor<C> {
    pub fn new(cli: C, tier: ModelTier) -> Self {
        Self { cli, tier, fallback: DeterministicAdvisor }
    }
}

#[async_trait]
impl<C: LlmCli + Sync> HealAdvisor for CliAdvisor<C> {
    async fn advise(&self, task: &Task, facts: &SelfHealFacts, failure_log_tail: &str) -> HealAdvice {
        let prompt = format!(
            "A worker on task {} failed with outcome `{}`. Failure log tail:\n{}\n\n\
Answer with exactly one line: `capability` if this looks like the model's own reasoning \
or implementation fell short, or `infrastructure` if this looks like a transient \
environment/network/provider problem.",
            task.id, facts.outcome, failure_log_tail
        );
        let result = timeout(AI_BUDGET, self.cli.run(&prompt, self.tier, None)).await;
        let Ok(Ok(raw)) = result else {
            return self.fallback.advise(task, facts, failure_log_tail).await;
        };
        match parse_nature_verdict(&raw) {
            Some(nature) => HealAdvice {
                nature,
                diagnostic_description: Some(self_heal::build_diagnostic_description(task, failure_log_tail)),
            },
            None => self.fallback.advise(task, facts, failure_log_tail).await,
        }
    }
}

fn parse_nature_verdict(raw: &str) -> Option<FailureNature> {
    let trimmed = raw.trim().to_ascii_lowercase();
    if trimmed.contains("infrastructure") {
        Some(FailureNature::Infrastructure)
    } else if trimmed.contains("capability") {
        Some(FailureNature::Capability)
    } else {
        None
    }
}

/// Combine an advisor's opinion with the deterministic gating in
/// [`self_heal::decide`]: the advisor only ever refines the *nature*
/// classification inside the capability branch, never bypasses the hard
/// gates (policy block, prompt-repeat-once, escalation budget).
pub fn apply_advice(facts: &SelfHealFacts, advice: &HealAdvice) -> SelfHealAction {
    let base = self_heal::decide(facts);
    if base == SelfHealAction::RequeueUnchanged || matches!(base, SelfHealAction::Escalate(_) | SelfHealAction::Diagnostic) {
        if matches!(advice.nature, FailureNature::Infrastructure) {
            return SelfHealAction::RequeueUnchanged;
        }
    }
    base
}

#[cfg(test)]
#[path = "ai_tests.rs"]
mod tests;
