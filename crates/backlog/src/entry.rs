// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! [`BacklogEntry`]: one parsed line of the Markdown backlog (spec.md §6).

/// Two-phase proposal marker: `[proposed:auto-dispatch model:X]`, consumed
/// by the intake collaborator rather than the core itself (spec.md §6).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProposedMarker {
    pub auto_dispatch: bool,
    pub model: Option<String>,
}

/// Classification hint tags recognized by dispatch-eligibility checks
/// (spec.md §6), beyond the generic `#tag` bucket kept in [`BacklogEntry::tags`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassificationHint {
    Plan,
    Investigation,
    Trivial,
    Simple,
    Docs,
    Complex,
    Architecture,
}

impl ClassificationHint {
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "plan" => Some(Self::Plan),
            "investigation" => Some(Self::Investigation),
            "trivial" => Some(Self::Trivial),
            "simple" => Some(Self::Simple),
            "docs" => Some(Self::Docs),
            "complex" => Some(Self::Complex),
            "architecture" => Some(Self::Architecture),
            _ => None,
        }
    }
}

/// One task line from the backlog file (spec.md §6 grammar:
/// `- [ ] <id> <title> … #tag … key:value … — notes`).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BacklogEntry {
    pub id: String,
    pub title: String,
    pub checked: bool,
    pub tags: Vec<String>,
    pub assignee: Option<String>,
    pub started: Option<String>,
    pub blocked_by: Vec<String>,
    pub model: Option<String>,
    pub time_estimate: Option<String>,
    pub pr: Option<String>,
    pub reference: Option<String>,
    pub proposed: Option<ProposedMarker>,
    pub notes: Option<String>,
    /// The exact source line, preserved so the writer can do a targeted
    /// in-place edit instead of re-serializing the whole entry (spec.md §6:
    /// "the core writes to the backlog only by proxy of the intake
    /// collaborator").
    pub raw_line: String,
}

impl BacklogEntry {
    /// Eligible for automatic dispatch per the `#auto-dispatch` tag
    /// (spec.md §6).
    pub fn auto_dispatch(&self) -> bool {
        self.tags.iter().any(|t| t == "auto-dispatch")
    }

    pub fn classification_hints(&self) -> Vec<ClassificationHint> {
        self.tags.iter().filter_map(|t| ClassificationHint::from_tag(t)).collect()
    }

    /// True if the backlog shows an active (non-empty) claim.
    pub fn is_claimed(&self) -> bool {
        self.assignee.is_some()
    }
}
