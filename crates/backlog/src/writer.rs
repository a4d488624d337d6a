// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The intake-collaborator write proxy (spec.md §6: "the core writes to
//! the backlog only by proxy of the intake collaborator"). Workers never
//! touch the backlog file directly; the core issues these edits on their
//! behalf for claim release (dispatch §4.3 step 4, sanity check §4.6).
//!
//! Edits are targeted string surgery on the one matching line rather than
//! a full re-serialization, so unrelated formatting/comments in the file
//! are left untouched.

use crate::parser::parse_line;
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

static ASSIGNEE_FIELD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\bassignee:\S+").expect("valid regex"));
static STARTED_FIELD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\bstarted:\S+").expect("valid regex"));
static BLOCKED_BY_FIELD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\bblocked-by:\S+").expect("valid regex"));

/// Strip `assignee:`/`started:` from the line for task `id`, if present.
/// Returns the rewritten text, or `None` if no line for `id` was found.
pub fn strip_claim(text: &str, id: &str) -> Option<String> {
    edit_line(text, id, |line| {
        let line = ASSIGNEE_FIELD.replace(line, "").to_string();
        STARTED_FIELD.replace(&line, "").to_string()
    })
}

/// Append `#tag` to the line for task `id`, unless already present.
pub fn add_tag(text: &str, id: &str, tag: &str) -> Option<String> {
    edit_line(text, id, |line| {
        let entry = parse_line(line);
        let already_tagged = entry.is_some_and(|e| e.tags.iter().any(|t| t == tag));
        if already_tagged {
            line.to_string()
        } else {
            format!("{line} #{tag}")
        }
    })
}

/// Replace the `blocked-by:` list on the line for task `id` with `ids`
/// (or remove the field entirely if `ids` is empty).
pub fn set_blocked_by(text: &str, id: &str, ids: &[String]) -> Option<String> {
    edit_line(text, id, |line| {
        let without = BLOCKED_BY_FIELD.replace(line, "").to_string();
        if ids.is_empty() {
            without
        } else {
            format!("{without} blocked-by:{}", ids.join(","))
        }
    })
}

fn edit_line(text: &str, id: &str, edit: impl Fn(&str) -> String) -> Option<String> {
    let mut found = false;
    let rewritten: Vec<String> = text
        .lines()
        .map(|line| match parse_line(line) {
            Some(entry) if entry.id == id => {
                found = true;
                edit(line)
            }
            _ => line.to_string(),
        })
        .collect();
    found.then(|| rewritten.join("\n"))
}

/// Apply an edit function to the backlog file on disk, in place.
pub fn apply_to_file(path: &Path, edit: impl FnOnce(&str) -> Option<String>) -> std::io::Result<bool> {
    let text = std::fs::read_to_string(path)?;
    match edit(&text) {
        Some(updated) if updated != text => {
            std::fs::write(path, updated)?;
            Ok(true)
        }
        _ => Ok(false),
    }
}

#[cfg(test)]
#[path = "writer_tests.rs"]
mod tests;
