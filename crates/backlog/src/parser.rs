// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Markdown backlog line grammar (spec.md §6):
//! `- [ ] <id> <title> … #tag … key:value … — notes`.

use crate::entry::{BacklogEntry, ProposedMarker};
use regex::Regex;
use std::sync::LazyLock;

static TASK_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*-\s*\[( |x|X)\]\s*(\S+)\s+(.*)$").expect("valid regex"));

static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"#([A-Za-z0-9_-]+)").expect("valid regex"));

static KEY_VALUE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(assignee|started|blocked-by|model|pr|ref):(\S+)").expect("valid regex"));

static TIME_ESTIMATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"~(\d+h)?(\d+m)?\b").expect("valid regex"));

static PROPOSED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[proposed:([^\]]*)\]").expect("valid regex"));

/// Parse every recognized task line in `text`. Lines that don't match the
/// `- [ ] <id> ...` shape (section headers, prose, blank lines) are
/// silently skipped — the grammar only scopes the fields the core reads
/// (spec.md §1 non-goals).
pub fn parse_backlog(text: &str) -> Vec<BacklogEntry> {
    text.lines().filter_map(parse_line).collect()
}

pub fn parse_line(line: &str) -> Option<BacklogEntry> {
    let caps = TASK_LINE.captures(line)?;
    let checked = matches!(&caps[1], "x" | "X");
    let id = caps[2].to_string();
    let mut rest = caps[3].to_string();

    let proposed = PROPOSED.captures(&rest).map(|c| {
        let body = c.get(1).map(|m| m.as_str()).unwrap_or("");
        let marker = ProposedMarker {
            auto_dispatch: body.contains("auto-dispatch"),
            model: KEY_VALUE
                .captures(body)
                .filter(|kv| &kv[1] == "model")
                .map(|kv| kv[2].to_string())
                .or_else(|| {
                    body.split_whitespace()
                        .find_map(|tok| tok.strip_prefix("model:").map(str::to_string))
                }),
        };
        marker
    });
    rest = PROPOSED.replace(&rest, "").to_string();

    let (notes_part, body_part) = match rest.split_once('\u{2014}') {
        Some((body, notes)) => (Some(notes.trim().to_string()), body.to_string()),
        None => (None, rest.clone()),
    };

    let tags: Vec<String> = TAG.captures_iter(&body_part).map(|c| c[1].to_string()).collect();

    let mut assignee = None;
    let mut started = None;
    let mut blocked_by = Vec::new();
    let mut model = None;
    let mut pr = None;
    let mut reference = None;
    for kv in KEY_VALUE.captures_iter(&body_part) {
        let key = &kv[1];
        let value = kv[2].to_string();
        match key {
            "assignee" => assignee = Some(value),
            "started" => started = Some(value),
            "blocked-by" => blocked_by = value.split(',').map(str::to_string).collect(),
            "model" => model = Some(value),
            "pr" => pr = Some(value),
            "ref" => reference = Some(value),
            _ => {}
        }
    }

    let time_estimate = TIME_ESTIMATE
        .find(&body_part)
        .map(|m| m.as_str().to_string())
        .filter(|s| s.len() > 1);

    let mut title = body_part.clone();
    for re in [&*TAG, &*KEY_VALUE, &*TIME_ESTIMATE] {
        title = re.replace_all(&title, "").to_string();
    }
    let title = title.split_whitespace().collect::<Vec<_>>().join(" ");

    Some(BacklogEntry {
        id,
        title,
        checked,
        tags,
        assignee,
        started,
        blocked_by,
        model,
        time_estimate,
        pr,
        reference,
        proposed,
        notes: notes_part,
        raw_line: line.to_string(),
    })
}

#[cfg(test)]
#[path = "parser_tests.rs"]
mod tests;
