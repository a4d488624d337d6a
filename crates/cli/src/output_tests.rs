// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn apply_limit_truncates_and_reports_remaining() {
    let mut items = vec![1, 2, 3, 4, 5];
    let trunc = apply_limit(&mut items, 3, false).expect("truncated");
    assert_eq!(items, vec![1, 2, 3]);
    assert_eq!(trunc.remaining, 2);
}

#[test]
fn apply_limit_no_limit_keeps_everything() {
    let mut items = vec![1, 2, 3, 4, 5];
    let trunc = apply_limit(&mut items, 1, true);
    assert!(trunc.is_none());
    assert_eq!(items.len(), 5);
}

#[test]
fn apply_limit_under_cap_reports_no_truncation() {
    let mut items = vec![1, 2];
    let trunc = apply_limit(&mut items, 10, false);
    assert!(trunc.is_none());
}

#[test]
fn format_time_ago_buckets_by_unit() {
    assert_eq!(format_time_ago(-1, 10_000), "-");
    assert_eq!(format_time_ago(0, 5_000), "5s");
    assert_eq!(format_time_ago(0, 120_000), "2m");
    assert_eq!(format_time_ago(0, 7_200_000), "2h");
    assert_eq!(format_time_ago(0, 172_800_000), "2d");
}

#[test]
fn handle_list_json_serializes_items() {
    let items = vec!["a".to_string(), "b".to_string()];
    let result = handle_list(OutputFormat::Json, &items, "none", |_items, _w| {});
    assert!(result.is_ok());
}

#[test]
fn handle_list_text_prints_empty_message_when_empty() {
    let items: Vec<String> = vec![];
    let result = handle_list(OutputFormat::Text, &items, "no tasks found", |_items, _w| {
        panic!("render_text should not run for an empty list");
    });
    assert!(result.is_ok());
}
