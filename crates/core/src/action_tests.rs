// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[test]
fn normalize_strips_everything_after_first_colon() {
    assert_eq!(normalize_error_key("trivial_output_1kb"), "trivial_output_1kb");
    assert_eq!(normalize_error_key("auth_error: token expired"), "auth_error");
    assert_eq!(normalize_error_key("quota: daily cap: exceeded"), "quota");
}

#[parameterized(
    auth = { "auth_error" },
    auth_with_detail = { "auth_error: bad token" },
    merge_conflict = { "merge_conflict" },
    oom = { "out_of_memory" },
    credits = { "billing_credits_exhausted" },
    backend_quota = { "backend_quota_error" },
    backend_infra = { "backend_infrastructure_error" },
    max_retries = { "max_retries" },
)]
fn non_retryable_keys_block_prompt_repeat(key: &str) {
    assert!(is_non_retryable(key));
}

#[parameterized(
    clean_exit = { "clean_exit_no_signal" },
    trivial = { "trivial_output" },
    rate_limited = { "rate_limited" },
)]
fn retryable_keys_do_not_block_prompt_repeat(key: &str) {
    assert!(!is_non_retryable(key));
}
