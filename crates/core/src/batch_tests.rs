// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn auto_max_concurrency_falls_back_to_hard_cap() {
    let batch = Batch::new(BatchId::new(), "b");
    assert_eq!(batch.effective_hard_cap(8), 8);
}

#[test]
fn explicit_max_concurrency_is_capped_by_hard_cap() {
    let mut batch = Batch::new(BatchId::new(), "b");
    batch.max_concurrency = 20;
    assert_eq!(batch.effective_hard_cap(8), 8);
    batch.max_concurrency = 2;
    assert_eq!(batch.effective_hard_cap(8), 2);
}

#[test]
fn release_type_display_and_parse_round_trip() {
    for rt in [ReleaseType::Major, ReleaseType::Minor, ReleaseType::Patch] {
        let parsed: ReleaseType = rt.to_string().parse().expect("parses");
        assert_eq!(parsed, rt);
    }
    assert!("bogus".parse::<ReleaseType>().is_err());
}
