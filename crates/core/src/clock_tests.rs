// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::time::Duration;

#[test]
fn fake_clock_advances_both_instant_and_epoch() {
    let clock = FakeClock::new();
    let start = clock.now();
    let start_ms = clock.epoch_ms();

    clock.advance(Duration::from_secs(60));

    assert_eq!(clock.now(), start + Duration::from_secs(60));
    assert_eq!(clock.epoch_ms(), start_ms + 60_000);
}

#[test]
fn fake_clock_set_epoch_ms_is_independent_of_instant() {
    let clock = FakeClock::new();
    let before = clock.now();
    clock.set_epoch_ms(0);
    assert_eq!(clock.epoch_ms(), 0);
    assert_eq!(clock.now(), before);
}

#[test]
fn system_clock_epoch_is_monotonic_non_decreasing() {
    let clock = SystemClock;
    let a = clock.epoch_ms();
    let b = clock.epoch_ms();
    assert!(b >= a);
}
