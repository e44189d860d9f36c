// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn backoff_is_exponential_and_capped() {
    assert_eq!(backoff_for_attempt(1), 2_000);
    assert_eq!(backoff_for_attempt(2), 4_000);
    assert_eq!(backoff_for_attempt(3), 8_000);
    assert_eq!(backoff_for_attempt(10), RESTART_BACKOFF_MAX_MS);
    assert_eq!(backoff_for_attempt(u32::MAX), RESTART_BACKOFF_MAX_MS);
}

#[test]
fn backoff_is_monotonic() {
    let mut last = 0;
    for attempt in 1..=20 {
        let backoff = backoff_for_attempt(attempt);
        assert!(backoff >= last, "backoff decreased at attempt {}", attempt);
        last = backoff;
    }
}

#[test]
fn attempts_are_bounded_and_increasing() {
    let mut tracker = RestartTracker::new();
    let job_id = JobId::from_string("job-1");

    let mut seen = Vec::new();
    while let Some((attempt, backoff)) = tracker.begin_attempt(&job_id, 1_000) {
        seen.push((attempt, backoff));
    }

    assert_eq!(seen.len(), MAX_RESTART_ATTEMPTS as usize);
    assert_eq!(seen[0].0, 1);
    assert_eq!(seen[1].0, 2);
    assert_eq!(seen[2].0, 3);
    assert!(seen.windows(2).all(|w| w[0].1 <= w[1].1), "backoff must not decrease");

    // Exhausted: further attempts refused
    assert_eq!(tracker.begin_attempt(&job_id, 2_000), None);
    assert_eq!(tracker.attempts(&job_id), MAX_RESTART_ATTEMPTS);
}

#[test]
fn jobs_are_tracked_independently() {
    let mut tracker = RestartTracker::new();
    let a = JobId::from_string("job-a");
    let b = JobId::from_string("job-b");

    tracker.begin_attempt(&a, 1);
    tracker.begin_attempt(&a, 2);
    tracker.begin_attempt(&b, 3);

    assert_eq!(tracker.attempts(&a), 2);
    assert_eq!(tracker.attempts(&b), 1);
}

#[test]
fn clear_resets_the_budget() {
    let mut tracker = RestartTracker::new();
    let job_id = JobId::from_string("job-1");
    while tracker.begin_attempt(&job_id, 1).is_some() {}
    tracker.clear(&job_id);
    assert_eq!(tracker.attempts(&job_id), 0);
    assert!(tracker.begin_attempt(&job_id, 2).is_some());
}
