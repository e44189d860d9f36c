// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

use JobStatus::*;

const ALL_STATUSES: [JobStatus; 10] =
    [Created, Pending, Assigned, Accepted, Starting, Running, Stopping, Stopped, Failed, Canceled];

#[parameterized(
    created_to_pending = { Created, Pending },
    pending_to_assigned = { Pending, Assigned },
    assigned_to_accepted = { Assigned, Accepted },
    assigned_back_to_pending = { Assigned, Pending },
    accepted_to_starting = { Accepted, Starting },
    starting_to_running = { Starting, Running },
    accepted_to_running = { Accepted, Running },
    running_to_stopping = { Running, Stopping },
    stopping_to_stopped = { Stopping, Stopped },
    running_to_stopped = { Running, Stopped },
    running_back_to_pending = { Running, Pending },
    pending_to_canceled = { Pending, Canceled },
    running_to_failed = { Running, Failed },
)]
fn legal_edges(from: JobStatus, to: JobStatus) {
    assert!(from.can_transition(to), "{from} -> {to} should be legal");
}

#[parameterized(
    created_to_running = { Created, Running },
    pending_to_running = { Pending, Running },
    pending_to_accepted = { Pending, Accepted },
    stopped_to_pending = { Stopped, Pending },
    failed_to_running = { Failed, Running },
    canceled_to_pending = { Canceled, Pending },
    stopped_to_failed = { Stopped, Failed },
    running_to_created = { Running, Created },
)]
fn illegal_edges(from: JobStatus, to: JobStatus) {
    assert!(!from.can_transition(to), "{from} -> {to} should be illegal");
}

#[test]
fn terminal_statuses_have_no_exits() {
    for from in [Stopped, Failed, Canceled] {
        for to in ALL_STATUSES {
            assert!(!from.can_transition(to), "{from} -> {to} must be illegal");
        }
    }
}

#[test]
fn only_running_accepts_controls() {
    for status in ALL_STATUSES {
        assert_eq!(status.accepts_controls(), status == Running);
    }
}

#[test]
fn advance_rejects_illegal_edge_and_keeps_status() {
    let mut job = Job::builder().status(Pending).build();
    assert!(!job.advance(Running, 2_000_000));
    assert_eq!(job.status, Pending);
    assert_eq!(job.updated_at_ms, 1_000_000);
}

#[test]
fn advance_to_terminal_clears_assignment() {
    let mut job =
        Job::builder().status(Running).assigned_agent_id(AgentId::new("cam-01")).build();
    assert!(job.advance(Failed, 2_000_000));
    assert_eq!(job.status, Failed);
    assert!(job.assigned_agent_id.is_none());
}

#[test]
fn new_job_starts_in_created() {
    let config = JobConfig::builder(JobId::new(), "key-9").name("late show").build();
    let job = Job::new_with_epoch_ms(config, 500);
    assert_eq!(job.status, Created);
    assert_eq!(job.created_at_ms, 500);
    assert_eq!(job.name, "late show");
    assert!(!job.dismissed);
}

#[parameterized(
    pending_past_deadline = { Pending, Some(100), 100, true },
    pending_before_deadline = { Pending, Some(100), 99, false },
    assigned_past_deadline = { Assigned, Some(100), 200, true },
    accepted_is_safe = { Accepted, Some(100), 200, false },
    running_is_safe = { Running, Some(100), 200, false },
    no_deadline = { Pending, None, 1_000_000, false },
)]
fn expiry_window(status: JobStatus, expires: Option<u64>, now_ms: u64, expired: bool) {
    let mut job = Job::builder().status(status).build();
    job.expires_at_ms = expires;
    assert_eq!(job.is_expired(now_ms), expired);
}

mod properties {
    use super::*;
    use proptest::prelude::*;

    fn status_strategy() -> impl Strategy<Value = JobStatus> {
        prop::sample::select(ALL_STATUSES.to_vec())
    }

    proptest! {
        /// Any sequence of attempted transitions keeps the status inside
        /// the legal closure: each applied edge was legal, and once a
        /// terminal status is reached nothing moves again.
        #[test]
        fn random_sequences_stay_in_closure(targets in prop::collection::vec(status_strategy(), 1..40)) {
            let mut job = Job::builder().status(Created).build();
            let mut terminal_seen = false;
            for (i, target) in targets.into_iter().enumerate() {
                let before = job.status;
                let moved = job.advance(target, 1_000_000 + i as u64);
                if terminal_seen {
                    prop_assert!(!moved, "moved out of terminal {before} to {target}");
                }
                if moved {
                    prop_assert!(before.can_transition(target));
                } else {
                    prop_assert_eq!(job.status, before);
                }
                terminal_seen = terminal_seen || job.status.is_terminal();
            }
        }

        /// Dismissal is sticky and never alters the underlying status.
        #[test]
        fn dismiss_commutes_with_redismiss(status in status_strategy()) {
            let mut job = Job::builder().status(status).build();
            if job.is_terminal() {
                job.dismissed = true;
                let before = job.status;
                job.dismissed = true;
                prop_assert_eq!(job.status, before);
                prop_assert!(job.dismissed);
            }
        }
    }
}
