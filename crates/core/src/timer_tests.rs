// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn restart_timer_round_trips() {
    let job_id = JobId::from_string("job-abc");
    let timer = TimerId::restart(&job_id);
    assert_eq!(timer.as_str(), "restart:job-abc");
    assert_eq!(timer.kind(), Some(TimerKind::Restart { job_id: "job-abc" }));
}

#[test]
fn expiry_timer_round_trips() {
    let job_id = JobId::from_string("job-abc");
    let timer = TimerId::expiry(&job_id);
    assert_eq!(timer.kind(), Some(TimerKind::Expiry { job_id: "job-abc" }));
}

#[test]
fn metadata_flush_timer_round_trips() {
    let job_id = JobId::from_string("job-abc");
    let timer = TimerId::metadata_flush(&job_id);
    assert_eq!(timer.kind(), Some(TimerKind::MetadataFlush { job_id: "job-abc" }));
}

#[test]
fn unknown_format_parses_to_none() {
    assert_eq!(TimerKind::parse("bogus:whatever"), None);
    assert_eq!(TimerKind::parse(""), None);
}

#[test]
fn same_job_same_kind_same_id() {
    let job_id = JobId::from_string("job-abc");
    assert_eq!(TimerId::restart(&job_id), TimerId::restart(&job_id));
    assert_ne!(TimerId::restart(&job_id), TimerId::expiry(&job_id));
}
