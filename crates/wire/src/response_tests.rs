// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use sc_core::JobId;

#[test]
fn responses_round_trip() {
    let responses = vec![
        Response::Ok,
        Response::Pong,
        Response::JobCreated { id: "job-1".into(), created: true },
        Response::Status { uptime_secs: 10, jobs_active: 2, agents_online: 3 },
        Response::Error { message: "job job-1 is not running".into() },
        Response::Event {
            event: Event::JobQueued { id: JobId::from_string("job-1"), at_ms: 1 },
        },
    ];
    for response in responses {
        let json = serde_json::to_string(&response).unwrap();
        let back: Response = serde_json::from_str(&json).unwrap();
        assert_eq!(back, response);
    }
}

#[test]
fn error_carries_reason() {
    let json = serde_json::to_value(Response::Error { message: "illegal transition".into() }).unwrap();
    assert_eq!(json["type"], "Error");
    assert_eq!(json["message"], "illegal transition");
}
