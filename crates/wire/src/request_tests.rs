// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn create_job_round_trips() {
    let request = Request::CreateJob {
        idempotency_key: "league-42-game-7".into(),
        name: "game 7".into(),
        stream: StreamConfig { stream_key: "rtmp-key".into(), name: "game 7".into(), ..Default::default() },
        restart_policy: RestartPolicy::OnFailure,
        expires_at_ms: Some(1_700_000_000_000),
    };
    let json = serde_json::to_string(&request).unwrap();
    let back: Request = serde_json::from_str(&json).unwrap();
    assert_eq!(back, request);
}

#[test]
fn restart_policy_defaults_to_never() {
    let json = r#"{"type":"CreateJob","idempotency_key":"k","name":"n","stream":{"stream_key":"s","name":"n"}}"#;
    let request: Request = serde_json::from_str(json).unwrap();
    match request {
        Request::CreateJob { restart_policy, expires_at_ms, .. } => {
            assert_eq!(restart_policy, RestartPolicy::Never);
            assert_eq!(expires_at_ms, None);
        }
        other => panic!("unexpected request: {:?}", other),
    }
}

#[test]
fn simple_requests_round_trip() {
    for request in [
        Request::Ping,
        Request::ListAgents,
        Request::Subscribe,
        Request::SetAgentDrain { id: "cam-01".into(), drain: true },
        Request::DismissJob { id: "job-1".into() },
    ] {
        let json = serde_json::to_string(&request).unwrap();
        let back: Request = serde_json::from_str(&json).unwrap();
        assert_eq!(back, request);
    }
}

#[test]
fn unknown_request_type_is_an_error() {
    let json = r#"{"type":"Bogus"}"#;
    assert!(serde_json::from_str::<Request>(json).is_err());
}
