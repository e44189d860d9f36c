// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::envelope::Envelope;
use sc_core::AgentId;

fn hello() -> AgentMessage {
    AgentMessage::Hello(AgentHello {
        host: "cam-01.local".into(),
        name: "cam-01".into(),
        slots: 1,
        drain: false,
        active_job: None,
        auth_token: "secret".into(),
        meta: BTreeMap::new(),
    })
}

#[test]
fn hello_serializes_with_kebab_type_tag() {
    let json = serde_json::to_value(hello()).unwrap();
    assert_eq!(json["type"], "hello");
    assert_eq!(json["host"], "cam-01.local");
}

#[test]
fn agent_messages_round_trip() {
    let messages = vec![
        hello(),
        AgentMessage::Heartbeat { metrics: BTreeMap::new() },
        AgentMessage::AssignAck {
            job_id: JobId::from_string("job-1"),
            accepted: false,
            reason: Some("busy".into()),
        },
        AgentMessage::JobUpdate {
            job_id: JobId::from_string("job-1"),
            status: Some(JobStatus::Running),
            metadata: Some(MetadataPatch::at(9).title("live")),
        },
        AgentMessage::JobStopped {
            job_id: JobId::from_string("job-1"),
            status: JobStatus::Failed,
            error: Some(JobError::new("encoder-exit", "ffmpeg exited 1")),
        },
        AgentMessage::ControlAck {
            job_id: JobId::from_string("job-1"),
            control: JobControl::Pause,
            applied: true,
        },
    ];
    for msg in messages {
        let json = serde_json::to_string(&msg).unwrap();
        let back: AgentMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(back, msg);
    }
}

#[test]
fn daemon_command_nests_without_tag_collision() {
    let msg = DaemonMessage::from(AgentCommand::JobControl {
        job_id: JobId::from_string("job-1"),
        control: JobControl::Mute,
    });
    let json = serde_json::to_value(&msg).unwrap();
    assert_eq!(json["type"], "command");
    assert_eq!(json["command"], "job-control");

    let back: DaemonMessage = serde_json::from_value(json).unwrap();
    assert_eq!(back, msg);
}

#[test]
fn envelope_flattens_body_fields() {
    let env = Envelope::from_agent(hello(), AgentId::new("cam-01"), 1234);
    let json = serde_json::to_value(&env).unwrap();
    assert_eq!(json["type"], "hello");
    assert_eq!(json["ts_ms"], 1234);
    assert_eq!(json["agent_id"], "cam-01");
    assert!(json["msg_id"].as_str().is_some_and(|s| s.starts_with("msg-")));

    let back: Envelope<AgentMessage> = serde_json::from_value(json).unwrap();
    assert_eq!(back.body, env.body);
}

#[test]
fn correlation_links_response_to_request() {
    let request = Envelope::new(DaemonMessage::HelloOk(HelloOk {
        heartbeat_interval_ms: 5_000,
        heartbeat_timeout_ms: 15_000,
        stop_grace_ms: 10_000,
        kill_after_ms: 30_000,
    }), 1);
    let response = Envelope::from_agent(
        AgentMessage::Heartbeat { metrics: BTreeMap::new() },
        AgentId::new("cam-01"),
        2,
    )
    .correlated_to(request.msg_id.clone());
    assert_eq!(response.correlation_id, Some(request.msg_id));
}
