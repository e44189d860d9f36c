// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::id::JobId;

#[test]
fn set_timer_serializes_duration_as_millis() {
    let effect = Effect::SetTimer {
        id: TimerId::from_string("restart:job-1"),
        duration: Duration::from_secs(2),
    };
    let json = serde_json::to_value(&effect).unwrap();
    assert_eq!(json["SetTimer"]["duration"], 2000);

    let back: Effect = serde_json::from_value(json).unwrap();
    assert_eq!(back, effect);
}

#[test]
fn fields_include_agent_and_job() {
    let effect = Effect::SendToAgent {
        agent_id: AgentId::new("cam-01"),
        command: AgentCommand::StopOrphan { job_id: JobId::from_string("job-9") },
    };
    let fields = effect.fields();
    assert!(fields.contains(&("agent_id", "cam-01".to_string())));
    assert!(fields.contains(&("job_id", "job-9".to_string())));
    assert_eq!(effect.name(), "send_to_agent");
}

#[test]
fn signal_effects_are_terse() {
    let emit = Effect::Emit { event: Event::Shutdown };
    assert!(!emit.verbose());
    let send = Effect::SendToAgent {
        agent_id: AgentId::new("cam-01"),
        command: AgentCommand::StopOrphan { job_id: JobId::from_string("job-9") },
    };
    assert!(send.verbose());
}
