// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use sc_core::{FakeClock, JobId};

fn registry() -> (Arc<ConnectionRegistry<FakeClock>>, FakeClock) {
    let clock = FakeClock::new();
    (ConnectionRegistry::new(clock.clone(), Duration::from_secs(15)), clock)
}

#[test]
fn register_supersedes_previous_generation() {
    let (registry, _clock) = registry();
    let id = AgentId::new("cam-01");

    let (tx1, _rx1) = ConnectionRegistry::<FakeClock>::outbound_channel();
    let gen1 = registry.register(id.clone(), tx1);
    assert!(registry.is_current(&id, gen1));

    let (tx2, _rx2) = ConnectionRegistry::<FakeClock>::outbound_channel();
    let gen2 = registry.register(id.clone(), tx2);

    assert!(gen2 > gen1);
    assert!(!registry.is_current(&id, gen1), "old generation must be stale");
    assert!(registry.is_current(&id, gen2));
}

#[test]
fn disconnect_of_stale_generation_is_ignored() {
    let (registry, _clock) = registry();
    let id = AgentId::new("cam-01");

    let (tx1, _rx1) = ConnectionRegistry::<FakeClock>::outbound_channel();
    let gen1 = registry.register(id.clone(), tx1);
    let (tx2, _rx2) = ConnectionRegistry::<FakeClock>::outbound_channel();
    let gen2 = registry.register(id.clone(), tx2);

    // The superseded connection's teardown must not take down the new one
    assert!(!registry.disconnect(&id, gen1));
    assert!(registry.is_connected(&id));

    assert!(registry.disconnect(&id, gen2));
    assert!(!registry.is_connected(&id));
}

#[test]
fn sweep_expires_silent_sessions() {
    let (registry, clock) = registry();
    let id = AgentId::new("cam-01");
    let (tx, _rx) = ConnectionRegistry::<FakeClock>::outbound_channel();
    let generation = registry.register(id.clone(), tx);

    clock.advance(Duration::from_secs(10));
    assert!(registry.sweep().is_empty(), "still within the deadline");

    clock.advance(Duration::from_secs(6));
    let expired = registry.sweep();
    assert_eq!(expired, vec![id.clone()]);
    assert!(!registry.is_current(&id, generation));
}

#[test]
fn touch_resets_the_deadline() {
    let (registry, clock) = registry();
    let id = AgentId::new("cam-01");
    let (tx, _rx) = ConnectionRegistry::<FakeClock>::outbound_channel();
    let generation = registry.register(id.clone(), tx);

    clock.advance(Duration::from_secs(10));
    registry.touch(&id, generation);
    clock.advance(Duration::from_secs(10));

    assert!(registry.sweep().is_empty(), "heartbeat pushed the deadline out");
}

#[test]
fn touch_from_stale_generation_does_not_keep_session_alive() {
    let (registry, clock) = registry();
    let id = AgentId::new("cam-01");

    let (tx1, _rx1) = ConnectionRegistry::<FakeClock>::outbound_channel();
    let gen1 = registry.register(id.clone(), tx1);
    clock.advance(Duration::from_secs(10));
    let (tx2, _rx2) = ConnectionRegistry::<FakeClock>::outbound_channel();
    let _gen2 = registry.register(id.clone(), tx2);

    clock.advance(Duration::from_secs(10));
    // Stale generation heartbeats must not refresh the new session
    registry.touch(&id, gen1);
    clock.advance(Duration::from_secs(6));

    assert_eq!(registry.sweep().len(), 1);
}

#[test]
fn send_routes_to_current_connection_only() {
    let (registry, _clock) = registry();
    let id = AgentId::new("cam-01");

    let (tx1, mut rx1) = ConnectionRegistry::<FakeClock>::outbound_channel();
    registry.register(id.clone(), tx1);
    let (tx2, mut rx2) = ConnectionRegistry::<FakeClock>::outbound_channel();
    registry.register(id.clone(), tx2);

    let message = DaemonMessage::Command(sc_core::AgentCommand::StopOrphan {
        job_id: JobId::from_string("job-1"),
    });
    assert!(registry.send(&id, message));

    assert!(rx1.try_recv().is_err(), "superseded connection must not receive");
    assert!(rx2.try_recv().is_ok());
}

#[test]
fn send_without_session_is_dropped() {
    let (registry, _clock) = registry();
    let message = DaemonMessage::Command(sc_core::AgentCommand::StopOrphan {
        job_id: JobId::from_string("job-1"),
    });
    assert!(!registry.send(&AgentId::new("ghost"), message));
}
