// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runtime tests: the coordination scenarios the fleet actually hits.

mod expiry;
mod metadata;
mod restart;
mod scheduling;

use crate::broadcast::EventFanout;
use crate::engine::link::test_support::FakeLink;
use crate::engine::{Executor, Runtime, RuntimeSettings};
use crate::event_bus::EventBus;
use parking_lot::Mutex;
use sc_core::{
    AgentCommand, AgentId, Clock, Event, FakeClock, JobId, JobStatus, RestartPolicy, StreamConfig,
    TimerId,
};
use sc_storage::{MaterializedState, Wal};
use sc_wire::DaemonMessage;
use std::collections::VecDeque;
use std::sync::Arc;
use tempfile::TempDir;

pub(crate) struct TestContext {
    pub runtime: Runtime<FakeLink, FakeClock>,
    pub link: FakeLink,
    pub clock: FakeClock,
    pub state: Arc<Mutex<MaterializedState>>,
    _dir: TempDir,
}

pub(crate) fn setup() -> TestContext {
    let dir = tempfile::tempdir().expect("tempdir");
    let wal = Wal::open(&dir.path().join("events.wal"), 0).expect("wal");
    let (bus, _reader) = EventBus::new(wal);
    let clock = FakeClock::new();
    let link = FakeLink::default();
    let state = Arc::new(Mutex::new(MaterializedState::default()));
    let executor = Executor::new(
        link.clone(),
        Arc::clone(&state),
        EventFanout::new(),
        clock.clone(),
        bus,
    );
    let runtime = Runtime::new(executor, RuntimeSettings::default());
    TestContext { runtime, link, clock, state, _dir: dir }
}

impl TestContext {
    /// Drive an event the way the engine loop would: apply, handle, then
    /// process every cascading result event until the system is stable.
    pub async fn drive(&self, event: Event) {
        let mut queue = VecDeque::from([event]);
        while let Some(event) = queue.pop_front() {
            self.state.lock().apply_event(&event);
            let results = self.runtime.handle_event(event).await.expect("handle_event");
            queue.extend(results);
        }
    }

    pub async fn connect_agent(&self, id: &str) {
        self.connect_agent_with(id, None).await;
    }

    pub async fn connect_agent_with(&self, id: &str, active_job: Option<&str>) {
        self.drive(Event::AgentConnected {
            id: AgentId::new(id),
            name: id.to_string(),
            slots: 1,
            drain: false,
            meta: Default::default(),
            active_job: active_job.map(JobId::from_string),
            at_ms: self.clock.epoch_ms(),
        })
        .await;
    }

    pub async fn create_job(&self, id: &str, policy: RestartPolicy) {
        self.create_job_expiring(id, policy, None).await;
    }

    pub async fn create_job_expiring(
        &self,
        id: &str,
        policy: RestartPolicy,
        expires_at_ms: Option<u64>,
    ) {
        self.drive(Event::JobCreated {
            id: JobId::from_string(id),
            idempotency_key: format!("key-{}", id),
            name: format!("{}-stream", id),
            stream: StreamConfig::default(),
            restart_policy: policy,
            expires_at_ms,
            created_at_ms: self.clock.epoch_ms(),
        })
        .await;
    }

    /// Walk an assigned job through accept -> running, as the agent would.
    pub async fn run_assigned_job(&self, job_id: &str, agent_id: &str) {
        let id = JobId::from_string(job_id);
        let agent = AgentId::new(agent_id);
        let now = self.clock.epoch_ms();
        self.drive(Event::JobAccepted { id: id.clone(), agent_id: agent.clone(), at_ms: now })
            .await;
        self.drive(Event::JobRunning { id, agent_id: agent, at_ms: now }).await;
    }

    pub fn job_status(&self, id: &str) -> JobStatus {
        self.state.lock().jobs[id].status
    }

    pub fn job_agent(&self, id: &str) -> Option<String> {
        self.state.lock().jobs[id].assigned_agent_id.as_ref().map(|a| a.to_string())
    }

    pub fn agent_current_job(&self, id: &str) -> Option<String> {
        self.state.lock().agents[id].current_job_id.as_ref().map(|j| j.to_string())
    }

    pub async fn agent_offline(&self, id: &str) {
        self.drive(Event::AgentOffline { id: AgentId::new(id), at_ms: self.clock.epoch_ms() })
            .await;
    }

    pub async fn fire_timer(&self, id: TimerId) {
        self.drive(Event::TimerFired { id }).await;
    }

    /// Commands of one kind sent to an agent (e.g. every assign-start).
    pub fn commands_to(&self, agent_id: &str, name: &str) -> Vec<AgentCommand> {
        self.link
            .sent_to(agent_id)
            .into_iter()
            .filter_map(|message| match message {
                DaemonMessage::Command(command) if command.name() == name => Some(command),
                _ => None,
            })
            .collect()
    }
}

/// Spawned SendToAgent tasks need a tick of the runtime to land in the
/// fake link.
pub(crate) async fn settle() {
    tokio::task::yield_now().await;
    tokio::task::yield_now().await;
}
