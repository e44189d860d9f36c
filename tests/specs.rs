// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workspace-level specs: daemon, wire protocol, and a scripted agent
//! exercised end to end, in process.

use sc_core::{AgentId, JobStatus, RestartPolicy, StreamConfig};
use sc_daemon::lifecycle::{run_engine, startup, Config, StartupResult};
use sc_daemon::listener::Listener;
use sc_wire::{
    decode, encode, read_message, write_message, ActiveJob, AgentHello, AgentMessage,
    DaemonMessage, Envelope, Request, Response,
};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;
use tokio::net::{TcpStream, UnixStream};

const AUTH_TOKEN: &str = "spec-token";

struct DaemonHandle {
    socket_path: PathBuf,
    agent_addr: std::net::SocketAddr,
    shutdown: tokio_util::sync::CancellationToken,
    engine: tokio::task::JoinHandle<()>,
    _dir: tempfile::TempDir,
}

async fn start_daemon() -> DaemonHandle {
    let dir = tempfile::tempdir().expect("tempdir");
    // Heartbeat intervals stay at their defaults: these specs rely on
    // connection EOF for disconnects, not on sweep timing.
    std::fs::write(
        dir.path().join("config.toml"),
        format!("auth_token = \"{}\"\nagent_bind = \"127.0.0.1:0\"\n", AUTH_TOKEN),
    )
    .expect("write config");
    start_daemon_in(dir).await
}

async fn start_daemon_in(dir: tempfile::TempDir) -> DaemonHandle {
    let config = Config::load_from(dir.path().to_path_buf()).expect("config");
    let socket_path = config.socket_path.clone();

    let StartupResult { daemon, console_listener, agent_listener, event_reader, listen_ctx, shutdown } =
        startup(config).await.expect("startup");
    let agent_addr = agent_listener.local_addr().expect("agent addr");

    let listener = Listener::new(console_listener, agent_listener, listen_ctx);
    tokio::spawn(listener.run());
    let engine_shutdown = shutdown.clone();
    let engine = tokio::spawn(async move {
        if let Err(e) = run_engine(daemon, event_reader, engine_shutdown).await {
            panic!("engine loop failed: {}", e);
        }
    });

    DaemonHandle { socket_path, agent_addr, shutdown, engine, _dir: dir }
}

impl DaemonHandle {
    /// Stop the daemon (releasing its lock file) and keep the state dir.
    async fn stop(self) -> tempfile::TempDir {
        self.shutdown.cancel();
        let _ = self.engine.await;
        self._dir
    }
}

/// Console connection speaking the length-prefixed request protocol.
struct Console {
    stream: UnixStream,
}

impl Console {
    async fn connect(handle: &DaemonHandle) -> Self {
        let stream = UnixStream::connect(&handle.socket_path).await.expect("console connect");
        Self { stream }
    }

    async fn request(&mut self, request: Request) -> Response {
        write_message(&mut self.stream, &encode(&request).expect("encode")).await.expect("write");
        let frame = read_message(&mut self.stream).await.expect("read");
        decode(&frame).expect("decode")
    }

    async fn job_status(&mut self, id: &str) -> Option<(JobStatus, Option<String>)> {
        match self.request(Request::GetJob { id: id.to_string() }).await {
            Response::Job { job } => job.map(|j| (j.status, j.agent_id)),
            other => panic!("unexpected response: {:?}", other),
        }
    }

    /// Poll until the job reaches `expected` (the engine loop is async).
    async fn await_status(&mut self, id: &str, expected: JobStatus) {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        loop {
            if let Some((status, _)) = self.job_status(id).await {
                if status == expected {
                    return;
                }
                assert!(
                    tokio::time::Instant::now() < deadline,
                    "job {} stuck; wanted {}, still {}",
                    id,
                    expected,
                    status
                );
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    }
}

/// Scripted streaming agent speaking the TCP agent protocol.
struct ScriptedAgent {
    stream: TcpStream,
    id: AgentId,
}

impl ScriptedAgent {
    async fn connect(handle: &DaemonHandle, id: &str) -> Self {
        Self::connect_with(handle, id, AUTH_TOKEN, None).await
    }

    async fn connect_with(
        handle: &DaemonHandle,
        id: &str,
        token: &str,
        active_job: Option<ActiveJob>,
    ) -> Self {
        let stream = TcpStream::connect(handle.agent_addr).await.expect("agent connect");
        let mut agent = Self { stream, id: AgentId::new(id) };
        agent
            .send(AgentMessage::Hello(AgentHello {
                host: format!("{}.local", id),
                name: id.to_string(),
                slots: 1,
                drain: false,
                active_job,
                auth_token: token.to_string(),
                meta: BTreeMap::new(),
            }))
            .await;
        agent
    }

    async fn send(&mut self, message: AgentMessage) {
        let envelope = Envelope::from_agent(message, self.id.clone(), 1);
        write_message(&mut self.stream, &encode(&envelope).expect("encode"))
            .await
            .expect("agent write");
    }

    async fn recv(&mut self) -> DaemonMessage {
        let frame = tokio::time::timeout(Duration::from_secs(5), read_message(&mut self.stream))
            .await
            .expect("timed out waiting for daemon message")
            .expect("agent read");
        let envelope: Envelope<DaemonMessage> = decode(&frame).expect("decode");
        envelope.body
    }

    /// Receive, skipping anything that isn't a job command.
    async fn recv_command(&mut self) -> sc_core::AgentCommand {
        loop {
            if let DaemonMessage::Command(command) = self.recv().await {
                return command;
            }
        }
    }
}

fn create_request(key: &str) -> Request {
    Request::CreateJob {
        idempotency_key: key.to_string(),
        name: format!("{}-stream", key),
        stream: StreamConfig {
            stream_key: "rtmp-test".to_string(),
            name: format!("{}-stream", key),
            ..Default::default()
        },
        restart_policy: RestartPolicy::Never,
        expires_at_ms: None,
    }
}

#[tokio::test]
async fn full_job_lifecycle_reaches_stopped() {
    let handle = start_daemon().await;
    let mut agent = ScriptedAgent::connect(&handle, "cam-01").await;
    assert!(matches!(agent.recv().await, DaemonMessage::HelloOk(_)));

    let mut console = Console::connect(&handle).await;
    let Response::JobCreated { id, created: true } = console.request(create_request("game-7")).await
    else {
        panic!("create failed")
    };

    // The scheduler matched the only idle agent; accept and go live
    let command = agent.recv_command().await;
    let sc_core::AgentCommand::AssignStart { job_id, idempotency_key, .. } = command else {
        panic!("expected assign-start, got {:?}", command)
    };
    assert_eq!(job_id.as_str(), id);
    assert_eq!(idempotency_key, "game-7");

    agent
        .send(AgentMessage::AssignAck { job_id: job_id.clone(), accepted: true, reason: None })
        .await;
    agent
        .send(AgentMessage::JobUpdate {
            job_id: job_id.clone(),
            status: Some(JobStatus::Running),
            metadata: None,
        })
        .await;
    console.await_status(&id, JobStatus::Running).await;

    // Operator stop flows to the agent, which reports a clean shutdown
    assert!(matches!(
        console.request(Request::StopJob { id: id.clone(), reason: None }).await,
        Response::Ok
    ));
    let command = agent.recv_command().await;
    assert!(matches!(command, sc_core::AgentCommand::JobStop { .. }));
    agent
        .send(AgentMessage::JobStopped {
            job_id: job_id.clone(),
            status: JobStatus::Stopped,
            error: None,
        })
        .await;
    console.await_status(&id, JobStatus::Stopped).await;

    handle.shutdown.cancel();
}

#[tokio::test]
async fn create_is_idempotent_across_console_connections() {
    let handle = start_daemon().await;

    let mut console = Console::connect(&handle).await;
    let Response::JobCreated { id: first, created: true } =
        console.request(create_request("rerun")).await
    else {
        panic!("create failed")
    };

    // A retry on a fresh connection returns the same job
    let mut retry = Console::connect(&handle).await;
    let Response::JobCreated { id: second, created: false } =
        retry.request(create_request("rerun")).await
    else {
        panic!("expected dedup")
    };
    assert_eq!(first, second);

    handle.shutdown.cancel();
}

#[tokio::test]
async fn hello_with_bad_token_is_rejected() {
    let handle = start_daemon().await;

    let mut agent = ScriptedAgent::connect_with(&handle, "intruder", "wrong-token", None).await;
    assert!(matches!(agent.recv().await, DaemonMessage::HelloReject { .. }));

    // The directory never saw it
    let mut console = Console::connect(&handle).await;
    match console.request(Request::ListAgents).await {
        Response::Agents { agents } => assert!(agents.is_empty()),
        other => panic!("unexpected response: {:?}", other),
    }

    handle.shutdown.cancel();
}

#[tokio::test]
async fn disconnect_fails_running_job_under_never_policy() {
    let handle = start_daemon().await;
    let mut agent = ScriptedAgent::connect(&handle, "cam-01").await;
    assert!(matches!(agent.recv().await, DaemonMessage::HelloOk(_)));

    let mut console = Console::connect(&handle).await;
    let Response::JobCreated { id, .. } = console.request(create_request("fragile")).await else {
        panic!("create failed")
    };

    let sc_core::AgentCommand::AssignStart { job_id, .. } = agent.recv_command().await else {
        panic!("expected assign-start")
    };
    agent
        .send(AgentMessage::AssignAck { job_id: job_id.clone(), accepted: true, reason: None })
        .await;
    agent
        .send(AgentMessage::JobUpdate {
            job_id: job_id.clone(),
            status: Some(JobStatus::Running),
            metadata: None,
        })
        .await;
    console.await_status(&id, JobStatus::Running).await;

    // Agent vanishes; restart policy is `never`
    drop(agent);
    console.await_status(&id, JobStatus::Failed).await;

    match console.request(Request::GetJob { id: id.clone() }).await {
        Response::Job { job: Some(job) } => {
            assert_eq!(job.error.map(|e| e.code), Some("agent-disconnected".to_string()));
            assert!(job.agent_id.is_none());
        }
        other => panic!("unexpected response: {:?}", other),
    }

    handle.shutdown.cancel();
}

#[tokio::test]
async fn reconnect_with_orphaned_job_is_told_to_stop_it() {
    let handle = start_daemon().await;
    let mut console = Console::connect(&handle).await;

    // No such job exists; the agent claims one anyway
    let mut agent = ScriptedAgent::connect_with(
        &handle,
        "cam-01",
        AUTH_TOKEN,
        Some(ActiveJob { job_id: sc_core::JobId::from_string("job-ghost"), status: JobStatus::Running }),
    )
    .await;
    assert!(matches!(agent.recv().await, DaemonMessage::HelloOk(_)));

    let command = agent.recv_command().await;
    assert!(
        matches!(command, sc_core::AgentCommand::StopOrphan { ref job_id } if job_id.as_str() == "job-ghost"),
        "expected stop-orphan, got {:?}",
        command
    );

    // Console still sees an empty job store
    match console.request(Request::ListJobs { include_dismissed: true }).await {
        Response::Jobs { jobs } => assert!(jobs.is_empty()),
        other => panic!("unexpected response: {:?}", other),
    }

    handle.shutdown.cancel();
}

#[tokio::test]
async fn state_survives_daemon_restart() {
    let handle = start_daemon().await;

    let mut console = Console::connect(&handle).await;
    let Response::JobCreated { id, created: true } =
        console.request(create_request("durable")).await
    else {
        panic!("create failed")
    };
    console.await_status(&id, JobStatus::Pending).await;
    drop(console);

    // Clean shutdown releases the lock and checkpoints
    let dir = handle.stop().await;

    // Restart over the same state dir: the job is still there, unharmed
    let handle = start_daemon_in(dir).await;
    let mut console = Console::connect(&handle).await;
    match console.request(Request::GetJob { id: id.clone() }).await {
        Response::Job { job: Some(job) } => {
            assert_eq!(job.id, id);
            assert_eq!(job.status, JobStatus::Pending);
            assert_eq!(job.idempotency_key, "durable");
        }
        other => panic!("job lost across restart: {:?}", other),
    }

    // The idempotency window survives too
    let Response::JobCreated { id: again, created: false } =
        console.request(create_request("durable")).await
    else {
        panic!("expected dedup after restart")
    };
    assert_eq!(again, id);

    handle.shutdown.cancel();
}
