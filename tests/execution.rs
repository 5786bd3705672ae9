//! Execution Pipeline Integration Tests
//!
//! Exercises the execution service against in-memory stores: lifecycle
//! transitions, gate preconditions, deadline behavior, and the audit trail.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use uuid::Uuid;

use opsdeck::core::{ExecError, ExecutionService, RequestContext};
use opsdeck::domain::{AuditAction, Host, HostStatus, JobPatch, JobRecord, JobStatus, Operator};
use opsdeck::store::{
    AuditLog, JobStore, MemoryAuditLog, MemoryHostRegistry, MemoryJobStore, MemoryUserDirectory,
};
use opsdeck::transport::ScriptedTransport;

struct Fixture {
    jobs: Arc<MemoryJobStore>,
    audit: Arc<MemoryAuditLog>,
    hosts: Arc<MemoryHostRegistry>,
    service: ExecutionService,
}

fn fixture_with_transport(transport: ScriptedTransport) -> Fixture {
    let jobs = Arc::new(MemoryJobStore::new());
    let audit = Arc::new(MemoryAuditLog::new());
    let hosts = Arc::new(MemoryHostRegistry::new());
    let users = Arc::new(MemoryUserDirectory::new());

    hosts.insert(Host::new(
        "h1",
        "Production Web Server",
        "192.168.1.100",
        HostStatus::Online,
    ));
    hosts.insert(Host::new(
        "h2",
        "Development Server",
        "192.168.1.102",
        HostStatus::Offline,
    ));
    hosts.insert(Host::new(
        "h3",
        "Database Server",
        "192.168.1.101",
        HostStatus::Error,
    ));
    users.insert(Operator::new("demo-user-id", "Regular User", "user@example.com"));

    let service = ExecutionService::new(
        jobs.clone(),
        audit.clone(),
        hosts.clone(),
        users.clone(),
        Arc::new(transport),
    );

    Fixture {
        jobs,
        audit,
        hosts,
        service,
    }
}

fn fixture() -> Fixture {
    fixture_with_transport(ScriptedTransport::instant())
}

fn ctx() -> RequestContext {
    RequestContext {
        operator: "demo-user-id".to_string(),
        source_address: Some("10.0.0.7".to_string()),
        agent_string: Some("opsdeck-test".to_string()),
    }
}

#[tokio::test]
async fn test_submit_success_lifecycle() {
    let fx = fixture();

    let view = fx.service.submit("h1", "uname -a", &ctx()).await.unwrap();
    let record = &view.record;

    assert_eq!(record.command, "uname -a");
    assert_eq!(record.status, JobStatus::Success);
    assert!(record.is_terminal());
    assert!(record.output.as_deref().unwrap().starts_with("Linux"));
    assert!(record.end_time.unwrap() >= record.start_time);
    assert!(record.duration_ms.unwrap() >= 0);
    assert_eq!(record.host_id, "h1");
    assert_eq!(record.executed_by, "demo-user-id");

    // The persisted record matches what the caller saw
    let stored = fx.jobs.get(record.id).unwrap().unwrap();
    assert_eq!(stored.status, JobStatus::Success);
    assert_eq!(stored.output, record.output);

    // Display fields are joined from the registries
    assert_eq!(view.host.as_ref().unwrap().name, "Production Web Server");
    assert_eq!(view.user.as_ref().unwrap().email, "user@example.com");
}

#[tokio::test]
async fn test_submit_appends_one_audit_event() {
    let fx = fixture();
    fx.service.submit("h1", "df -h", &ctx()).await.unwrap();

    let events = fx.audit.list_recent(100).unwrap();
    assert_eq!(events.len(), 1);

    let event = &events[0];
    assert_eq!(event.action, AuditAction::ExecuteCommand);
    let details = event.details.as_deref().unwrap();
    assert!(details.contains("df -h"));
    assert!(details.contains("Production Web Server"));
    assert_eq!(event.user_id.as_deref(), Some("demo-user-id"));
    assert_eq!(event.source_address.as_deref(), Some("10.0.0.7"));
    assert_eq!(event.agent_string.as_deref(), Some("opsdeck-test"));
}

#[tokio::test]
async fn test_unknown_host_creates_nothing() {
    let fx = fixture();

    let err = fx.service.submit("zz", "df -h", &ctx()).await.unwrap_err();
    assert!(matches!(err, ExecError::HostNotFound(_)));
    assert!(fx.jobs.is_empty());
    assert!(fx.audit.is_empty());
}

#[tokio::test]
async fn test_offline_host_creates_nothing() {
    let fx = fixture();

    let err = fx.service.submit("h2", "ls", &ctx()).await.unwrap_err();
    match err {
        ExecError::HostNotOnline { status, .. } => assert_eq!(status, HostStatus::Offline),
        other => panic!("expected HostNotOnline, got {:?}", other),
    }
    assert!(fx.jobs.is_empty());
    assert!(fx.audit.is_empty());
}

#[tokio::test]
async fn test_error_host_is_gated_like_offline() {
    let fx = fixture();

    let err = fx.service.submit("h3", "ls", &ctx()).await.unwrap_err();
    assert!(matches!(err, ExecError::HostNotOnline { .. }));
    assert!(fx.jobs.is_empty());
}

#[tokio::test]
async fn test_blank_input_is_rejected_before_any_state() {
    let fx = fixture();

    for (host_id, command) in [("", "ls"), ("h1", ""), ("  ", "  "), ("", "")] {
        let err = fx.service.submit(host_id, command, &ctx()).await.unwrap_err();
        assert!(matches!(err, ExecError::Validation(_)));
    }
    assert!(fx.jobs.is_empty());
    assert!(fx.audit.is_empty());
}

#[tokio::test]
async fn test_synthetic_failure_is_terminal() {
    let fx = fixture_with_transport(ScriptedTransport::with_timing(
        Duration::ZERO,
        Duration::ZERO,
        1.0,
    ));

    let view = fx.service.submit("h1", "echo hello", &ctx()).await.unwrap();
    assert_eq!(view.record.status, JobStatus::Failed);
    assert!(view
        .record
        .output
        .as_deref()
        .unwrap()
        .starts_with("Command failed"));

    // Failure is reported once; the audit trail still records the attempt
    assert_eq!(fx.audit.len(), 1);
}

#[tokio::test]
async fn test_deadline_expiry_yields_timeout_status() {
    let fx = fixture_with_transport(ScriptedTransport::with_timing(
        Duration::from_millis(200),
        Duration::from_millis(200),
        0.0,
    ));
    let service = fx.service.with_command_timeout(Duration::from_millis(20));

    let view = service.submit("h1", "sleep 60", &ctx()).await.unwrap();
    assert_eq!(view.record.status, JobStatus::Timeout);
    assert!(view.record.output.as_deref().unwrap().contains("timed out"));
    assert!(view.record.is_terminal());

    let stored = fx.jobs.get(view.record.id).unwrap().unwrap();
    assert_eq!(stored.status, JobStatus::Timeout);
}

/// Audit log that always fails its appends
struct BrokenAuditLog;

impl AuditLog for BrokenAuditLog {
    fn append(&self, _event: &opsdeck::domain::AuditEvent) -> anyhow::Result<()> {
        anyhow::bail!("audit backend unavailable")
    }

    fn list_recent(&self, _limit: usize) -> anyhow::Result<Vec<opsdeck::domain::AuditEvent>> {
        Ok(Vec::new())
    }
}

#[tokio::test]
async fn test_audit_append_failure_does_not_lose_the_job() {
    let jobs = Arc::new(MemoryJobStore::new());
    let hosts = Arc::new(MemoryHostRegistry::new());
    let users = Arc::new(MemoryUserDirectory::new());
    hosts.insert(Host::new("h1", "Web", "10.0.0.1", HostStatus::Online));

    let service = ExecutionService::new(
        jobs.clone(),
        Arc::new(BrokenAuditLog),
        hosts,
        users,
        Arc::new(ScriptedTransport::instant()),
    );

    // The completed job survives even though the trail entry was lost
    let view = service.submit("h1", "uname -a", &ctx()).await.unwrap();
    assert_eq!(view.record.status, JobStatus::Success);

    let stored = jobs.get(view.record.id).unwrap().unwrap();
    assert!(stored.is_terminal());
}

/// Job store whose next `n` updates fail; every attempted patch is recorded
struct FlakyJobStore {
    inner: MemoryJobStore,
    failures_left: AtomicUsize,
    attempts: Mutex<Vec<JobPatch>>,
}

impl FlakyJobStore {
    fn failing_updates(n: usize) -> Self {
        Self {
            inner: MemoryJobStore::new(),
            failures_left: AtomicUsize::new(n),
            attempts: Mutex::new(Vec::new()),
        }
    }
}

impl JobStore for FlakyJobStore {
    fn create(&self, job: &JobRecord) -> anyhow::Result<()> {
        self.inner.create(job)
    }

    fn update(&self, id: Uuid, patch: &JobPatch) -> anyhow::Result<()> {
        self.attempts.lock().unwrap().push(patch.clone());
        if self.failures_left.load(Ordering::SeqCst) > 0 {
            self.failures_left.fetch_sub(1, Ordering::SeqCst);
            anyhow::bail!("write rejected");
        }
        self.inner.update(id, patch)
    }

    fn get(&self, id: Uuid) -> anyhow::Result<Option<JobRecord>> {
        self.inner.get(id)
    }

    fn list_recent(&self, limit: usize) -> anyhow::Result<Vec<JobRecord>> {
        self.inner.list_recent(limit)
    }
}

fn service_over(jobs: Arc<FlakyJobStore>, audit: Arc<MemoryAuditLog>) -> ExecutionService {
    let hosts = Arc::new(MemoryHostRegistry::new());
    hosts.insert(Host::new("h1", "Web", "10.0.0.1", HostStatus::Online));

    ExecutionService::new(
        jobs,
        audit,
        hosts,
        Arc::new(MemoryUserDirectory::new()),
        Arc::new(ScriptedTransport::instant()),
    )
}

#[tokio::test]
async fn test_update_failure_is_fatal_and_parks_the_job() {
    let jobs = Arc::new(FlakyJobStore::failing_updates(1));
    let audit = Arc::new(MemoryAuditLog::new());
    let service = service_over(jobs.clone(), audit.clone());

    let err = service.submit("h1", "uname -a", &ctx()).await.unwrap_err();
    assert!(matches!(err, ExecError::Internal(_)));

    // First attempt carried the real result; the second parks the job Failed
    {
        let attempts = jobs.attempts.lock().unwrap();
        assert_eq!(attempts.len(), 2);
        assert_eq!(attempts[0].status, Some(JobStatus::Success));
        assert_eq!(attempts[1].status, Some(JobStatus::Failed));
    }

    let stored = &jobs.inner.list_recent(10).unwrap()[0];
    assert_eq!(stored.status, JobStatus::Failed);
    assert!(stored
        .output
        .as_deref()
        .unwrap()
        .contains("could not be persisted"));

    // A job whose result was lost gets no audit entry
    assert!(audit.is_empty());
}

#[tokio::test]
async fn test_job_stays_running_when_every_update_fails() {
    let jobs = Arc::new(FlakyJobStore::failing_updates(usize::MAX));
    let audit = Arc::new(MemoryAuditLog::new());
    let service = service_over(jobs.clone(), audit.clone());

    let err = service.submit("h1", "uname -a", &ctx()).await.unwrap_err();
    assert!(matches!(err, ExecError::Internal(_)));

    // The compensating attempt was made exactly once, then the store was left alone
    assert_eq!(jobs.attempts.lock().unwrap().len(), 2);
    let stored = &jobs.inner.list_recent(10).unwrap()[0];
    assert_eq!(stored.status, JobStatus::Running);
    assert!(audit.is_empty());
}

#[tokio::test]
async fn test_history_reflects_current_registry_names() {
    let fx = fixture();
    fx.service.submit("h1", "uname -a", &ctx()).await.unwrap();

    // Rename the host after the job completed
    fx.hosts.insert(Host::new(
        "h1",
        "Renamed Web Server",
        "192.168.1.100",
        HostStatus::Online,
    ));

    let jobs = fx.service.recent_jobs(50).unwrap();
    assert_eq!(jobs[0].host.as_ref().unwrap().name, "Renamed Web Server");
}

#[tokio::test]
async fn test_recent_jobs_orders_newest_first() {
    let fx = fixture();
    for command in ["uname -a", "df -h", "free -m"] {
        fx.service.submit("h1", command, &ctx()).await.unwrap();
    }

    let jobs = fx.service.recent_jobs(50).unwrap();
    assert_eq!(jobs.len(), 3);
    for pair in jobs.windows(2) {
        assert!(pair[0].record.start_time >= pair[1].record.start_time);
    }

    // Read idempotence: no writes in between, identical output
    let again = fx.service.recent_jobs(50).unwrap();
    let ids: Vec<_> = jobs.iter().map(|j| j.record.id).collect();
    let ids_again: Vec<_> = again.iter().map(|j| j.record.id).collect();
    assert_eq!(ids, ids_again);
}

#[tokio::test]
async fn test_recent_audit_joins_operator_display() {
    let fx = fixture();
    fx.service.submit("h1", "ps aux", &ctx()).await.unwrap();

    let events = fx.service.recent_audit(100).unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].user.as_ref().unwrap().name, "Regular User");

    // Unknown operators leave the display field empty
    let anonymous = RequestContext::for_operator("ghost-user");
    fx.service.submit("h1", "ps aux", &anonymous).await.unwrap();
    let events = fx.service.recent_audit(100).unwrap();
    assert!(events.iter().any(|e| e.user.is_none()));
}
