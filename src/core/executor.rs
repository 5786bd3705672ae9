//! The execution service: orchestrates one command submission end to end.
//!
//! Flow per submission: validate input, check the host gate, create the job
//! in `Running` state, invoke the transport under a deadline, persist the
//! terminal result, append one audit event, return the finished record.
//!
//! Each submission is an independent unit of work. There is no queue, no
//! per-host serialization, and no global concurrency limit; the caller
//! observes the full round-trip latency. Host reachability is checked once at
//! submission and not re-verified while the command runs.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::timeout;
use tracing::{error, info, instrument, warn};

use crate::domain::{
    AuditAction, AuditEvent, AuditView, JobPatch, JobRecord, JobStatus, JobView,
};
use crate::store::{AuditLog, HostRegistry, JobStore, UserDirectory};
use crate::transport::{Outcome, Transport};

use super::error::ExecError;

/// Default deadline for one transport call
const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

/// Provenance and identity attached to a submission
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    /// The acting operator id
    pub operator: String,

    /// Request source address, when known
    pub source_address: Option<String>,

    /// Request user-agent string, when known
    pub agent_string: Option<String>,
}

impl RequestContext {
    pub fn for_operator(operator: impl Into<String>) -> Self {
        Self {
            operator: operator.into(),
            source_address: None,
            agent_string: None,
        }
    }
}

/// Orchestrates command execution against registered hosts
pub struct ExecutionService {
    jobs: Arc<dyn JobStore>,
    audit: Arc<dyn AuditLog>,
    hosts: Arc<dyn HostRegistry>,
    users: Arc<dyn UserDirectory>,
    transport: Arc<dyn Transport>,
    command_timeout: Duration,
}

impl ExecutionService {
    pub fn new(
        jobs: Arc<dyn JobStore>,
        audit: Arc<dyn AuditLog>,
        hosts: Arc<dyn HostRegistry>,
        users: Arc<dyn UserDirectory>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            jobs,
            audit,
            hosts,
            users,
            transport,
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
        }
    }

    /// Override the per-command deadline
    pub fn with_command_timeout(mut self, command_timeout: Duration) -> Self {
        self.command_timeout = command_timeout;
        self
    }

    /// Submit a command against a registered host and wait for its result.
    ///
    /// Blocks the calling task for the full transport round trip; there is no
    /// polling handle and no caller-side cancellation.
    #[instrument(skip(self, ctx), fields(transport = self.transport.name()))]
    pub async fn submit(
        &self,
        host_id: &str,
        command: &str,
        ctx: &RequestContext,
    ) -> Result<JobView, ExecError> {
        let host_id = host_id.trim();
        let command = command.trim();

        if host_id.is_empty() || command.is_empty() {
            return Err(ExecError::Validation(
                "Host ID and command are required".to_string(),
            ));
        }

        let host = self
            .hosts
            .get(host_id)?
            .ok_or_else(|| ExecError::HostNotFound(host_id.to_string()))?;

        if !host.is_online() {
            return Err(ExecError::HostNotOnline {
                id: host_id.to_string(),
                status: host.status,
            });
        }

        let mut job = JobRecord::new(host_id, command, ctx.operator.clone());
        self.jobs.create(&job)?;
        info!(job_id = %job.id, host = %host.name, "command dispatched");

        let (status, output) = match timeout(self.command_timeout, self.transport.execute(command))
            .await
        {
            Ok(Ok(result)) => {
                let status = match result.outcome {
                    Outcome::Success => JobStatus::Success,
                    Outcome::Failed => JobStatus::Failed,
                };
                (status, result.output)
            }
            Ok(Err(e)) => {
                warn!(job_id = %job.id, error = %e, "transport broke down");
                (JobStatus::Failed, format!("Command failed: {:#}", e))
            }
            Err(_) => (
                JobStatus::Timeout,
                format!(
                    "Command timed out after {}s",
                    self.command_timeout.as_secs()
                ),
            ),
        };

        let end_time = Utc::now();
        let duration_ms = (end_time - job.start_time).num_milliseconds().max(0);
        let patch = JobPatch::completion(status, output, end_time, duration_ms);

        if let Err(e) = self.jobs.update(job.id, &patch) {
            // Fatal: the result could not be persisted. Try once to park the
            // job in Failed so it cannot stay Running forever.
            error!(job_id = %job.id, error = %e, "failed to persist job result");
            let fallback = JobPatch::completion(
                JobStatus::Failed,
                format!("Result could not be persisted: {:#}", e),
                end_time,
                duration_ms,
            );
            if let Err(e2) = self.jobs.update(job.id, &fallback) {
                error!(job_id = %job.id, error = %e2, "compensating update failed; job may remain running");
            }
            return Err(ExecError::Internal(e));
        }
        job.apply(&patch);

        let event = AuditEvent::new(
            AuditAction::ExecuteCommand,
            format!("Executed command \"{}\" on \"{}\"", command, host.name),
        )
        .with_user(ctx.operator.clone())
        .with_provenance(ctx.source_address.clone(), ctx.agent_string.clone());

        if let Err(e) = self.audit.append(&event) {
            // Recoverable: the job result is durable, only the trail entry is
            // missing. Logged rather than failing the finished execution.
            error!(job_id = %job.id, error = %e, "audit append failed");
        }

        info!(job_id = %job.id, status = %job.status, duration_ms, "command finished");
        self.job_view(job)
    }

    /// At most `limit` jobs, newest first, with display fields resolved
    /// against current registry state
    pub fn recent_jobs(&self, limit: usize) -> Result<Vec<JobView>, ExecError> {
        let jobs = self.jobs.list_recent(limit)?;
        jobs.into_iter().map(|job| self.job_view(job)).collect()
    }

    /// At most `limit` audit events, newest first, with operator display
    /// fields resolved at read time
    pub fn recent_audit(&self, limit: usize) -> Result<Vec<AuditView>, ExecError> {
        let events = self.audit.list_recent(limit)?;
        events
            .into_iter()
            .map(|event| {
                let user = match event.user_id.as_deref() {
                    Some(user_id) => self.users.lookup(user_id)?.map(|op| op.display()),
                    None => None,
                };
                Ok(AuditView { event, user })
            })
            .collect()
    }

    /// Join a job with current host and operator display fields
    fn job_view(&self, record: JobRecord) -> Result<JobView, ExecError> {
        let host = self.hosts.get(&record.host_id)?.map(|h| h.display());
        let user = self
            .users
            .lookup(&record.executed_by)?
            .map(|op| op.display());
        Ok(JobView { record, host, user })
    }
}
