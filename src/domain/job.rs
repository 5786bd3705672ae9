//! Job records: one per command-execution attempt.
//!
//! A job is created in `Running` state, handed to a transport, and moved to a
//! terminal status exactly once. Terminal records are never mutated again.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::registry::{HostDisplay, OperatorDisplay};

/// A single command-execution attempt against a registered host.
///
/// Wire field names are camelCase to match the console API. `duration` is
/// milliseconds between `start_time` and `end_time`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRecord {
    /// Unique identifier, assigned at creation
    pub id: Uuid,

    /// The exact command string submitted; opaque to the pipeline
    pub command: String,

    /// Lifecycle status
    pub status: JobStatus,

    /// Set at creation
    pub start_time: DateTime<Utc>,

    /// Set when the transport completes
    pub end_time: Option<DateTime<Utc>>,

    /// `end_time - start_time` in milliseconds, always >= 0
    #[serde(rename = "duration")]
    pub duration_ms: Option<i64>,

    /// Captured output; absent while the job is running
    pub output: Option<String>,

    /// The host the command was submitted against
    pub host_id: String,

    /// The acting operator
    pub executed_by: String,
}

impl JobRecord {
    /// Create a new job in `Running` state with `start_time = now`
    pub fn new(
        host_id: impl Into<String>,
        command: impl Into<String>,
        executed_by: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            command: command.into(),
            status: JobStatus::Running,
            start_time: Utc::now(),
            end_time: None,
            duration_ms: None,
            output: None,
            host_id: host_id.into(),
            executed_by: executed_by.into(),
        }
    }

    /// Apply a partial patch to this record
    pub fn apply(&mut self, patch: &JobPatch) {
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(ref output) = patch.output {
            self.output = Some(output.clone());
        }
        if let Some(end_time) = patch.end_time {
            self.end_time = Some(end_time);
        }
        if let Some(duration_ms) = patch.duration_ms {
            self.duration_ms = Some(duration_ms);
        }
    }

    /// Check if the job has reached a terminal status
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

/// Partial update to a job record.
///
/// Only the fields that are `Some` are applied. The execution service is the
/// single writer per job, so no compare-and-swap is needed.
#[derive(Debug, Clone, Default)]
pub struct JobPatch {
    pub status: Option<JobStatus>,
    pub output: Option<String>,
    pub end_time: Option<DateTime<Utc>>,
    pub duration_ms: Option<i64>,
}

impl JobPatch {
    /// Build the patch that moves a running job to its terminal state
    pub fn completion(
        status: JobStatus,
        output: String,
        end_time: DateTime<Utc>,
        duration_ms: i64,
    ) -> Self {
        Self {
            status: Some(status),
            output: Some(output),
            end_time: Some(end_time),
            duration_ms: Some(duration_ms),
        }
    }
}

/// Lifecycle status of a job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    /// Transport call in flight
    Running,

    /// Transport reported a successful outcome
    Success,

    /// Transport reported failure (or failed outright)
    Failed,

    /// Command deadline expired before the transport returned
    Timeout,
}

impl JobStatus {
    /// Stable string form, shared by the wire format and the database
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Running => "RUNNING",
            JobStatus::Success => "SUCCESS",
            JobStatus::Failed => "FAILED",
            JobStatus::Timeout => "TIMEOUT",
        }
    }

    /// Terminal statuses admit no further transition
    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobStatus::Running)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "RUNNING" => Ok(JobStatus::Running),
            "SUCCESS" => Ok(JobStatus::Success),
            "FAILED" => Ok(JobStatus::Failed),
            "TIMEOUT" => Ok(JobStatus::Timeout),
            other => anyhow::bail!("unknown job status: {}", other),
        }
    }
}

/// A job record joined with display fields for its host and operator.
///
/// The `host` and `user` fields are resolved against current registry state at
/// read time, so history views reflect present names.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobView {
    #[serde(flatten)]
    pub record: JobRecord,

    /// Host display fields (absent if the host was since removed)
    pub host: Option<HostDisplay>,

    /// Operator display fields (absent if the operator is unknown)
    pub user: Option<OperatorDisplay>,
}
