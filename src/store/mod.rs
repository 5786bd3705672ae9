//! Repository interfaces for jobs, audit events, and the registries.
//!
//! Stores are injected as `Arc<dyn ...>` capabilities rather than reached
//! through an ambient handle, so the pipeline can run against SQLite in
//! production and in-memory fakes in tests. Each operation is atomic per
//! record; no cross-record transactions are required.

pub mod memory;
pub mod sqlite;

use anyhow::Result;
use uuid::Uuid;

use crate::domain::{AuditEvent, Host, JobPatch, JobRecord, Operator};

pub use memory::{MemoryAuditLog, MemoryHostRegistry, MemoryJobStore, MemoryUserDirectory};
pub use sqlite::SqliteStore;

/// Persistence for job records
pub trait JobStore: Send + Sync {
    /// Persist a newly created job
    fn create(&self, job: &JobRecord) -> Result<()>;

    /// Apply a partial patch to the job identified by `id`.
    ///
    /// Single-writer-per-job is assumed; no compare-and-swap is provided.
    fn update(&self, id: Uuid, patch: &JobPatch) -> Result<()>;

    /// Fetch one job by id
    fn get(&self, id: Uuid) -> Result<Option<JobRecord>>;

    /// At most `limit` jobs ordered by start time descending.
    ///
    /// Ordering among records with identical start times is unspecified.
    fn list_recent(&self, limit: usize) -> Result<Vec<JobRecord>>;
}

/// Append-only log of audit events
pub trait AuditLog: Send + Sync {
    /// Append one immutable event
    fn append(&self, event: &AuditEvent) -> Result<()>;

    /// At most `limit` events ordered by timestamp descending
    fn list_recent(&self, limit: usize) -> Result<Vec<AuditEvent>>;
}

/// Read-only view of the host registry.
///
/// The pipeline only needs the reachability precondition; registry mutation
/// belongs to the surrounding console.
pub trait HostRegistry: Send + Sync {
    fn get(&self, host_id: &str) -> Result<Option<Host>>;
}

/// Read-only operator lookup for display-field denormalization
pub trait UserDirectory: Send + Sync {
    fn lookup(&self, user_id: &str) -> Result<Option<Operator>>;
}
