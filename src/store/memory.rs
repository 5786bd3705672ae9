//! In-memory store implementations.
//!
//! Used by tests and anywhere a throwaway backing store is enough. Listing
//! behavior matches the SQLite implementations: newest first, truncated to
//! the requested limit.

use std::collections::HashMap;
use std::sync::RwLock;

use anyhow::{anyhow, Result};
use uuid::Uuid;

use crate::domain::{AuditEvent, Host, HostStatus, JobPatch, JobRecord, Operator};

use super::{AuditLog, HostRegistry, JobStore, UserDirectory};

/// Job store backed by a `Vec` under a lock
#[derive(Default)]
pub struct MemoryJobStore {
    jobs: RwLock<Vec<JobRecord>>,
}

impl MemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored jobs (test convenience)
    pub fn len(&self) -> usize {
        self.jobs.read().map(|j| j.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl JobStore for MemoryJobStore {
    fn create(&self, job: &JobRecord) -> Result<()> {
        let mut jobs = self.jobs.write().map_err(|_| anyhow!("job store lock poisoned"))?;
        jobs.push(job.clone());
        Ok(())
    }

    fn update(&self, id: Uuid, patch: &JobPatch) -> Result<()> {
        let mut jobs = self.jobs.write().map_err(|_| anyhow!("job store lock poisoned"))?;
        let job = jobs
            .iter_mut()
            .find(|j| j.id == id)
            .ok_or_else(|| anyhow!("job {} not found", id))?;
        job.apply(patch);
        Ok(())
    }

    fn get(&self, id: Uuid) -> Result<Option<JobRecord>> {
        let jobs = self.jobs.read().map_err(|_| anyhow!("job store lock poisoned"))?;
        Ok(jobs.iter().find(|j| j.id == id).cloned())
    }

    fn list_recent(&self, limit: usize) -> Result<Vec<JobRecord>> {
        let jobs = self.jobs.read().map_err(|_| anyhow!("job store lock poisoned"))?;
        let mut recent: Vec<JobRecord> = jobs.clone();
        recent.sort_by(|a, b| b.start_time.cmp(&a.start_time));
        recent.truncate(limit);
        Ok(recent)
    }
}

/// Append-only audit log backed by a `Vec` under a lock
#[derive(Default)]
pub struct MemoryAuditLog {
    events: RwLock<Vec<AuditEvent>>,
}

impl MemoryAuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.events.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AuditLog for MemoryAuditLog {
    fn append(&self, event: &AuditEvent) -> Result<()> {
        let mut events = self
            .events
            .write()
            .map_err(|_| anyhow!("audit log lock poisoned"))?;
        events.push(event.clone());
        Ok(())
    }

    fn list_recent(&self, limit: usize) -> Result<Vec<AuditEvent>> {
        let events = self
            .events
            .read()
            .map_err(|_| anyhow!("audit log lock poisoned"))?;
        let mut recent: Vec<AuditEvent> = events.clone();
        recent.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        recent.truncate(limit);
        Ok(recent)
    }
}

/// Host registry backed by a map; `insert` and `set_status` exist so tests
/// and wiring can shape the registry the pipeline reads
#[derive(Default)]
pub struct MemoryHostRegistry {
    hosts: RwLock<HashMap<String, Host>>,
}

impl MemoryHostRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, host: Host) {
        let mut hosts = self.hosts.write().expect("host registry lock poisoned");
        hosts.insert(host.id.clone(), host);
    }

    pub fn set_status(&self, host_id: &str, status: HostStatus) {
        let mut hosts = self.hosts.write().expect("host registry lock poisoned");
        if let Some(host) = hosts.get_mut(host_id) {
            host.status = status;
        }
    }
}

impl HostRegistry for MemoryHostRegistry {
    fn get(&self, host_id: &str) -> Result<Option<Host>> {
        let hosts = self
            .hosts
            .read()
            .map_err(|_| anyhow!("host registry lock poisoned"))?;
        Ok(hosts.get(host_id).cloned())
    }
}

/// Operator directory backed by a map
#[derive(Default)]
pub struct MemoryUserDirectory {
    operators: RwLock<HashMap<String, Operator>>,
}

impl MemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, operator: Operator) {
        let mut operators = self
            .operators
            .write()
            .expect("user directory lock poisoned");
        operators.insert(operator.id.clone(), operator);
    }
}

impl UserDirectory for MemoryUserDirectory {
    fn lookup(&self, user_id: &str) -> Result<Option<Operator>> {
        let operators = self
            .operators
            .read()
            .map_err(|_| anyhow!("user directory lock poisoned"))?;
        Ok(operators.get(user_id).cloned())
    }
}
