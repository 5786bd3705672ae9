//! SQLite-backed store.
//!
//! One database file holds jobs, audit events, hosts, and operators; the
//! schema is applied when the store is opened. A single `SqliteStore`
//! implements every repository trait, so production wiring hands the same
//! handle to the pipeline under each capability.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use crate::domain::{AuditEvent, Host, JobPatch, JobRecord, Operator};

use super::{AuditLog, HostRegistry, JobStore, UserDirectory};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS jobs (
    id          TEXT PRIMARY KEY,
    command     TEXT NOT NULL,
    status      TEXT NOT NULL,
    start_time  TEXT NOT NULL,
    end_time    TEXT,
    duration_ms INTEGER,
    output      TEXT,
    host_id     TEXT NOT NULL,
    executed_by TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_jobs_start_time ON jobs(start_time);

CREATE TABLE IF NOT EXISTS audit_events (
    id             TEXT PRIMARY KEY,
    action         TEXT NOT NULL,
    details        TEXT,
    user_id        TEXT,
    source_address TEXT,
    agent_string   TEXT,
    timestamp      TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_audit_timestamp ON audit_events(timestamp);

CREATE TABLE IF NOT EXISTS hosts (
    id       TEXT PRIMARY KEY,
    name     TEXT NOT NULL,
    hostname TEXT NOT NULL,
    status   TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS operators (
    id    TEXT PRIMARY KEY,
    name  TEXT NOT NULL,
    email TEXT NOT NULL
);
";

/// Store backed by a single SQLite database
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the database at `path` and apply the schema
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        Self::from_connection(conn)
    }

    /// Open a throwaway in-memory database
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)
            .context("Failed to apply database schema")?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| anyhow!("database lock poisoned"))
    }

    /// Insert or replace a host row (registry mutation is the console's job;
    /// this exists for seeding and tests)
    pub fn upsert_host(&self, host: &Host) -> Result<()> {
        self.conn()?.execute(
            "INSERT OR REPLACE INTO hosts (id, name, hostname, status) VALUES (?1, ?2, ?3, ?4)",
            params![host.id, host.name, host.hostname, host.status.as_str()],
        )?;
        Ok(())
    }

    /// Insert or replace an operator row
    pub fn upsert_operator(&self, operator: &Operator) -> Result<()> {
        self.conn()?.execute(
            "INSERT OR REPLACE INTO operators (id, name, email) VALUES (?1, ?2, ?3)",
            params![operator.id, operator.name, operator.email],
        )?;
        Ok(())
    }
}

fn encode_ts(ts: DateTime<Utc>) -> String {
    // Fixed precision so lexicographic ordering matches chronological order
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn decode_ts(raw: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(raw)
        .with_context(|| format!("bad timestamp in database: {}", raw))?
        .with_timezone(&Utc))
}

/// Job row as stored, before ids, statuses, and timestamps are parsed
struct RawJob {
    id: String,
    command: String,
    status: String,
    start_time: String,
    end_time: Option<String>,
    duration_ms: Option<i64>,
    output: Option<String>,
    host_id: String,
    executed_by: String,
}

fn job_from_row(row: &Row<'_>) -> rusqlite::Result<RawJob> {
    Ok(RawJob {
        id: row.get(0)?,
        command: row.get(1)?,
        status: row.get(2)?,
        start_time: row.get(3)?,
        end_time: row.get(4)?,
        duration_ms: row.get(5)?,
        output: row.get(6)?,
        host_id: row.get(7)?,
        executed_by: row.get(8)?,
    })
}

impl TryFrom<RawJob> for JobRecord {
    type Error = anyhow::Error;

    fn try_from(raw: RawJob) -> Result<Self> {
        Ok(JobRecord {
            id: Uuid::parse_str(&raw.id).context("bad job id in database")?,
            command: raw.command,
            status: raw.status.parse()?,
            start_time: decode_ts(&raw.start_time)?,
            end_time: raw.end_time.as_deref().map(decode_ts).transpose()?,
            duration_ms: raw.duration_ms,
            output: raw.output,
            host_id: raw.host_id,
            executed_by: raw.executed_by,
        })
    }
}

const JOB_COLUMNS: &str =
    "id, command, status, start_time, end_time, duration_ms, output, host_id, executed_by";

impl JobStore for SqliteStore {
    fn create(&self, job: &JobRecord) -> Result<()> {
        self.conn()?.execute(
            "INSERT INTO jobs (id, command, status, start_time, end_time, duration_ms, output, host_id, executed_by)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                job.id.to_string(),
                job.command,
                job.status.as_str(),
                encode_ts(job.start_time),
                job.end_time.map(encode_ts),
                job.duration_ms,
                job.output,
                job.host_id,
                job.executed_by,
            ],
        )?;
        Ok(())
    }

    fn update(&self, id: Uuid, patch: &JobPatch) -> Result<()> {
        let updated = self.conn()?.execute(
            "UPDATE jobs SET
                status      = COALESCE(?2, status),
                output      = COALESCE(?3, output),
                end_time    = COALESCE(?4, end_time),
                duration_ms = COALESCE(?5, duration_ms)
             WHERE id = ?1",
            params![
                id.to_string(),
                patch.status.map(|s| s.as_str()),
                patch.output,
                patch.end_time.map(encode_ts),
                patch.duration_ms,
            ],
        )?;

        if updated == 0 {
            anyhow::bail!("job {} not found", id);
        }
        Ok(())
    }

    fn get(&self, id: Uuid) -> Result<Option<JobRecord>> {
        let raw = self
            .conn()?
            .query_row(
                &format!("SELECT {} FROM jobs WHERE id = ?1", JOB_COLUMNS),
                params![id.to_string()],
                job_from_row,
            )
            .optional()?;

        raw.map(JobRecord::try_from).transpose()
    }

    fn list_recent(&self, limit: usize) -> Result<Vec<JobRecord>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM jobs ORDER BY start_time DESC LIMIT ?1",
            JOB_COLUMNS
        ))?;

        let rows = stmt.query_map(params![limit as i64], job_from_row)?;
        let mut jobs = Vec::new();
        for raw in rows {
            jobs.push(JobRecord::try_from(raw?)?);
        }
        Ok(jobs)
    }
}

/// Audit row as stored, before ids, actions, and timestamps are parsed
struct RawEvent {
    id: String,
    action: String,
    details: Option<String>,
    user_id: Option<String>,
    source_address: Option<String>,
    agent_string: Option<String>,
    timestamp: String,
}

impl TryFrom<RawEvent> for AuditEvent {
    type Error = anyhow::Error;

    fn try_from(raw: RawEvent) -> Result<Self> {
        Ok(AuditEvent {
            id: Uuid::parse_str(&raw.id).context("bad event id in database")?,
            action: raw.action.parse()?,
            details: raw.details,
            user_id: raw.user_id,
            source_address: raw.source_address,
            agent_string: raw.agent_string,
            timestamp: decode_ts(&raw.timestamp)?,
        })
    }
}

impl AuditLog for SqliteStore {
    fn append(&self, event: &AuditEvent) -> Result<()> {
        self.conn()?.execute(
            "INSERT INTO audit_events (id, action, details, user_id, source_address, agent_string, timestamp)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                event.id.to_string(),
                event.action.as_str(),
                event.details,
                event.user_id,
                event.source_address,
                event.agent_string,
                encode_ts(event.timestamp),
            ],
        )?;
        Ok(())
    }

    fn list_recent(&self, limit: usize) -> Result<Vec<AuditEvent>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, action, details, user_id, source_address, agent_string, timestamp
             FROM audit_events ORDER BY timestamp DESC LIMIT ?1",
        )?;

        let rows = stmt.query_map(params![limit as i64], |row| {
            Ok(RawEvent {
                id: row.get(0)?,
                action: row.get(1)?,
                details: row.get(2)?,
                user_id: row.get(3)?,
                source_address: row.get(4)?,
                agent_string: row.get(5)?,
                timestamp: row.get(6)?,
            })
        })?;

        let mut events = Vec::new();
        for raw in rows {
            events.push(AuditEvent::try_from(raw?)?);
        }
        Ok(events)
    }
}

impl HostRegistry for SqliteStore {
    fn get(&self, host_id: &str) -> Result<Option<Host>> {
        let row = self
            .conn()?
            .query_row(
                "SELECT id, name, hostname, status FROM hosts WHERE id = ?1",
                params![host_id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                },
            )
            .optional()?;

        row.map(|(id, name, hostname, status)| {
            Ok(Host {
                id,
                name,
                hostname,
                status: status.parse()?,
            })
        })
        .transpose()
    }
}

impl UserDirectory for SqliteStore {
    fn lookup(&self, user_id: &str) -> Result<Option<Operator>> {
        let row = self
            .conn()?
            .query_row(
                "SELECT id, name, email FROM operators WHERE id = ?1",
                params![user_id],
                |row| {
                    Ok(Operator {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        email: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(row)
    }
}
