//! Demo data for a fresh console.
//!
//! Inserts two operators, three hosts, and a small slice of history so the
//! console is not empty on first start. Seeding is idempotent: if the demo
//! hosts already exist nothing is written.

use anyhow::Result;
use chrono::{Duration as ChronoDuration, Utc};
use tracing::info;

use crate::domain::{
    AuditAction, AuditEvent, Host, HostStatus, JobPatch, JobRecord, JobStatus, Operator,
};
use crate::store::{AuditLog, HostRegistry, JobStore, SqliteStore};

/// Operator id used for console submissions when no session layer is wired
pub const DEMO_OPERATOR_ID: &str = "demo-user-id";

/// Seed demo operators, hosts, and history. Returns `false` if the store was
/// already seeded.
pub fn seed_demo_data(store: &SqliteStore) -> Result<bool> {
    if HostRegistry::get(store, "server-1")?.is_some() {
        return Ok(false);
    }

    let admin = Operator::new("admin-user-id", "Admin User", "admin@example.com");
    let operator = Operator::new(DEMO_OPERATOR_ID, "Regular User", "user@example.com");
    store.upsert_operator(&admin)?;
    store.upsert_operator(&operator)?;

    let hosts = [
        Host::new(
            "server-1",
            "Production Web Server",
            "192.168.1.100",
            HostStatus::Online,
        ),
        Host::new(
            "server-2",
            "Database Server",
            "192.168.1.101",
            HostStatus::Online,
        ),
        Host::new(
            "server-3",
            "Development Server",
            "192.168.1.102",
            HostStatus::Offline,
        ),
    ];
    for host in &hosts {
        store.upsert_host(host)?;
    }

    let now = Utc::now();
    let history = [
        (
            "uname -a",
            "Linux prod-server 5.15.0-91-generic #101-Ubuntu SMP Tue Nov 14 13:52:09 UTC 2023 x86_64 x86_64 x86_64 GNU/Linux",
            "server-1",
            admin.id.as_str(),
            ChronoDuration::hours(1),
            5000,
        ),
        (
            "df -h",
            "Filesystem      Size  Used Avail Use% Mounted on\n/dev/sda1        50G   15G   33G  32% /\n/dev/sdb1       200G   80G  110G  43% /data",
            "server-2",
            admin.id.as_str(),
            ChronoDuration::hours(2),
            2000,
        ),
        (
            "systemctl status nginx",
            "nginx.service - A high performance web server\n   Loaded: loaded (/lib/systemd/system/nginx.service; enabled; vendor preset: enabled)\n   Active: active (running)",
            "server-1",
            operator.id.as_str(),
            ChronoDuration::minutes(30),
            3000,
        ),
    ];

    for (command, output, host_id, executed_by, age, duration_ms) in history {
        let mut job = JobRecord::new(host_id, command, executed_by);
        job.start_time = now - age;
        store.create(&job)?;
        store.update(
            job.id,
            &JobPatch::completion(
                JobStatus::Success,
                output.to_string(),
                job.start_time + ChronoDuration::milliseconds(duration_ms),
                duration_ms,
            ),
        )?;
    }

    let activities = [
        (
            AuditAction::CreateHost,
            "Created host \"Production Web Server\" at 192.168.1.100:22",
            admin.id.as_str(),
            ChronoDuration::days(1),
        ),
        (
            AuditAction::CreateHost,
            "Created host \"Database Server\" at 192.168.1.101:22",
            admin.id.as_str(),
            ChronoDuration::hours(12),
        ),
        (
            AuditAction::ExecuteCommand,
            "Executed command \"uname -a\" on \"Production Web Server\"",
            admin.id.as_str(),
            ChronoDuration::hours(1),
        ),
        (
            AuditAction::ExecuteCommand,
            "Executed command \"systemctl status nginx\" on \"Production Web Server\"",
            operator.id.as_str(),
            ChronoDuration::minutes(30),
        ),
        (
            AuditAction::TestConnection,
            "Tested connection to \"Production Web Server\" - Result: ONLINE",
            admin.id.as_str(),
            ChronoDuration::minutes(15),
        ),
    ];

    for (action, details, user_id, age) in activities {
        let mut event = AuditEvent::new(action, details).with_user(user_id);
        event.timestamp = now - age;
        store.append(&event)?;
    }

    info!("demo data seeded");
    Ok(true)
}
