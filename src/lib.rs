//! opsdeck - operations console backend
//!
//! Operators register remote hosts, run ad-hoc diagnostic commands against
//! them, and review an audited history of who did what.
//!
//! # Architecture
//!
//! The execution pipeline is the core:
//! - a submission is gated on host reachability, recorded as a `Running` job,
//!   handed to a transport, moved to a terminal status exactly once, and
//!   paired with one immutable audit event
//! - the transport is a seam: the shipped implementation scripts its output,
//!   and a real remote-execution transport replaces it without touching the
//!   job lifecycle
//! - stores are injected repositories (SQLite in production, in-memory fakes
//!   in tests)
//!
//! # Modules
//!
//! - `core`: execution service, error taxonomy, demo seeding
//! - `domain`: data structures (JobRecord, AuditEvent, Host, Operator)
//! - `store`: repository traits plus SQLite and in-memory backends
//! - `transport`: the execution seam and the scripted placeholder
//! - `web`: axum HTTP surface
//! - `cli`: command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Seed demo data and start the server
//! opsdeck seed
//! opsdeck serve
//!
//! # Submit a command locally
//! opsdeck exec server-1 "uname -a"
//!
//! # Review history
//! opsdeck history
//! opsdeck audit
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod store;
pub mod transport;
pub mod web;

// Re-export main types at crate root for convenience
pub use crate::core::{ExecError, ExecutionService, RequestContext};
pub use domain::{
    AuditAction, AuditEvent, AuditView, Host, HostStatus, JobPatch, JobRecord, JobStatus, JobView,
    Operator,
};
pub use store::{AuditLog, HostRegistry, JobStore, SqliteStore, UserDirectory};
pub use transport::{CommandOutput, Outcome, ScriptedTransport, Transport};
