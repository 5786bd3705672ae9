//! Domain types for the execution pipeline.
//!
//! This module contains the core data structures:
//! - Job: one record per command-execution attempt
//! - Audit: immutable records of identity-attributed actions
//! - Registry: host and operator entities (read-only to the pipeline)

pub mod audit;
pub mod job;
pub mod registry;

// Re-export commonly used types
pub use audit::{AuditAction, AuditEvent, AuditView};
pub use job::{JobPatch, JobRecord, JobStatus, JobView};
pub use registry::{Host, HostDisplay, HostStatus, Operator, OperatorDisplay};
