//! Core pipeline logic.
//!
//! This module contains:
//! - Executor: the execution service orchestrating gate check, job lifecycle,
//!   transport call, and audit append
//! - Error: the failure taxonomy surfaced to callers
//! - Seed: idempotent demo data for a fresh console

pub mod error;
pub mod executor;
pub mod seed;

// Re-export commonly used types
pub use error::ExecError;
pub use executor::{ExecutionService, RequestContext};
pub use seed::seed_demo_data;
