//! Failure taxonomy for the execution pipeline.
//!
//! Validation and precondition failures are detected before any job record is
//! created, so they are always safe to surface directly. Internal failures
//! carry their cause for server-side logging but are reported generically.

use thiserror::Error;

use crate::domain::HostStatus;

/// Errors surfaced by the execution service
#[derive(Debug, Error)]
pub enum ExecError {
    /// Malformed or missing input; nothing was mutated
    #[error("{0}")]
    Validation(String),

    /// The referenced host does not exist; no job record was created
    #[error("Host not found: {0}")]
    HostNotFound(String),

    /// The host exists but is not reachable; no job record was created
    #[error("Host '{id}' is not online (status: {status})")]
    HostNotOnline { id: String, status: HostStatus },

    /// Persistence or downstream failure of any kind
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ExecError {
    /// True for failures detected before any state was touched
    pub fn is_precondition(&self) -> bool {
        !matches!(self, ExecError::Internal(_))
    }
}
