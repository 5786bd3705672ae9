//! Transport interfaces for command execution.
//!
//! A transport turns a command string into captured output plus a terminal
//! outcome. The shipped implementation is a scripted placeholder; a real
//! secure-remote-execution transport implements the same trait without
//! touching the job lifecycle or the execution service.

pub mod scripted;

use anyhow::Result;
use async_trait::async_trait;

// Re-export the scripted transport
pub use scripted::ScriptedTransport;

/// Output from a transport execution
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// Captured output text
    pub output: String,

    /// Terminal outcome reported by the transport
    pub outcome: Outcome,
}

impl CommandOutput {
    /// A successful execution with the given output
    pub fn success(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            outcome: Outcome::Success,
        }
    }

    /// A failed execution with the given output
    pub fn failed(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            outcome: Outcome::Failed,
        }
    }
}

/// Terminal outcome of a transport execution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failed,
}

/// Trait for command-execution transports
#[async_trait]
pub trait Transport: Send + Sync {
    /// Human-readable transport name
    fn name(&self) -> &str;

    /// Execute a command and return its output and outcome.
    ///
    /// An `Err` means the transport itself broke down (no exit status was
    /// obtained); the execution service records such jobs as failed.
    async fn execute(&self, command: &str) -> Result<CommandOutput>;
}
