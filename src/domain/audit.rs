//! Audit events: immutable records of identity-attributed actions.
//!
//! Every recorded action across the console (command execution, host changes,
//! logins) becomes one event in an append-only log. Events are never mutated
//! or deleted.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::registry::OperatorDisplay;

/// A single entry in the append-only audit log
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEvent {
    /// Unique identifier for this event
    pub id: Uuid,

    /// What happened
    pub action: AuditAction,

    /// Human-readable description of the action
    pub details: Option<String>,

    /// The acting operator; `None` for pre-authentication events
    pub user_id: Option<String>,

    /// Request source address, when known
    pub source_address: Option<String>,

    /// Request user-agent string, when known
    pub agent_string: Option<String>,

    /// When the event was recorded
    pub timestamp: DateTime<Utc>,
}

impl AuditEvent {
    /// Create a new event with the current timestamp
    pub fn new(action: AuditAction, details: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            action,
            details: Some(details.into()),
            user_id: None,
            source_address: None,
            agent_string: None,
            timestamp: Utc::now(),
        }
    }

    /// Attribute the event to an operator
    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Attach request provenance
    pub fn with_provenance(
        mut self,
        source_address: Option<String>,
        agent_string: Option<String>,
    ) -> Self {
        self.source_address = source_address;
        self.agent_string = agent_string;
        self
    }
}

/// Enumerated action tags for audit events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    ExecuteCommand,
    CreateHost,
    UpdateHost,
    DeleteHost,
    TestConnection,
    Login,
    Logout,
}

impl AuditAction {
    /// Stable string form, shared by the wire format and the database
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::ExecuteCommand => "EXECUTE_COMMAND",
            AuditAction::CreateHost => "CREATE_HOST",
            AuditAction::UpdateHost => "UPDATE_HOST",
            AuditAction::DeleteHost => "DELETE_HOST",
            AuditAction::TestConnection => "TEST_CONNECTION",
            AuditAction::Login => "LOGIN",
            AuditAction::Logout => "LOGOUT",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuditAction {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "EXECUTE_COMMAND" => Ok(AuditAction::ExecuteCommand),
            "CREATE_HOST" => Ok(AuditAction::CreateHost),
            "UPDATE_HOST" => Ok(AuditAction::UpdateHost),
            "DELETE_HOST" => Ok(AuditAction::DeleteHost),
            "TEST_CONNECTION" => Ok(AuditAction::TestConnection),
            "LOGIN" => Ok(AuditAction::Login),
            "LOGOUT" => Ok(AuditAction::Logout),
            other => anyhow::bail!("unknown audit action: {}", other),
        }
    }
}

/// An audit event joined with operator display fields at read time
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditView {
    #[serde(flatten)]
    pub event: AuditEvent,

    /// Operator display fields (absent for anonymous events)
    pub user: Option<OperatorDisplay>,
}
