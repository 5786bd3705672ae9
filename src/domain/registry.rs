//! Host and operator entities.
//!
//! The execution pipeline only reads these: host reachability gates command
//! submission, and display fields are joined into history views at read time.
//! Registry mutation lives outside the pipeline.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A registered remote host
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Host {
    pub id: String,
    pub name: String,
    pub hostname: String,
    pub status: HostStatus,
}

impl Host {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        hostname: impl Into<String>,
        status: HostStatus,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            hostname: hostname.into(),
            status,
        }
    }

    /// Only `Online` hosts accept command submissions
    pub fn is_online(&self) -> bool {
        self.status == HostStatus::Online
    }

    /// Display projection joined into job views
    pub fn display(&self) -> HostDisplay {
        HostDisplay {
            name: self.name.clone(),
            hostname: self.hostname.clone(),
        }
    }
}

/// Reachability status of a host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HostStatus {
    Online,
    Offline,
    Error,
}

impl HostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HostStatus::Online => "ONLINE",
            HostStatus::Offline => "OFFLINE",
            HostStatus::Error => "ERROR",
        }
    }
}

impl fmt::Display for HostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HostStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ONLINE" => Ok(HostStatus::Online),
            "OFFLINE" => Ok(HostStatus::Offline),
            "ERROR" => Ok(HostStatus::Error),
            other => anyhow::bail!("unknown host status: {}", other),
        }
    }
}

/// A console operator
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operator {
    pub id: String,
    pub name: String,
    pub email: String,
}

impl Operator {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            email: email.into(),
        }
    }

    /// Display projection joined into job and audit views
    pub fn display(&self) -> OperatorDisplay {
        OperatorDisplay {
            name: self.name.clone(),
            email: self.email.clone(),
        }
    }
}

/// Host display fields attached to job views
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostDisplay {
    pub name: String,
    pub hostname: String,
}

/// Operator display fields attached to job and audit views
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperatorDisplay {
    pub name: String,
    pub email: String,
}
