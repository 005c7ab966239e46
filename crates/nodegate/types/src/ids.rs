//! Strongly-typed identifiers for workflow runs
//!
//! Run identifiers are UUID-based but wrapped in a newtype for type safety.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Unique identifier of a single workflow invocation, assigned by the host
/// platform when the workflow is accepted. Never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RunId(Uuid);

impl RunId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "run:{}", self.0)
    }
}

impl FromStr for RunId {
    type Err = uuid::Error;

    /// Accepts both the bare UUID and the `run:`-prefixed display form.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.strip_prefix("run:").unwrap_or(s);
        Uuid::parse_str(raw).map(Self)
    }
}

/// Identifier of a workflow type, e.g. `com.example.IssueTokensFlow`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WorkflowType(String);

impl WorkflowType {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WorkflowType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for WorkflowType {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for WorkflowType {
    fn from(value: String) -> Self {
        Self(value)
    }
}
