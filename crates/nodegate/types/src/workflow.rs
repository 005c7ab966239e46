//! Workflow descriptors, progress events and outcomes

use crate::ids::{RunId, WorkflowType};
use crate::params::{ParamValue, Params};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Caller-supplied request to start a workflow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowDescriptor {
    pub workflow_type: WorkflowType,
    #[serde(default)]
    pub params: Params,
    #[serde(default)]
    pub track_progress: bool,
}

impl WorkflowDescriptor {
    pub fn new(workflow_type: impl Into<WorkflowType>) -> Self {
        Self {
            workflow_type: workflow_type.into(),
            params: Params::new(),
            track_progress: false,
        }
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    pub fn with_progress(mut self, track_progress: bool) -> Self {
        self.track_progress = track_progress;
        self
    }
}

/// One intermediate progress step reported by a running workflow
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub run_id: RunId,
    pub step: String,
    pub timestamp: DateTime<Utc>,
}

impl ProgressEvent {
    pub fn new(run_id: RunId, step: impl Into<String>) -> Self {
        Self {
            run_id,
            step: step.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Broad classification of an abnormal workflow termination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExecutionErrorKind {
    /// The workflow logic itself raised an error
    Failed,
    /// The host platform lost or abandoned the workflow
    HostFailure,
    /// The native completion signal was dropped without a value
    Abandoned,
}

impl fmt::Display for ExecutionErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExecutionErrorKind::Failed => "failed",
            ExecutionErrorKind::HostFailure => "host failure",
            ExecutionErrorKind::Abandoned => "abandoned",
        };
        f.write_str(name)
    }
}

/// Abnormal termination of a workflow that did start.
///
/// Delivered as the error branch of a result slot, never thrown.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("Workflow {kind}: {message}")]
pub struct WorkflowExecutionError {
    pub kind: ExecutionErrorKind,
    pub message: String,
}

impl WorkflowExecutionError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            kind: ExecutionErrorKind::Failed,
            message: message.into(),
        }
    }

    pub fn host_failure(message: impl Into<String>) -> Self {
        Self {
            kind: ExecutionErrorKind::HostFailure,
            message: message.into(),
        }
    }

    pub fn abandoned(message: impl Into<String>) -> Self {
        Self {
            kind: ExecutionErrorKind::Abandoned,
            message: message.into(),
        }
    }
}

/// Terminal value of a workflow: its return value or the reason it failed
pub type WorkflowOutcome = Result<serde_json::Value, WorkflowExecutionError>;
