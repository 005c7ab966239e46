//! Dispatch error types

use nodegate_types::{ParamError, RunId, WorkflowType};
use thiserror::Error;

/// Errors raised synchronously by the dispatcher.
///
/// Failures of a workflow that did start are never reported here; they
/// arrive through the error branch of the handle's result slot.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Cannot construct workflow {workflow_type}: {reason}")]
    Construction {
        workflow_type: WorkflowType,
        reason: ConstructionFailure,
    },

    #[error("Host platform {host} refused to start {workflow_type}: {source}")]
    HostRejection {
        host: String,
        workflow_type: WorkflowType,
        #[source]
        source: HostError,
    },

    #[error("Unknown run id {0} -- workflow may have already completed")]
    UnknownRunIdentifier(RunId),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl DispatchError {
    pub fn is_construction(&self) -> bool {
        matches!(self, DispatchError::Construction { .. })
    }

    pub fn is_host_rejection(&self) -> bool {
        matches!(self, DispatchError::HostRejection { .. })
    }
}

/// Why a workflow value could not be built client-side
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConstructionFailure {
    #[error("workflow type is not registered")]
    UnknownType,

    #[error("{0}")]
    InvalidParams(#[from] ParamError),

    #[error("rejected by factory: {0}")]
    Rejected(String),
}

/// Errors reported by a host platform gateway
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    #[error("rejected: {0}")]
    Rejected(String),

    #[error("unavailable: {0}")]
    Unavailable(String),

    #[error("progress feed failed: {0}")]
    Progress(String),
}

/// Errors registering workflow factories
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    #[error("Workflow type already registered: {0}")]
    Duplicate(WorkflowType),
}

/// Result type for dispatch operations
pub type Result<T> = std::result::Result<T, DispatchError>;
