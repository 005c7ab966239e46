//! Node adapter error types

use nodegate_dispatch::DispatchError;
use nodegate_types::{RunId, WorkflowType};
use thiserror::Error;

/// Errors from the node state facade
#[derive(Debug, Error)]
pub enum NodeStateError {
    #[error("Unknown run id {0} -- workflow may have already completed")]
    UnknownRunIdentifier(RunId),

    #[error("Workflow {run_id} is a {actual}, not a {requested}")]
    WorkflowTypeMismatch {
        run_id: RunId,
        requested: WorkflowType,
        actual: WorkflowType,
    },

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error("RPC error: {0}")]
    Rpc(#[from] RpcError),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Failure of a call to a remote node
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RpcError {
    /// The connection to the node is down or could not be established
    #[error("Node connection unavailable: {0}")]
    Unavailable(String),

    /// The node received the call and answered with an error
    #[error("Remote call failed: {0}")]
    Remote(String),
}

pub type Result<T> = std::result::Result<T, NodeStateError>;
