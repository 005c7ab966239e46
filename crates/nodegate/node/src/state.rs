//! Node State Facade - uniform read access to a node plus workflow control
//!
//! The same trait is served in-process (node services called directly) and
//! remotely (node RPC). Both share one [`WorkflowDispatcher`], so workflow
//! handles behave identically whichever way the node is reached.

use crate::error::{NodeStateError, Result};
use async_trait::async_trait;
use nodegate_dispatch::{WorkflowDispatcher, WorkflowHandle};
use nodegate_types::{
    NodeInfo, NodeVersionInfo, Party, PartyName, PublicKey, RunId, SecureHash,
    SignedTransaction, StateAndRef, StateRef, StateStatus, WorkflowDescriptor, WorkflowType,
};
use tracing::debug;

/// Access to the state held by one ledger node
#[async_trait]
pub trait NodeState: Send + Sync {
    async fn node_info(&self) -> Result<NodeInfo>;

    async fn node_version_info(&self) -> Result<NodeVersionInfo>;

    /// Resolve a well-known party by its full X.500 name.
    async fn well_known_party_from_name(&self, name: &PartyName) -> Result<Option<Party>>;

    async fn party_from_key(&self, key: &PublicKey) -> Result<Option<Party>>;

    /// Look up a state by reference, restricted to `status`.
    ///
    /// A reference whose transaction cannot be resolved is reported as
    /// `None`, not as an error.
    async fn find_state_by_ref(
        &self,
        state_ref: &StateRef,
        status: StateStatus,
    ) -> Result<Option<StateAndRef>>;

    async fn find_transaction_by_hash(&self, hash: &SecureHash)
        -> Result<Option<SignedTransaction>>;

    /// Start a workflow; see [`WorkflowDispatcher::initiate`].
    async fn initiate_workflow(&self, descriptor: &WorkflowDescriptor) -> Result<WorkflowHandle>;

    /// Handle of a workflow that is still running.
    ///
    /// Fails with [`NodeStateError::UnknownRunIdentifier`] when the workflow
    /// is neither tracked nor recoverable, which includes workflows that
    /// already completed, and with [`NodeStateError::WorkflowTypeMismatch`]
    /// when it is running under a different type.
    async fn track_running_workflow(
        &self,
        workflow_type: &WorkflowType,
        run_id: RunId,
    ) -> Result<WorkflowHandle>;
}

/// Lookup shared by the facade implementations: tracked handle first, then
/// recovery through the host platform.
pub(crate) async fn track_running(
    dispatcher: &WorkflowDispatcher,
    workflow_type: &WorkflowType,
    run_id: RunId,
) -> Result<WorkflowHandle> {
    let handle = match dispatcher.lookup(&run_id) {
        Some(handle) => handle,
        None => {
            debug!(run_id = %run_id, "Run id not tracked, asking host platform");
            dispatcher
                .recover(run_id, workflow_type.clone())
                .await?
                .ok_or(NodeStateError::UnknownRunIdentifier(run_id))?
        }
    };

    if handle.workflow_type() != workflow_type {
        return Err(NodeStateError::WorkflowTypeMismatch {
            run_id,
            requested: workflow_type.clone(),
            actual: handle.workflow_type().clone(),
        });
    }
    Ok(handle)
}

/// Exactly one match, otherwise `None`.
pub(crate) fn single_or_none<T>(items: Vec<T>) -> Option<T> {
    let mut items = items.into_iter();
    match (items.next(), items.next()) {
        (Some(item), None) => Some(item),
        _ => None,
    }
}
