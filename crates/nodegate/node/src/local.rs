//! In-process node state, backed by the node's own services

use crate::error::Result;
use crate::state::{track_running, NodeState};
use async_trait::async_trait;
use nodegate_dispatch::{
    HostError, HostPlatform, NativeWorkflow, WorkflowDispatcher, WorkflowHandle, WorkflowInstance,
};
use nodegate_types::{
    NodeInfo, NodeVersionInfo, Party, PartyName, PublicKey, RunId, SecureHash,
    SignedTransaction, StateAndRef, StateRef, StateStatus, WorkflowDescriptor, WorkflowType,
};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, instrument};

/// The transaction that produced a state is not in local storage
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Cannot resolve transaction {0}")]
pub struct TransactionResolutionError(pub SecureHash);

/// Services a node exposes to code running inside it
#[async_trait]
pub trait NodeServices: Send + Sync {
    fn my_info(&self) -> NodeInfo;

    fn version_info(&self) -> NodeVersionInfo;

    fn well_known_party_from_name(&self, name: &PartyName) -> Option<Party>;

    fn party_from_key(&self, key: &PublicKey) -> Option<Party>;

    /// Load the state a reference points to from its producing transaction.
    fn to_state_and_ref(
        &self,
        state_ref: &StateRef,
    ) -> std::result::Result<StateAndRef, TransactionResolutionError>;

    /// Whether the vault has recorded the state as spent
    fn is_consumed(&self, state_ref: &StateRef) -> bool;

    fn transaction(&self, hash: &SecureHash) -> Option<SignedTransaction>;

    /// Start a workflow on the node's state machine and return its native handle.
    async fn start_tracked_workflow(
        &self,
        instance: WorkflowInstance,
    ) -> std::result::Result<NativeWorkflow, HostError>;

    /// Native handle of a workflow already running on the node, if any.
    async fn running_workflow(
        &self,
        _run_id: RunId,
    ) -> std::result::Result<Option<NativeWorkflow>, HostError> {
        Ok(None)
    }
}

/// Host platform that starts workflows directly on the node's state machine
pub struct LocalHostPlatform {
    services: Arc<dyn NodeServices>,
}

impl LocalHostPlatform {
    pub fn new(services: Arc<dyn NodeServices>) -> Self {
        Self { services }
    }
}

#[async_trait]
impl HostPlatform for LocalHostPlatform {
    async fn start(
        &self,
        instance: WorkflowInstance,
    ) -> std::result::Result<NativeWorkflow, HostError> {
        self.services.start_tracked_workflow(instance).await
    }

    async fn lookup_native(
        &self,
        run_id: RunId,
    ) -> std::result::Result<Option<NativeWorkflow>, HostError> {
        self.services.running_workflow(run_id).await
    }

    fn name(&self) -> &str {
        "in-process"
    }
}

/// [`NodeState`] served from inside the node
pub struct LocalNodeState {
    services: Arc<dyn NodeServices>,
    dispatcher: Arc<WorkflowDispatcher>,
}

impl LocalNodeState {
    pub fn new(services: Arc<dyn NodeServices>, dispatcher: Arc<WorkflowDispatcher>) -> Self {
        Self {
            services,
            dispatcher,
        }
    }

    pub fn dispatcher(&self) -> &Arc<WorkflowDispatcher> {
        &self.dispatcher
    }
}

fn status_matches(status: StateStatus, consumed: bool) -> bool {
    match status {
        StateStatus::Unconsumed => !consumed,
        StateStatus::Consumed => consumed,
        StateStatus::All => true,
    }
}

#[async_trait]
impl NodeState for LocalNodeState {
    async fn node_info(&self) -> Result<NodeInfo> {
        Ok(self.services.my_info())
    }

    async fn node_version_info(&self) -> Result<NodeVersionInfo> {
        Ok(self.services.version_info())
    }

    async fn well_known_party_from_name(&self, name: &PartyName) -> Result<Option<Party>> {
        Ok(self.services.well_known_party_from_name(name))
    }

    async fn party_from_key(&self, key: &PublicKey) -> Result<Option<Party>> {
        Ok(self.services.party_from_key(key))
    }

    async fn find_state_by_ref(
        &self,
        state_ref: &StateRef,
        status: StateStatus,
    ) -> Result<Option<StateAndRef>> {
        let state = match self.services.to_state_and_ref(state_ref) {
            Ok(state) => state,
            Err(e) => {
                debug!(state_ref = %state_ref, error = %e, "State reference not resolvable");
                return Ok(None);
            }
        };

        let consumed = self.services.is_consumed(state_ref);
        Ok(status_matches(status, consumed).then_some(state))
    }

    async fn find_transaction_by_hash(
        &self,
        hash: &SecureHash,
    ) -> Result<Option<SignedTransaction>> {
        Ok(self.services.transaction(hash))
    }

    #[instrument(skip(self, descriptor), fields(workflow_type = %descriptor.workflow_type))]
    async fn initiate_workflow(&self, descriptor: &WorkflowDescriptor) -> Result<WorkflowHandle> {
        Ok(self.dispatcher.initiate(descriptor).await?)
    }

    async fn track_running_workflow(
        &self,
        workflow_type: &WorkflowType,
        run_id: RunId,
    ) -> Result<WorkflowHandle> {
        track_running(&self.dispatcher, workflow_type, run_id).await
    }
}
