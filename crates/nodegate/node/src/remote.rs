//! Remote node state, reached through the node's RPC operations

use crate::error::{Result, RpcError};
use crate::state::{single_or_none, track_running, NodeState};
use async_trait::async_trait;
use nodegate_dispatch::{
    HostError, HostPlatform, NativeWorkflow, WorkflowDispatcher, WorkflowHandle, WorkflowInstance,
};
use nodegate_types::{
    NodeInfo, NodeVersionInfo, Party, PartyName, PublicKey, RunId, SecureHash,
    SignedTransaction, StateAndRef, StateRef, StateStatus, WorkflowDescriptor, WorkflowType,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;

/// Diagnostic information as reported over RPC
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeDiagnosticInfo {
    pub version: String,
    pub revision: String,
    pub platform_version: u32,
    pub vendor: String,
}

impl From<NodeDiagnosticInfo> for NodeVersionInfo {
    fn from(info: NodeDiagnosticInfo) -> Self {
        NodeVersionInfo {
            release_version: info.version,
            revision: info.revision,
            platform_version: info.platform_version,
            vendor: info.vendor,
        }
    }
}

/// RPC operations of a remote node
///
/// The transport behind these calls is provided by the embedding process.
#[async_trait]
pub trait NodeRpcOps: Send + Sync {
    async fn node_info(&self) -> std::result::Result<NodeInfo, RpcError>;

    async fn node_diagnostic_info(&self) -> std::result::Result<NodeDiagnosticInfo, RpcError>;

    async fn well_known_party_from_name(
        &self,
        name: &PartyName,
    ) -> std::result::Result<Option<Party>, RpcError>;

    async fn party_from_key(&self, key: &PublicKey)
        -> std::result::Result<Option<Party>, RpcError>;

    async fn find_verified_transaction(
        &self,
        hash: &SecureHash,
    ) -> std::result::Result<Option<SignedTransaction>, RpcError>;

    /// Vault query restricted to the given references and status
    async fn vault_query_by_ref(
        &self,
        state_refs: &[StateRef],
        status: StateStatus,
    ) -> std::result::Result<Vec<StateAndRef>, RpcError>;

    async fn start_tracked_workflow(
        &self,
        instance: WorkflowInstance,
    ) -> std::result::Result<NativeWorkflow, RpcError>;

    /// Re-attach to the result and progress of a running workflow.
    async fn reattach_workflow(
        &self,
        _run_id: RunId,
    ) -> std::result::Result<Option<NativeWorkflow>, RpcError> {
        Ok(None)
    }
}

impl From<RpcError> for HostError {
    fn from(e: RpcError) -> Self {
        match e {
            RpcError::Unavailable(reason) => HostError::Unavailable(reason),
            RpcError::Remote(reason) => HostError::Rejected(reason),
        }
    }
}

/// Host platform that starts workflows over RPC
pub struct RpcHostPlatform {
    rpc: Arc<dyn NodeRpcOps>,
}

impl RpcHostPlatform {
    pub fn new(rpc: Arc<dyn NodeRpcOps>) -> Self {
        Self { rpc }
    }
}

#[async_trait]
impl HostPlatform for RpcHostPlatform {
    async fn start(
        &self,
        instance: WorkflowInstance,
    ) -> std::result::Result<NativeWorkflow, HostError> {
        Ok(self.rpc.start_tracked_workflow(instance).await?)
    }

    async fn lookup_native(
        &self,
        run_id: RunId,
    ) -> std::result::Result<Option<NativeWorkflow>, HostError> {
        Ok(self.rpc.reattach_workflow(run_id).await?)
    }

    fn name(&self) -> &str {
        "rpc"
    }
}

/// [`NodeState`] served from a separate process over RPC
pub struct RemoteNodeState {
    rpc: Arc<dyn NodeRpcOps>,
    dispatcher: Arc<WorkflowDispatcher>,
}

impl RemoteNodeState {
    pub fn new(rpc: Arc<dyn NodeRpcOps>, dispatcher: Arc<WorkflowDispatcher>) -> Self {
        Self { rpc, dispatcher }
    }

    pub fn dispatcher(&self) -> &Arc<WorkflowDispatcher> {
        &self.dispatcher
    }
}

#[async_trait]
impl NodeState for RemoteNodeState {
    async fn node_info(&self) -> Result<NodeInfo> {
        Ok(self.rpc.node_info().await?)
    }

    async fn node_version_info(&self) -> Result<NodeVersionInfo> {
        Ok(self.rpc.node_diagnostic_info().await?.into())
    }

    async fn well_known_party_from_name(&self, name: &PartyName) -> Result<Option<Party>> {
        Ok(self.rpc.well_known_party_from_name(name).await?)
    }

    async fn party_from_key(&self, key: &PublicKey) -> Result<Option<Party>> {
        Ok(self.rpc.party_from_key(key).await?)
    }

    async fn find_state_by_ref(
        &self,
        state_ref: &StateRef,
        status: StateStatus,
    ) -> Result<Option<StateAndRef>> {
        let states = self
            .rpc
            .vault_query_by_ref(std::slice::from_ref(state_ref), status)
            .await?;
        Ok(single_or_none(states))
    }

    async fn find_transaction_by_hash(
        &self,
        hash: &SecureHash,
    ) -> Result<Option<SignedTransaction>> {
        Ok(self.rpc.find_verified_transaction(hash).await?)
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
