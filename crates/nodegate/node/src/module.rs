//! Node adapter wiring: assembles the dispatcher and node state facade for
//! a deployment mode.

use crate::config::{DeploymentMode, NodeAdapterConfig};
use crate::error::{NodeStateError, Result};
use crate::local::{LocalHostPlatform, LocalNodeState, NodeServices};
use crate::remote::{NodeRpcOps, RemoteNodeState, RpcHostPlatform};
use crate::state::NodeState;
use nodegate_dispatch::{DispatcherConfig, WorkflowDispatcher, WorkflowFactoryRegistry};
use std::sync::Arc;
use tracing::info;

/// The node connection a deployment provides
pub enum NodeBackend {
    InProcess(Arc<dyn NodeServices>),
    Remote(Arc<dyn NodeRpcOps>),
}

impl NodeBackend {
    pub fn mode(&self) -> DeploymentMode {
        match self {
            NodeBackend::InProcess(_) => DeploymentMode::InProcess,
            NodeBackend::Remote(_) => DeploymentMode::Remote,
        }
    }
}

/// An assembled node adapter
pub struct NodeAdapter {
    mode: DeploymentMode,
    state: Arc<dyn NodeState>,
    dispatcher: Arc<WorkflowDispatcher>,
}

impl NodeAdapter {
    /// Adapter embedded in the node process.
    pub fn in_process(
        services: Arc<dyn NodeServices>,
        factories: WorkflowFactoryRegistry,
        config: DispatcherConfig,
    ) -> Result<Self> {
        let host = Arc::new(LocalHostPlatform::new(services.clone()));
        let dispatcher = Arc::new(WorkflowDispatcher::with_config(host, factories, config)?);
        let state = Arc::new(LocalNodeState::new(services, dispatcher.clone()));

        info!(mode = %DeploymentMode::InProcess, "Node adapter assembled");
        Ok(Self {
            mode: DeploymentMode::InProcess,
            state,
            dispatcher,
        })
    }

    /// Adapter talking to the node over RPC.
    pub fn remote(
        rpc: Arc<dyn NodeRpcOps>,
        factories: WorkflowFactoryRegistry,
        config: DispatcherConfig,
    ) -> Result<Self> {
        let host = Arc::new(RpcHostPlatform::new(rpc.clone()));
        let dispatcher = Arc::new(WorkflowDispatcher::with_config(host, factories, config)?);
        let state = Arc::new(RemoteNodeState::new(rpc, dispatcher.clone()));

        info!(mode = %DeploymentMode::Remote, "Node adapter assembled");
        Ok(Self {
            mode: DeploymentMode::Remote,
            state,
            dispatcher,
        })
    }

    /// Assemble from configuration; the backend must match the configured mode.
    pub fn from_config(
        config: &NodeAdapterConfig,
        backend: NodeBackend,
        factories: WorkflowFactoryRegistry,
    ) -> Result<Self> {
        config.validate()?;
        if backend.mode() != config.mode {
            return Err(NodeStateError::Config(format!(
                "configured for {} deployment but given a {} node backend",
                config.mode,
                backend.mode()
            )));
        }

        match backend {
            NodeBackend::InProcess(services) => {
                Self::in_process(services, factories, config.dispatcher.clone())
            }
            NodeBackend::Remote(rpc) => Self::remote(rpc, factories, config.dispatcher.clone()),
        }
    }

    pub fn mode(&self) -> DeploymentMode {
        self.mode
    }

    pub fn node_state(&self) -> Arc<dyn NodeState> {
        self.state.clone()
    }

    pub fn dispatcher(&self) -> &Arc<WorkflowDispatcher> {
        &self.dispatcher
    }
}

impl std::fmt::Debug for NodeAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeAdapter")
            .field("mode", &self.mode)
            .field("dispatcher", &self.dispatcher)
            .finish()
    }
}
