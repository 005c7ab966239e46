//! Nodegate Node Adapter
//!
//! Uniform access to one ledger node: identity lookups, vault and
//! transaction queries, and workflow initiation and tracking. The same
//! [`NodeState`] trait is served either from inside the node process
//! ([`LocalNodeState`] over [`NodeServices`]) or from a separate process
//! ([`RemoteNodeState`] over [`NodeRpcOps`]); [`NodeAdapter`] assembles
//! the right one for a [`DeploymentMode`].

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]

pub mod config;
pub mod error;
pub mod local;
pub mod logging;
pub mod module;
pub mod remote;
pub mod state;

pub use config::{DeploymentMode, NodeAdapterConfig};
pub use error::{NodeStateError, Result, RpcError};
pub use local::{LocalHostPlatform, LocalNodeState, NodeServices, TransactionResolutionError};
pub use logging::init_tracing;
pub use module::{NodeAdapter, NodeBackend};
pub use remote::{NodeDiagnosticInfo, NodeRpcOps, RemoteNodeState, RpcHostPlatform};
pub use state::NodeState;
