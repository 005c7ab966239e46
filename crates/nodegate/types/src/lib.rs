//! Nodegate domain types
//!
//! Plain data shared by the workflow dispatcher and the node state facades:
//!
//! - [`ids`] - run identifiers and workflow type identifiers
//! - [`identity`] - parties, distinguished names and public keys
//! - [`ledger`] - hashes, state references, states and transactions
//! - [`node`] - node metadata and version information
//! - [`params`] - workflow construction parameters and their schemas
//! - [`workflow`] - descriptors, progress events and outcomes
//!
//! None of these types carry behaviour beyond validation and formatting;
//! the engines live in `nodegate-dispatch` and `nodegate-node`.

#![deny(unsafe_code)]

pub mod identity;
pub mod ids;
pub mod ledger;
pub mod node;
pub mod params;
pub mod workflow;

pub use identity::{IdentityError, Party, PartyName, PublicKey};
pub use ids::{RunId, WorkflowType};
pub use ledger::{
    ContractState, LedgerError, SecureHash, SignedTransaction, StateAndRef, StateRef, StateStatus,
};
pub use node::{NodeInfo, NodeVersionInfo};
pub use params::{ParamError, ParamSchema, ParamSpec, ParamType, ParamValue, Params};
pub use workflow::{
    ExecutionErrorKind, ProgressEvent, WorkflowDescriptor, WorkflowExecutionError, WorkflowOutcome,
};
