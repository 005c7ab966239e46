//! Node metadata

use crate::identity::Party;
use serde::{Deserialize, Serialize};

/// Information a node publishes about itself on the network map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeInfo {
    pub addresses: Vec<String>,
    pub legal_identities: Vec<Party>,
    pub platform_version: u32,
    pub serial: u64,
}

impl NodeInfo {
    /// The node's primary legal identity, if it advertises any.
    pub fn primary_identity(&self) -> Option<&Party> {
        self.legal_identities.first()
    }
}

/// Version information of the node software
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeVersionInfo {
    pub release_version: String,
    pub revision: String,
    pub platform_version: u32,
    pub vendor: String,
}
