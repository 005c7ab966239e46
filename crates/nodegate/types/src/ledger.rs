//! Ledger references and opaque ledger records

use crate::identity::Party;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors parsing ledger references
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("Invalid hash: {0}")]
    InvalidHash(String),

    #[error("Invalid state reference: {0}")]
    InvalidStateRef(String),
}

/// SHA-256 digest identifying a transaction
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SecureHash([u8; 32]);

impl SecureHash {
    pub const LENGTH: usize = 32;

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for SecureHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode_upper(self.0))
    }
}

impl fmt::Debug for SecureHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecureHash({})", self)
    }
}

impl FromStr for SecureHash {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s).map_err(|e| LedgerError::InvalidHash(e.to_string()))?;
        let bytes: [u8; 32] = bytes.try_into().map_err(|v: Vec<u8>| {
            LedgerError::InvalidHash(format!(
                "expected {} bytes, got {}",
                Self::LENGTH,
                v.len()
            ))
        })?;
        Ok(Self(bytes))
    }
}

/// Pointer to a state: the transaction that produced it and its output index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StateRef {
    pub txhash: SecureHash,
    pub index: u32,
}

impl StateRef {
    pub fn new(txhash: SecureHash, index: u32) -> Self {
        Self { txhash, index }
    }
}

impl fmt::Display for StateRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.txhash, self.index)
    }
}

impl FromStr for StateRef {
    type Err = LedgerError;

    /// Parses the display form `HASH(index)`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || LedgerError::InvalidStateRef(s.to_string());
        let (hash, rest) = s.split_once('(').ok_or_else(invalid)?;
        let index = rest.strip_suffix(')').ok_or_else(invalid)?;
        Ok(Self {
            txhash: hash.parse()?,
            index: index.parse().map_err(|_| invalid())?,
        })
    }
}

/// Which states a vault lookup considers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum StateStatus {
    #[default]
    Unconsumed,
    Consumed,
    All,
}

/// Opaque contract state as held by the node's vault
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractState {
    pub contract_type: String,
    pub participants: Vec<Party>,
    pub data: serde_json::Value,
}

/// A state together with the reference it was resolved from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateAndRef {
    pub state: ContractState,
    pub reference: StateRef,
}

/// Opaque signed transaction as held by transaction storage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignedTransaction {
    pub id: SecureHash,
    pub inputs: Vec<StateRef>,
    pub outputs: Vec<ContractState>,
    pub signatures: Vec<crate::identity::PublicKey>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hash(byte: u8) -> SecureHash {
        SecureHash::from_bytes([byte; 32])
    }

    #[test]
    fn test_hash_parse_display() {
        let h = hash(0xab);
        assert_eq!(h.to_string().len(), 64);
        assert_eq!(h.to_string().parse::<SecureHash>().unwrap(), h);
        // lowercase input is accepted too
        assert_eq!(h.to_string().to_lowercase().parse::<SecureHash>().unwrap(), h);
    }

    #[test]
    fn test_hash_rejects_wrong_length() {
        assert!(matches!(
            "ABCD".parse::<SecureHash>(),
            Err(LedgerError::InvalidHash(_))
        ));
    }

    #[test]
    fn test_state_ref_parse() {
        let r = StateRef::new(hash(1), 3);
        assert_eq!(r.to_string().parse::<StateRef>().unwrap(), r);
        assert!("nohash".parse::<StateRef>().is_err());
        assert!(format!("{}(x)", hash(1)).parse::<StateRef>().is_err());
    }
}
