//! Party identities
//!
//! A party is a well-known legal identity on the network: a distinguished
//! name (`O=Bank A, L=London, C=GB`) bound to the public key it signs with.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors parsing identity values
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    #[error("Malformed distinguished name attribute: {0}")]
    MalformedAttribute(String),

    #[error("Unsupported distinguished name attribute: {0}")]
    UnsupportedAttribute(String),

    #[error("Duplicate distinguished name attribute: {0}")]
    DuplicateAttribute(String),

    #[error("Missing mandatory attribute: {0}")]
    MissingAttribute(&'static str),

    #[error("Country must be a two-letter code, got: {0}")]
    InvalidCountry(String),

    #[error("Invalid public key encoding: {0}")]
    InvalidKey(String),
}

/// X.500-style distinguished name identifying a legal entity
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PartyName {
    pub common_name: Option<String>,
    pub organisation_unit: Option<String>,
    pub organisation: String,
    pub locality: String,
    pub state: Option<String>,
    pub country: String,
}

impl PartyName {
    pub fn new(
        organisation: impl Into<String>,
        locality: impl Into<String>,
        country: impl Into<String>,
    ) -> Self {
        Self {
            common_name: None,
            organisation_unit: None,
            organisation: organisation.into(),
            locality: locality.into(),
            state: None,
            country: country.into(),
        }
    }

    /// Parse a comma separated attribute list, e.g. `O=Bank A, L=London, C=GB`.
    ///
    /// Attribute order is not significant. `O`, `L` and `C` are mandatory.
    pub fn parse(s: &str) -> Result<Self, IdentityError> {
        let mut common_name = None;
        let mut organisation_unit = None;
        let mut organisation = None;
        let mut locality = None;
        let mut state = None;
        let mut country = None;

        for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (key, value) = part
                .split_once('=')
                .ok_or_else(|| IdentityError::MalformedAttribute(part.to_string()))?;
            let value = value.trim().to_string();
            let slot = match key.trim().to_ascii_uppercase().as_str() {
                "CN" => &mut common_name,
                "OU" => &mut organisation_unit,
                "O" => &mut organisation,
                "L" => &mut locality,
                "ST" => &mut state,
                "C" => &mut country,
                other => return Err(IdentityError::UnsupportedAttribute(other.to_string())),
            };
            if slot.replace(value).is_some() {
                return Err(IdentityError::DuplicateAttribute(key.trim().to_string()));
            }
        }

        let country = country.ok_or(IdentityError::MissingAttribute("C"))?;
        if country.len() != 2 || !country.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(IdentityError::InvalidCountry(country));
        }

        Ok(Self {
            common_name,
            organisation_unit,
            organisation: organisation.ok_or(IdentityError::MissingAttribute("O"))?,
            locality: locality.ok_or(IdentityError::MissingAttribute("L"))?,
            state,
            country,
        })
    }
}

impl fmt::Display for PartyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(cn) = &self.common_name {
            write!(f, "CN={}, ", cn)?;
        }
        if let Some(ou) = &self.organisation_unit {
            write!(f, "OU={}, ", ou)?;
        }
        write!(f, "O={}, L={}, ", self.organisation, self.locality)?;
        if let Some(st) = &self.state {
            write!(f, "ST={}, ", st)?;
        }
        write!(f, "C={}", self.country)
    }
}

impl FromStr for PartyName {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Opaque encoded public key
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PublicKey(Vec<u8>);

impl PublicKey {
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn from_hex(s: &str) -> Result<Self, IdentityError> {
        hex::decode(s)
            .map(Self)
            .map_err(|e| IdentityError::InvalidKey(e.to_string()))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(&self.0))
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self)
    }
}

/// Well-known party: a legal name bound to its owning key
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Party {
    pub name: PartyName,
    pub owning_key: PublicKey,
}

impl Party {
    pub fn new(name: PartyName, owning_key: PublicKey) -> Self {
        Self { name, owning_key }
    }
}
