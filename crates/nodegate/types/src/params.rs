//! Workflow construction parameters
//!
//! A workflow type declares the shape of its constructor as a
//! [`ParamSchema`]. Callers supply a [`Params`] map of named values which is
//! checked against the schema before anything is sent to the host platform.

use crate::identity::PartyName;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use thiserror::Error;

/// A single parameter value
pub type ParamValue = serde_json::Value;

/// Named construction parameters
pub type Params = BTreeMap<String, ParamValue>;

/// Parameter schema violations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParamError {
    #[error("Missing mandatory parameter: {0}")]
    Missing(String),

    #[error("Unknown parameter: {0}")]
    Unknown(String),

    #[error("Parameter {name} expected {expected}, found {found}")]
    TypeMismatch {
        name: String,
        expected: ParamType,
        found: String,
    },

    #[error("Parameter declared more than once: {0}")]
    DuplicateSpec(String),
}

/// Declared type of a constructor parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParamType {
    String,
    Integer,
    Decimal,
    Boolean,
    /// Distinguished name of a party, e.g. `O=Bank A, L=London, C=GB`
    Party,
    /// `{ "quantity": <integer>, "token": <string> }`
    Amount,
    /// Any JSON value, passed through untouched
    Json,
}

impl ParamType {
    /// Check whether `value` is acceptable for this type.
    pub fn accepts(&self, value: &ParamValue) -> bool {
        use serde_json::Value;
        match self {
            ParamType::String => value.is_string(),
            ParamType::Integer => value.is_i64() || value.is_u64(),
            ParamType::Decimal => match value {
                Value::Number(_) => true,
                Value::String(s) => s.trim().parse::<f64>().is_ok(),
                _ => false,
            },
            ParamType::Boolean => value.is_boolean(),
            ParamType::Party => value
                .as_str()
                .map(|s| PartyName::parse(s).is_ok())
                .unwrap_or(false),
            ParamType::Amount => match value {
                Value::Object(fields) => {
                    fields.len() == 2
                        && fields
                            .get("quantity")
                            .map(|q| q.is_i64() || q.is_u64())
                            .unwrap_or(false)
                        && fields.get("token").map(Value::is_string).unwrap_or(false)
                }
                _ => false,
            },
            ParamType::Json => true,
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ParamType::String => "string",
            ParamType::Integer => "integer",
            ParamType::Decimal => "decimal",
            ParamType::Boolean => "boolean",
            ParamType::Party => "party",
            ParamType::Amount => "amount",
            ParamType::Json => "json",
        };
        f.write_str(name)
    }
}

/// Declaration of one constructor parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamSpec {
    pub name: String,
    pub ty: ParamType,
    pub required: bool,
}

impl ParamSpec {
    pub fn required(name: impl Into<String>, ty: ParamType) -> Self {
        Self {
            name: name.into(),
            ty,
            required: true,
        }
    }

    pub fn optional(name: impl Into<String>, ty: ParamType) -> Self {
        Self {
            name: name.into(),
            ty,
            required: false,
        }
    }
}

/// Constructor shape of a workflow type
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamSchema {
    params: Vec<ParamSpec>,
}

impl ParamSchema {
    /// Build a schema, rejecting duplicate parameter names.
    pub fn new(params: Vec<ParamSpec>) -> Result<Self, ParamError> {
        let mut seen = HashSet::new();
        for spec in &params {
            if !seen.insert(spec.name.as_str()) {
                return Err(ParamError::DuplicateSpec(spec.name.clone()));
            }
        }
        Ok(Self { params })
    }

    /// Schema of a workflow that takes no parameters
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    pub fn get(&self, name: &str) -> Option<&ParamSpec> {
        self.params.iter().find(|p| p.name == name)
    }

    /// Check arity and type compatibility of `values`.
    ///
    /// `null` counts as absent. Unknown names are rejected rather than ignored.
    pub fn validate(&self, values: &Params) -> Result<(), ParamError> {
        for name in values.keys() {
            if self.get(name).is_none() {
                return Err(ParamError::Unknown(name.clone()));
            }
        }

        for spec in &self.params {
            match values.get(&spec.name) {
                None | Some(serde_json::Value::Null) => {
                    if spec.required {
                        return Err(ParamError::Missing(spec.name.clone()));
                    }
                }
                Some(value) if !spec.ty.accepts(value) => {
                    return Err(ParamError::TypeMismatch {
                        name: spec.name.clone(),
                        expected: spec.ty,
                        found: json_kind(value).to_string(),
                    });
                }
                Some(_) => {}
            }
        }

        Ok(())
    }
}

fn json_kind(value: &ParamValue) -> &'static str {
    use serde_json::Value;
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "decimal",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn issue_schema() -> ParamSchema {
        ParamSchema::new(vec![
            ParamSpec::required("amount", ParamType::Amount),
            ParamSpec::required("recipient", ParamType::Party),
            ParamSpec::optional("memo", ParamType::String),
        ])
        .unwrap()
    }

    fn params(pairs: &[(&str, ParamValue)]) -> Params {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_valid_params() {
        let values = params(&[
            ("amount", json!({"quantity": 100, "token": "GBP"})),
            ("recipient", json!("O=Bank B, L=Paris, C=FR")),
        ]);
        assert!(issue_schema().validate(&values).is_ok());
    }

    #[test]
    fn test_missing_required() {
        let values = params(&[("amount", json!({"quantity": 1, "token": "GBP"}))]);
        assert_eq!(
            issue_schema().validate(&values),
            Err(ParamError::Missing("recipient".into()))
        );
    }

    #[test]
    fn test_null_counts_as_absent() {
        let values = params(&[
            ("amount", json!({"quantity": 1, "token": "GBP"})),
            ("recipient", json!("O=Bank B, L=Paris, C=FR")),
            ("memo", ParamValue::Null),
        ]);
        assert!(issue_schema().validate(&values).is_ok());

        let values = params(&[
            ("amount", json!({"quantity": 1, "token": "GBP"})),
            ("recipient", ParamValue::Null),
        ]);
        assert!(matches!(
            issue_schema().validate(&values),
            Err(ParamError::Missing(_))
        ));
    }

    #[test]
    fn test_unknown_param() {
        let values = params(&[
            ("amount", json!({"quantity": 1, "token": "GBP"})),
            ("recipient", json!("O=Bank B, L=Paris, C=FR")),
            ("colour", json!("blue")),
        ]);
        assert_eq!(
            issue_schema().validate(&values),
            Err(ParamError::Unknown("colour".into()))
        );
    }

    #[test]
    fn test_type_mismatch() {
        let values = params(&[
            ("amount", json!(100)),
            ("recipient", json!("O=Bank B, L=Paris, C=FR")),
        ]);
        match issue_schema().validate(&values) {
            Err(ParamError::TypeMismatch {
                name,
                expected,
                found,
            }) => {
                assert_eq!(name, "amount");
                assert_eq!(expected, ParamType::Amount);
                assert_eq!(found, "integer");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_spec_rejected() {
        let result = ParamSchema::new(vec![
            ParamSpec::required("a", ParamType::String),
            ParamSpec::optional("a", ParamType::Integer),
        ]);
        assert_eq!(result, Err(ParamError::DuplicateSpec("a".into())));
    }

    #[test]
    fn test_type_acceptance() {
        assert!(ParamType::Decimal.accepts(&json!(1.5)));
        assert!(ParamType::Decimal.accepts(&json!("12.25")));
        assert!(!ParamType::Decimal.accepts(&json!("twelve")));
        assert!(ParamType::Integer.accepts(&json!(-3)));
        assert!(!ParamType::Integer.accepts(&json!(1.5)));
        assert!(!ParamType::Party.accepts(&json!("nobody")));
        assert!(!ParamType::Amount.accepts(&json!({"quantity": 1})));
        assert!(ParamType::Json.accepts(&json!([1, 2, 3])));
    }

    proptest! {
        #[test]
        fn integers_never_satisfy_string_params(n in any::<i64>()) {
            let schema = ParamSchema::new(vec![ParamSpec::required("s", ParamType::String)]).unwrap();
            let values = params(&[("s", json!(n))]);
            let rejected = matches!(schema.validate(&values), Err(ParamError::TypeMismatch { .. }));
            prop_assert!(rejected);
        }

        #[test]
        fn any_string_satisfies_string_params(s in ".*") {
            let schema = ParamSchema::new(vec![ParamSpec::required("s", ParamType::String)]).unwrap();
            let values = params(&[("s", json!(s))]);
            prop_assert!(schema.validate(&values).is_ok());
        }
    }
}
