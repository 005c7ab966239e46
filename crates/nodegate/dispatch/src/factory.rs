//! Workflow factory registry: builds workflow values from descriptors
//!
//! Each workflow type is registered once together with its constructor
//! schema. Instantiation validates the caller's parameters against that
//! schema before the factory runs, so a malformed request fails fast and
//! never reaches the host platform.

use crate::error::{ConstructionFailure, DispatchError, RegistrationError, Result};
use nodegate_types::{ParamSchema, Params, WorkflowDescriptor, WorkflowType};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// A constructed workflow value, ready to be submitted to the host platform
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowInstance {
    /// Concrete type that was built; may be more specific than the requested one
    pub workflow_type: WorkflowType,
    pub params: Params,
    /// Whether the workflow reports intermediate progress at all
    pub has_progress_tracker: bool,
    /// Whether the caller asked for progress updates
    pub track_progress: bool,
}

impl WorkflowInstance {
    pub fn new(workflow_type: impl Into<WorkflowType>, params: Params) -> Self {
        Self {
            workflow_type: workflow_type.into(),
            params,
            has_progress_tracker: false,
            track_progress: false,
        }
    }

    pub fn with_progress_tracker(mut self) -> Self {
        self.has_progress_tracker = true;
        self
    }
}

/// Builds a workflow value from validated parameters.
///
/// Returning `Err` rejects the construction with the given reason.
pub type FactoryFn =
    dyn Fn(&WorkflowType, &Params) -> std::result::Result<WorkflowInstance, String> + Send + Sync;

#[derive(Clone)]
struct RegisteredWorkflow {
    schema: ParamSchema,
    factory: Arc<FactoryFn>,
}

/// Registry of workflow factories keyed by type
#[derive(Clone, Default)]
pub struct WorkflowFactoryRegistry {
    workflows: BTreeMap<WorkflowType, RegisteredWorkflow>,
}

impl WorkflowFactoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory for `workflow_type` with its constructor schema.
    pub fn register<F>(
        &mut self,
        workflow_type: impl Into<WorkflowType>,
        schema: ParamSchema,
        factory: F,
    ) -> std::result::Result<(), RegistrationError>
    where
        F: Fn(&WorkflowType, &Params) -> std::result::Result<WorkflowInstance, String>
            + Send
            + Sync
            + 'static,
    {
        let workflow_type = workflow_type.into();
        if self.workflows.contains_key(&workflow_type) {
            return Err(RegistrationError::Duplicate(workflow_type));
        }

        tracing::info!(
            workflow_type = %workflow_type,
            params = schema.params().len(),
            "Workflow factory registered"
        );
        self.workflows.insert(
            workflow_type,
            RegisteredWorkflow {
                schema,
                factory: Arc::new(factory),
            },
        );
        Ok(())
    }

    /// Register a workflow whose value is just its type and parameters.
    pub fn register_plain(
        &mut self,
        workflow_type: impl Into<WorkflowType>,
        schema: ParamSchema,
        has_progress_tracker: bool,
    ) -> std::result::Result<(), RegistrationError> {
        self.register(workflow_type, schema, move |ty, params| {
            let instance = WorkflowInstance::new(ty.clone(), params.clone());
            Ok(if has_progress_tracker {
                instance.with_progress_tracker()
            } else {
                instance
            })
        })
    }

    /// Validate the descriptor and build the workflow value.
    pub fn instantiate(&self, descriptor: &WorkflowDescriptor) -> Result<WorkflowInstance> {
        let construction_error = |reason: ConstructionFailure| DispatchError::Construction {
            workflow_type: descriptor.workflow_type.clone(),
            reason,
        };

        let registered = self
            .workflows
            .get(&descriptor.workflow_type)
            .ok_or_else(|| construction_error(ConstructionFailure::UnknownType))?;

        registered
            .schema
            .validate(&descriptor.params)
            .map_err(|e| construction_error(e.into()))?;

        let mut instance = (registered.factory)(&descriptor.workflow_type, &descriptor.params)
            .map_err(|reason| construction_error(ConstructionFailure::Rejected(reason)))?;
        instance.track_progress = descriptor.track_progress;
        Ok(instance)
    }

    pub fn schema(&self, workflow_type: &WorkflowType) -> Option<&ParamSchema> {
        self.workflows.get(workflow_type).map(|w| &w.schema)
    }

    /// All registered workflow types with their schemas, ordered by type
    pub fn list(&self) -> Vec<(&WorkflowType, &ParamSchema)> {
        self.workflows
            .iter()
            .map(|(ty, w)| (ty, &w.schema))
            .collect()
    }

    pub fn contains(&self, workflow_type: &WorkflowType) -> bool {
        self.workflows.contains_key(workflow_type)
    }

    pub fn count(&self) -> usize {
        self.workflows.len()
    }
}

impl fmt::Debug for WorkflowFactoryRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkflowFactoryRegistry")
            .field("workflows", &self.workflows.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nodegate_types::{ParamError, ParamSpec, ParamType};
    use serde_json::json;

    fn transfer_schema() -> ParamSchema {
        ParamSchema::new(vec![
            ParamSpec::required("amount", ParamType::Integer),
            ParamSpec::required("to", ParamType::Party),
        ])
        .unwrap()
    }

    fn registry() -> WorkflowFactoryRegistry {
        let mut registry = WorkflowFactoryRegistry::new();
        registry
            .register_plain("com.example.Transfer", transfer_schema(), true)
            .unwrap();
        registry
            .register("com.example.Settle", ParamSchema::empty(), |_, _| {
                Ok(WorkflowInstance::new("com.example.SettleV2", Params::new()))
            })
            .unwrap();
        registry
            .register(
                "com.example.Guarded",
                ParamSchema::new(vec![ParamSpec::required("n", ParamType::Integer)]).unwrap(),
                |ty, params| {
                    if params["n"].as_i64().unwrap_or(0) < 0 {
                        Err("n must not be negative".to_string())
                    } else {
                        Ok(WorkflowInstance::new(ty.clone(), params.clone()))
                    }
                },
            )
            .unwrap();
        registry
    }

    #[test]
    fn test_instantiate_valid() {
        let descriptor = WorkflowDescriptor::new("com.example.Transfer")
            .with_param("amount", 10)
            .with_param("to", "O=Bank B, L=Paris, C=FR")
            .with_progress(true);

        let instance = registry().instantiate(&descriptor).unwrap();
        assert_eq!(instance.workflow_type.as_str(), "com.example.Transfer");
        assert_eq!(instance.params["amount"], json!(10));
        assert!(instance.has_progress_tracker);
        assert!(instance.track_progress);
    }

    #[test]
    fn test_concrete_type_may_differ() {
        let instance = registry()
            .instantiate(&WorkflowDescriptor::new("com.example.Settle"))
            .unwrap();
        assert_eq!(instance.workflow_type.as_str(), "com.example.SettleV2");
        assert!(!instance.has_progress_tracker);
    }

    #[test]
    fn test_unknown_type() {
        let err = registry()
            .instantiate(&WorkflowDescriptor::new("com.example.Nope"))
            .unwrap_err();
        assert!(matches!(
            err,
            DispatchError::Construction {
                reason: ConstructionFailure::UnknownType,
                ..
            }
        ));
    }

    #[test]
    fn test_missing_param() {
        let descriptor = WorkflowDescriptor::new("com.example.Transfer").with_param("amount", 10);
        let err = registry().instantiate(&descriptor).unwrap_err();
        match err {
            DispatchError::Construction { reason, .. } => assert_eq!(
                reason,
                ConstructionFailure::InvalidParams(ParamError::Missing("to".into()))
            ),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_factory_rejection() {
        let descriptor = WorkflowDescriptor::new("com.example.Guarded").with_param("n", -1);
        let err = registry().instantiate(&descriptor).unwrap_err();
        assert!(matches!(
            err,
            DispatchError::Construction {
                reason: ConstructionFailure::Rejected(_),
                ..
            }
        ));
    }

    #[test]
    fn test_duplicate_registration() {
        let mut registry = registry();
        let result = registry.register_plain("com.example.Transfer", ParamSchema::empty(), false);
        assert!(matches!(result, Err(RegistrationError::Duplicate(_))));
        assert_eq!(registry.count(), 3);
    }

    #[test]
    fn test_list_is_ordered() {
        let registry = registry();
        let types: Vec<_> = registry.list().into_iter().map(|(t, _)| t.as_str()).collect();
        assert_eq!(
            types,
            vec![
                "com.example.Guarded",
                "com.example.Settle",
                "com.example.Transfer"
            ]
        );
        assert!(registry
            .schema(&WorkflowType::from("com.example.Transfer"))
            .is_some());
    }
}
