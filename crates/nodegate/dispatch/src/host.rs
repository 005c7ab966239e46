//! Host platform gateway - the seam between the dispatcher and whatever
//! actually runs workflows
//!
//! An in-process adapter talks to the node directly; a remote adapter talks
//! to it over RPC. The dispatcher only sees this trait.

use crate::error::HostError;
use crate::factory::WorkflowInstance;
use async_trait::async_trait;
use futures::future::BoxFuture;
use futures::stream::BoxStream;
use nodegate_types::{RunId, WorkflowOutcome};
use std::fmt;

/// Native progress source: step labels in emission order. An `Err` item
/// means the source broke and no further steps will follow.
pub type NativeProgress = BoxStream<'static, Result<String, HostError>>;

/// Native completion signal, driven to completion by the host platform
pub type NativeCompletion = BoxFuture<'static, WorkflowOutcome>;

/// A workflow the host platform has accepted
pub struct NativeWorkflow {
    pub run_id: RunId,
    pub completion: NativeCompletion,
    /// `None` when the workflow has no progress tracker or tracking was not requested
    pub progress: Option<NativeProgress>,
}

impl NativeWorkflow {
    pub fn new(run_id: RunId, completion: NativeCompletion) -> Self {
        Self {
            run_id,
            completion,
            progress: None,
        }
    }

    pub fn with_progress(mut self, progress: NativeProgress) -> Self {
        self.progress = Some(progress);
        self
    }
}

impl fmt::Debug for NativeWorkflow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeWorkflow")
            .field("run_id", &self.run_id)
            .field("has_progress", &self.progress.is_some())
            .finish()
    }
}

/// Capability to start workflows on the underlying platform
#[async_trait]
pub trait HostPlatform: Send + Sync {
    /// Start a tracked workflow.
    ///
    /// Returns as soon as the platform has accepted the workflow and assigned
    /// it a run id; never waits for the workflow to finish.
    async fn start(&self, instance: WorkflowInstance) -> Result<NativeWorkflow, HostError>;

    /// Re-attach to a workflow started elsewhere, for deployments that must
    /// recover tracking across process boundaries.
    async fn lookup_native(&self, _run_id: RunId) -> Result<Option<NativeWorkflow>, HostError> {
        Ok(None)
    }

    /// Get the gateway name
    fn name(&self) -> &str;
}
