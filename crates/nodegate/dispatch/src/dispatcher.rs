//! Workflow Dispatcher - starts workflows and tracks them until they finish
//!
//! The dispatcher owns the registry of active handles. A handle is added
//! when the host platform accepts a workflow and removed right after its
//! result resolves, so the registry only ever holds workflows that are
//! still running (or resolving) in this process.

use crate::config::DispatcherConfig;
use crate::error::{DispatchError, Result};
use crate::factory::WorkflowFactoryRegistry;
use crate::handle::WorkflowHandle;
use crate::host::{HostPlatform, NativeCompletion, NativeProgress, NativeWorkflow};
use crate::progress::ProgressFeed;
use crate::result::ResultSlot;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures::{FutureExt, StreamExt};
use nodegate_types::{ProgressEvent, RunId, WorkflowDescriptor, WorkflowExecutionError, WorkflowType};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

type ActiveHandles = DashMap<RunId, WorkflowHandle>;

/// Starts host-platform workflows and keeps track of the running ones
pub struct WorkflowDispatcher {
    host: Arc<dyn HostPlatform>,
    factories: Arc<WorkflowFactoryRegistry>,
    config: DispatcherConfig,
    active: Arc<ActiveHandles>,
}

impl WorkflowDispatcher {
    /// Create a dispatcher with default configuration
    pub fn new(host: Arc<dyn HostPlatform>, factories: WorkflowFactoryRegistry) -> Self {
        Self {
            host,
            factories: Arc::new(factories),
            config: DispatcherConfig::default(),
            active: Arc::new(DashMap::new()),
        }
    }

    /// Create a dispatcher with explicit configuration
    pub fn with_config(
        host: Arc<dyn HostPlatform>,
        factories: WorkflowFactoryRegistry,
        config: DispatcherConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            ..Self::new(host, factories)
        })
    }

    /// Start a workflow and begin tracking it.
    ///
    /// Construction problems fail before the host platform is contacted and
    /// a host refusal fails before anything is registered. Once this returns,
    /// the workflow's outcome is only ever reported through the handle's
    /// result slot.
    #[instrument(skip(self, descriptor), fields(workflow_type = %descriptor.workflow_type))]
    pub async fn initiate(&self, descriptor: &WorkflowDescriptor) -> Result<WorkflowHandle> {
        // 1. Build the workflow value client-side
        let instance = self.factories.instantiate(descriptor)?;
        let workflow_type = instance.workflow_type.clone();
        let has_progress_tracker = instance.has_progress_tracker;

        // 2. Submit to the host platform
        let native = self
            .host
            .start(instance)
            .await
            .map_err(|source| DispatchError::HostRejection {
                host: self.host.name().to_string(),
                workflow_type: workflow_type.clone(),
                source,
            })?;

        info!(run_id = %native.run_id, workflow_type = %workflow_type, "Workflow started");

        if descriptor.track_progress && !has_progress_tracker {
            info!(
                workflow_type = %workflow_type,
                "Workflow does not use a progress tracker, no progress updates will be emitted"
            );
        }

        // 3-6. Wire result and progress, register, schedule cleanup
        let run_id = native.run_id;
        let handle = self.track_native(native, workflow_type, descriptor.track_progress);
        if let Some(previous) = self.active.insert(run_id, handle.clone()) {
            error!(
                run_id = %run_id,
                previous_type = %previous.workflow_type(),
                "Host platform reused a run id; previous handle is no longer tracked"
            );
        }
        self.schedule_cleanup(&handle);

        Ok(handle)
    }

    /// Find a workflow that is still tracked by this dispatcher.
    pub fn lookup(&self, run_id: &RunId) -> Option<WorkflowHandle> {
        self.active.get(run_id).map(|h| h.clone())
    }

    /// Like [`lookup`](Self::lookup), but absence is an error.
    pub fn track(&self, run_id: &RunId) -> Result<WorkflowHandle> {
        self.lookup(run_id)
            .ok_or(DispatchError::UnknownRunIdentifier(*run_id))
    }

    /// Re-attach to a workflow this dispatcher does not track, through the
    /// host platform's native lookup.
    ///
    /// Returns the existing handle if the workflow is already tracked.
    #[instrument(skip(self), fields(run_id = %run_id, workflow_type = %workflow_type))]
    pub async fn recover(
        &self,
        run_id: RunId,
        workflow_type: WorkflowType,
    ) -> Result<Option<WorkflowHandle>> {
        if let Some(existing) = self.lookup(&run_id) {
            return Ok(Some(existing));
        }

        let native = self
            .host
            .lookup_native(run_id)
            .await
            .map_err(|source| DispatchError::HostRejection {
                host: self.host.name().to_string(),
                workflow_type: workflow_type.clone(),
                source,
            })?;

        let Some(native) = native else {
            debug!("Host platform does not know the run id");
            return Ok(None);
        };

        let handle = match self.active.entry(run_id) {
            // tracked concurrently while we were asking the host
            Entry::Occupied(existing) => return Ok(Some(existing.get().clone())),
            Entry::Vacant(slot) => {
                let track_progress = native.progress.is_some();
                let handle = self.track_native(native, workflow_type, track_progress);
                slot.insert(handle.clone());
                handle
            }
        };
        self.schedule_cleanup(&handle);

        info!("Workflow tracking recovered");
        Ok(Some(handle))
    }

    /// Number of workflows currently tracked
    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Run ids of the workflows currently tracked
    pub fn active_run_ids(&self) -> Vec<RunId> {
        self.active.iter().map(|e| *e.key()).collect()
    }

    pub fn factories(&self) -> &WorkflowFactoryRegistry {
        &self.factories
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    pub fn host_name(&self) -> &str {
        self.host.name()
    }

    // --- Internal helpers ---

    /// Build a handle whose result and progress are driven by the native workflow.
    fn track_native(
        &self,
        native: NativeWorkflow,
        workflow_type: WorkflowType,
        track_progress: bool,
    ) -> WorkflowHandle {
        let NativeWorkflow {
            run_id,
            completion,
            progress,
        } = native;

        let result = ResultSlot::new();
        spawn_completion_driver(run_id, completion, result.clone());

        let feed = match progress {
            Some(source) if track_progress => {
                let feed = ProgressFeed::open(run_id, self.config.progress_channel_capacity);
                spawn_progress_pump(
                    run_id,
                    source,
                    feed.clone(),
                    result.clone(),
                    self.config.log_progress_updates,
                );
                feed
            }
            _ => {
                if !track_progress {
                    debug!(run_id = %run_id, "Progress tracking was not requested");
                }
                ProgressFeed::closed(run_id)
            }
        };

        WorkflowHandle::new(run_id, workflow_type, result, feed)
    }

    /// Remove the handle from the registry once its result has resolved.
    fn schedule_cleanup(&self, handle: &WorkflowHandle) {
        let run_id = handle.run_id();
        // weak: the registry owns the handle, which owns this observer
        let active = Arc::downgrade(&self.active);
        handle.result().on_resolved(move |_| {
            if let Some(active) = active.upgrade() {
                if active.remove(&run_id).is_some() {
                    debug!(run_id = %run_id, "Workflow handle removed from registry");
                }
            }
        });
    }
}

impl std::fmt::Debug for WorkflowDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowDispatcher")
            .field("host", &self.host.name())
            .field("factories", &self.factories)
            .field("active", &self.active.len())
            .finish()
    }
}

/// Resolve `result` from the native completion signal, on a runtime task.
fn spawn_completion_driver(run_id: RunId, completion: NativeCompletion, result: ResultSlot) {
    tokio::spawn(async move {
        let outcome = match AssertUnwindSafe(completion).catch_unwind().await {
            Ok(outcome) => outcome,
            Err(_) => Err(WorkflowExecutionError::host_failure(
                "completion signal panicked",
            )),
        };

        match &outcome {
            Ok(value) => debug!(run_id = %run_id, result = %value, "Workflow returned"),
            Err(e) => debug!(run_id = %run_id, error = %e, "Workflow threw error"),
        }

        if result.resolve(outcome).is_err() {
            error!(run_id = %run_id, "Workflow result resolved more than once");
        }
    });
}

/// Forward native progress steps into `feed` until the source ends, breaks,
/// or the workflow resolves. Always closes the feed on exit.
fn spawn_progress_pump(
    run_id: RunId,
    mut source: NativeProgress,
    feed: ProgressFeed,
    result: ResultSlot,
    log_updates: bool,
) {
    tokio::spawn(async move {
        let finished = result.wait();
        tokio::pin!(finished);

        loop {
            tokio::select! {
                // drain steps already emitted before noticing completion
                biased;

                step = source.next() => match step {
                    Some(Ok(step)) => {
                        if log_updates {
                            debug!(run_id = %run_id, step = %step, "Progress update");
                        }
                        feed.publish(ProgressEvent::new(run_id, step));
                    }
                    Some(Err(e)) => {
                        warn!(run_id = %run_id, error = %e, "Progress feed failed, no further updates will be emitted");
                        break;
                    }
                    None => break,
                },
                _ = &mut finished => break,
            }
        }

        feed.close();
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryHostPlatform;
    use nodegate_types::{ParamSchema, ParamSpec, ParamType};
    use serde_json::json;

    fn factories() -> WorkflowFactoryRegistry {
        let mut registry = WorkflowFactoryRegistry::new();
        registry
            .register_plain(
                "com.example.Issue",
                ParamSchema::new(vec![ParamSpec::required("amount", ParamType::Integer)])
                    .unwrap(),
                true,
            )
            .unwrap();
        registry
    }

    fn dispatcher(host: &Arc<MemoryHostPlatform>) -> WorkflowDispatcher {
        WorkflowDispatcher::new(host.clone(), factories())
    }

    fn issue(amount: i64) -> WorkflowDescriptor {
        WorkflowDescriptor::new("com.example.Issue").with_param("amount", amount)
    }

    #[tokio::test]
    async fn test_initiate_registers_handle() {
        let host = Arc::new(MemoryHostPlatform::new());
        let dispatcher = dispatcher(&host);

        let before = chrono::Utc::now();
        let handle = dispatcher.initiate(&issue(5)).await.unwrap();

        let found = dispatcher.lookup(&handle.run_id()).unwrap();
        assert_eq!(found.run_id(), handle.run_id());
        assert_eq!(found.workflow_type().as_str(), "com.example.Issue");
        assert!(found.started_at() >= before);
        assert!(found.started_at() <= chrono::Utc::now());
        assert_eq!(dispatcher.active_count(), 1);
        assert_eq!(host.started().len(), 1);
    }

    #[tokio::test]
    async fn test_construction_error_skips_host() {
        let host = Arc::new(MemoryHostPlatform::new());
        let dispatcher = dispatcher(&host);

        let err = dispatcher
            .initiate(&WorkflowDescriptor::new("com.example.Issue"))
            .await
            .unwrap_err();
        assert!(err.is_construction());
        assert!(host.started().is_empty());
        assert_eq!(dispatcher.active_count(), 0);
    }

    #[tokio::test]
    async fn test_host_rejection_registers_nothing() {
        let host = Arc::new(MemoryHostPlatform::new());
        host.reject_starts("node is draining");
        let dispatcher = dispatcher(&host);

        let err = dispatcher.initiate(&issue(1)).await.unwrap_err();
        assert!(err.is_host_rejection());
        assert_eq!(dispatcher.active_count(), 0);
    }

    #[tokio::test]
    async fn test_result_resolution_removes_entry() {
        let host = Arc::new(MemoryHostPlatform::new());
        let dispatcher = dispatcher(&host);

        let handle = dispatcher.initiate(&issue(5)).await.unwrap();
        let run_id = handle.run_id();
        host.complete(run_id, Ok(json!({"issued": 5})));

        assert_eq!(handle.outcome().await, Ok(json!({"issued": 5})));
        // cleanup runs right after resolution, on the resolving task
        assert!(dispatcher.lookup(&run_id).is_none());
        assert!(matches!(
            dispatcher.track(&run_id),
            Err(DispatchError::UnknownRunIdentifier(id)) if id == run_id
        ));
    }

    #[tokio::test]
    async fn test_execution_failure_goes_through_result() {
        let host = Arc::new(MemoryHostPlatform::new());
        let dispatcher = dispatcher(&host);

        let handle = dispatcher.initiate(&issue(5)).await.unwrap();
        host.complete(
            handle.run_id(),
            Err(WorkflowExecutionError::failed("insufficient funds")),
        );

        assert_eq!(
            handle.outcome().await,
            Err(WorkflowExecutionError::failed("insufficient funds"))
        );
    }

    #[tokio::test]
    async fn test_dropped_completion_is_abandoned() {
        let host = Arc::new(MemoryHostPlatform::new());
        let dispatcher = dispatcher(&host);

        let handle = dispatcher.initiate(&issue(5)).await.unwrap();
        host.abandon(handle.run_id());

        let outcome = handle.outcome().await;
        assert_eq!(
            outcome.unwrap_err().kind,
            nodegate_types::ExecutionErrorKind::Abandoned
        );
    }

    #[tokio::test]
    async fn test_recover_unknown_returns_none() {
        let host = Arc::new(MemoryHostPlatform::new());
        let dispatcher = dispatcher(&host);

        let recovered = dispatcher
            .recover(RunId::generate(), WorkflowType::from("com.example.Issue"))
            .await
            .unwrap();
        assert!(recovered.is_none());
    }

    #[tokio::test]
    async fn test_with_config_validates() {
        let host = Arc::new(MemoryHostPlatform::new());
        let config = DispatcherConfig {
            progress_channel_capacity: 0,
            ..Default::default()
        };
        let result = WorkflowDispatcher::with_config(host, factories(), config);
        assert!(matches!(result, Err(DispatchError::Config(_))));
    }
}
