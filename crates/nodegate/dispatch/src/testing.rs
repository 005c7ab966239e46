//! Scripted in-memory host platform for tests
//!
//! Workflows started on a [`MemoryHostPlatform`] never finish on their own:
//! the test plays the host and completes them, emits progress steps, or
//! breaks their progress source explicitly.

use crate::error::HostError;
use crate::factory::WorkflowInstance;
use crate::host::{HostPlatform, NativeWorkflow};
use async_trait::async_trait;
use futures::channel::{mpsc, oneshot};
use futures::{FutureExt, StreamExt};
use nodegate_types::{RunId, WorkflowExecutionError, WorkflowOutcome};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

struct ScriptedRun {
    completion: Option<oneshot::Sender<WorkflowOutcome>>,
    progress: Option<mpsc::UnboundedSender<Result<String, HostError>>>,
}

#[derive(Default)]
struct HostState {
    runs: HashMap<RunId, ScriptedRun>,
    started: Vec<(RunId, WorkflowInstance)>,
    detached: HashMap<RunId, NativeWorkflow>,
    rejection: Option<String>,
}

/// Host platform whose workflows are driven by the test
#[derive(Default)]
pub struct MemoryHostPlatform {
    state: Mutex<HostState>,
}

impl MemoryHostPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse every start from now on with `reason`.
    pub fn reject_starts(&self, reason: impl Into<String>) {
        self.lock().rejection = Some(reason.into());
    }

    pub fn accept_starts(&self) {
        self.lock().rejection = None;
    }

    /// Instances started so far, in start order
    pub fn started(&self) -> Vec<WorkflowInstance> {
        self.lock()
            .started
            .iter()
            .map(|(_, instance)| instance.clone())
            .collect()
    }

    pub fn run_ids(&self) -> Vec<RunId> {
        self.lock().started.iter().map(|(id, _)| *id).collect()
    }

    /// Finish a workflow. Returns `false` if it is unknown or already finished.
    pub fn complete(&self, run_id: RunId, outcome: WorkflowOutcome) -> bool {
        let sender = self
            .lock()
            .runs
            .get_mut(&run_id)
            .and_then(|run| run.completion.take());
        match sender {
            Some(sender) => sender.send(outcome).is_ok(),
            None => false,
        }
    }

    /// Drop the completion signal without a value.
    pub fn abandon(&self, run_id: RunId) -> bool {
        self.lock()
            .runs
            .get_mut(&run_id)
            .and_then(|run| run.completion.take())
            .is_some()
    }

    /// Emit a progress step. Returns `false` if the workflow has no open progress source.
    pub fn emit(&self, run_id: RunId, step: impl Into<String>) -> bool {
        self.send_progress(run_id, Ok(step.into()))
    }

    /// Break the progress source with an error item.
    pub fn fail_progress(&self, run_id: RunId, message: impl Into<String>) -> bool {
        self.send_progress(run_id, Err(HostError::Progress(message.into())))
    }

    /// End the progress source normally.
    pub fn close_progress(&self, run_id: RunId) -> bool {
        self.lock()
            .runs
            .get_mut(&run_id)
            .and_then(|run| run.progress.take())
            .is_some()
    }

    /// Create a running workflow that was started "elsewhere": only
    /// reachable through [`HostPlatform::lookup_native`], once.
    pub fn start_detached(&self, with_progress: bool) -> RunId {
        let run_id = RunId::generate();
        let native = self.create_run(run_id, with_progress);
        self.lock().detached.insert(run_id, native);
        run_id
    }

    fn create_run(&self, run_id: RunId, with_progress: bool) -> NativeWorkflow {
        let (completion_tx, completion_rx) = oneshot::channel();
        let completion = completion_rx
            .map(|received| {
                received.unwrap_or_else(|_| {
                    Err(WorkflowExecutionError::abandoned(
                        "host dropped the completion signal",
                    ))
                })
            })
            .boxed();

        let mut run = ScriptedRun {
            completion: Some(completion_tx),
            progress: None,
        };
        let mut native = NativeWorkflow::new(run_id, completion);
        if with_progress {
            let (progress_tx, progress_rx) = mpsc::unbounded();
            run.progress = Some(progress_tx);
            native = native.with_progress(progress_rx.boxed());
        }

        self.lock().runs.insert(run_id, run);
        native
    }

    fn send_progress(&self, run_id: RunId, item: Result<String, HostError>) -> bool {
        self.lock()
            .runs
            .get(&run_id)
            .and_then(|run| run.progress.as_ref())
            .map(|tx| tx.unbounded_send(item).is_ok())
            .unwrap_or(false)
    }

    fn lock(&self) -> MutexGuard<'_, HostState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl HostPlatform for MemoryHostPlatform {
    async fn start(&self, instance: WorkflowInstance) -> Result<NativeWorkflow, HostError> {
        if let Some(reason) = self.lock().rejection.clone() {
            return Err(HostError::Rejected(reason));
        }

        let run_id = RunId::generate();
        let native = self.create_run(
            run_id,
            instance.has_progress_tracker && instance.track_progress,
        );
        self.lock().started.push((run_id, instance));
        Ok(native)
    }

    async fn lookup_native(&self, run_id: RunId) -> Result<Option<NativeWorkflow>, HostError> {
        Ok(self.lock().detached.remove(&run_id))
    }

    fn name(&self) -> &str {
        "memory"
    }
}
