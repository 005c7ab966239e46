//! Workflow handle - the tracking record of one workflow invocation

use crate::progress::{ProgressFeed, ProgressSubscription};
use crate::result::ResultSlot;
use chrono::{DateTime, Utc};
use nodegate_types::{RunId, WorkflowOutcome, WorkflowType};
use std::fmt;
use std::sync::Arc;

struct HandleInner {
    run_id: RunId,
    workflow_type: WorkflowType,
    started_at: DateTime<Utc>,
    result: ResultSlot,
    progress: ProgressFeed,
}

/// Handle to an in-flight or completed workflow
///
/// Cloning is cheap; all clones share the same result slot and progress feed.
#[derive(Clone)]
pub struct WorkflowHandle {
    inner: Arc<HandleInner>,
}

impl WorkflowHandle {
    pub(crate) fn new(
        run_id: RunId,
        workflow_type: WorkflowType,
        result: ResultSlot,
        progress: ProgressFeed,
    ) -> Self {
        Self {
            inner: Arc::new(HandleInner {
                run_id,
                workflow_type,
                started_at: Utc::now(),
                result,
                progress,
            }),
        }
    }

    pub fn run_id(&self) -> RunId {
        self.inner.run_id
    }

    /// Concrete type of the workflow that was started
    pub fn workflow_type(&self) -> &WorkflowType {
        &self.inner.workflow_type
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.inner.started_at
    }

    pub fn result(&self) -> &ResultSlot {
        &self.inner.result
    }

    /// Wait for the workflow's terminal value
    pub async fn outcome(&self) -> WorkflowOutcome {
        self.inner.result.wait().await
    }

    /// Subscribe to progress updates emitted from now on
    pub fn progress(&self) -> ProgressSubscription {
        self.inner.progress.subscribe()
    }

    pub fn progress_feed(&self) -> &ProgressFeed {
        &self.inner.progress
    }

    pub fn is_finished(&self) -> bool {
        self.inner.result.is_resolved()
    }
}

impl fmt::Debug for WorkflowHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkflowHandle")
            .field("run_id", &self.inner.run_id)
            .field("workflow_type", &self.inner.workflow_type)
            .field("started_at", &self.inner.started_at)
            .field("finished", &self.is_finished())
            .finish()
    }
}
