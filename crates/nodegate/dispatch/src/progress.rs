//! Live multicast progress feed
//!
//! Every subscription is an independent cursor starting at "now": nothing
//! emitted before a subscriber joined is replayed to it. Closing the feed
//! ends every subscription once it has drained what it already buffered.

use futures::stream::{self, BoxStream, StreamExt};
use nodegate_types::{ProgressEvent, RunId};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::broadcast;
use tracing::{debug, warn};

struct FeedInner {
    run_id: RunId,
    /// `None` once the feed is closed
    sender: Mutex<Option<broadcast::Sender<ProgressEvent>>>,
}

/// Producer side of a workflow's progress updates, shared with its handle
#[derive(Clone)]
pub struct ProgressFeed {
    inner: Arc<FeedInner>,
}

impl ProgressFeed {
    /// Open a feed buffering up to `capacity` undelivered events per subscriber.
    pub fn open(run_id: RunId, capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            inner: Arc::new(FeedInner {
                run_id,
                sender: Mutex::new(Some(sender)),
            }),
        }
    }

    /// A feed that is already terminated and will never emit.
    pub fn closed(run_id: RunId) -> Self {
        Self {
            inner: Arc::new(FeedInner {
                run_id,
                sender: Mutex::new(None),
            }),
        }
    }

    pub fn run_id(&self) -> RunId {
        self.inner.run_id
    }

    /// Start a new subscription at the current position of the feed.
    pub fn subscribe(&self) -> ProgressSubscription {
        ProgressSubscription {
            run_id: self.inner.run_id,
            receiver: self.lock().as_ref().map(broadcast::Sender::subscribe),
        }
    }

    /// Deliver `event` to the current subscribers. Returns how many received it.
    pub fn publish(&self, event: ProgressEvent) -> usize {
        match self.lock().as_ref() {
            Some(sender) => sender.send(event).unwrap_or(0),
            None => 0,
        }
    }

    /// Terminate the feed. Returns `false` if it was already closed.
    pub fn close(&self) -> bool {
        let closed = self.lock().take().is_some();
        if closed {
            debug!(run_id = %self.inner.run_id, "Progress feed completed");
        }
        closed
    }

    pub fn is_closed(&self) -> bool {
        self.lock().is_none()
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock()
            .as_ref()
            .map(broadcast::Sender::receiver_count)
            .unwrap_or(0)
    }

    fn lock(&self) -> MutexGuard<'_, Option<broadcast::Sender<ProgressEvent>>> {
        self.inner
            .sender
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl std::fmt::Debug for ProgressFeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressFeed")
            .field("run_id", &self.inner.run_id)
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// One subscriber's view of a progress feed
#[derive(Debug)]
pub struct ProgressSubscription {
    run_id: RunId,
    receiver: Option<broadcast::Receiver<ProgressEvent>>,
}

impl ProgressSubscription {
    /// Next event, or `None` once the feed has terminated.
    ///
    /// A subscriber that falls more than the feed capacity behind skips the
    /// overwritten events.
    pub async fn next(&mut self) -> Option<ProgressEvent> {
        loop {
            let receiver = self.receiver.as_mut()?;
            match receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(
                        run_id = %self.run_id,
                        skipped,
                        "Progress subscriber lagged behind feed"
                    );
                }
                Err(broadcast::error::RecvError::Closed) => {
                    self.receiver = None;
                    return None;
                }
            }
        }
    }

    /// `true` once the subscription can never yield another event.
    pub fn is_terminated(&self) -> bool {
        self.receiver.is_none()
    }

    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    /// Stop receiving. Other subscribers and the workflow are unaffected.
    pub fn dispose(self) {
        debug!(run_id = %self.run_id, "Progress subscription disposed");
    }

    pub fn into_stream(self) -> BoxStream<'static, ProgressEvent> {
        stream::unfold(self, |mut subscription| async move {
            subscription
                .next()
                .await
                .map(|event| (event, subscription))
        })
        .boxed()
    }
}
