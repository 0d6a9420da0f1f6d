//! Visit event model for asynchronous visit counting.

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// A successful resolution waiting to be counted.
///
/// Passed from the resolver to the background worker via a bounded channel,
/// decoupling the redirect response from counter writes.
#[derive(Debug, Clone)]
pub struct VisitEvent {
    pub code: String,
    pub visited_at: DateTime<Utc>,
}

impl VisitEvent {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            visited_at: Utc::now(),
        }
    }
}

/// Fire-and-forget handle for recording visits.
///
/// [`VisitSender::record`] never waits: when the queue is full the visit is
/// dropped, logged and counted in `tinylink_visits_dropped_total`.
#[derive(Debug, Clone)]
pub struct VisitSender {
    tx: mpsc::Sender<VisitEvent>,
}

impl VisitSender {
    pub fn new(tx: mpsc::Sender<VisitEvent>) -> Self {
        Self { tx }
    }

    /// Creates a sender together with the receiving end for the worker.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<VisitEvent>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self::new(tx), rx)
    }

    /// Queues a visit for `code`. Returns true if the event was accepted.
    pub fn record(&self, code: &str) -> bool {
        match self.tx.try_send(VisitEvent::new(code)) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(ev)) => {
                warn!(code = %ev.code, "Visit queue full, dropping visit");
                metrics::counter!("tinylink_visits_dropped_total", "reason" => "queue_full")
                    .increment(1);
                false
            }
            Err(mpsc::error::TrySendError::Closed(ev)) => {
                debug!(code = %ev.code, "Visit queue closed, dropping visit");
                metrics::counter!("tinylink_visits_dropped_total", "reason" => "closed")
                    .increment(1);
                false
            }
        }
    }

    /// Returns true once the worker has stopped receiving.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// Free slots left in the queue.
    pub fn capacity(&self) -> usize {
        self.tx.capacity()
    }

    /// Total queue size.
    pub fn max_capacity(&self) -> usize {
        self.tx.max_capacity()
    }
}
