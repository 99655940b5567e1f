//! Event types for the transcript synchronizer
//!
//! Provides the [`TranscriptEvent`] enum and the broadcast [`EventBus`] that
//! carries it to observers.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Where a published snapshot came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotSource {
    /// Local edit applied before persistence
    Optimistic,
    /// Whole transcript replaced by the caller
    Replaced,
    /// Authoritative state re-read from storage
    Reloaded,
}

/// Transcript synchronizer events
///
/// Events are broadcast via [`EventBus`] and serialize with a `type` tag.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TranscriptEvent {
    /// Initial load started or finished
    LoadingChanged {
        loading: bool,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A new snapshot became the observable value
    SnapshotPublished {
        source: SnapshotSource,
        /// Number of terms in the snapshot
        terms: usize,
        /// Number of courses in the snapshot
        courses: usize,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A write or reload failed and was swallowed
    PersistenceFailed {
        /// Gateway operation name (e.g. "delete_course")
        operation: String,
        message: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A reload finished after a newer one had already been published
    ReloadDiscarded {
        /// Stamp of the discarded reload
        stamp: u64,
        /// Stamp of the snapshot that stays
        latest: u64,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl TranscriptEvent {
    pub fn loading_changed(loading: bool) -> Self {
        TranscriptEvent::LoadingChanged { loading, timestamp: chrono::Utc::now() }
    }

    pub fn snapshot_published(source: SnapshotSource, terms: usize, courses: usize) -> Self {
        TranscriptEvent::SnapshotPublished {
            source,
            terms,
            courses,
            timestamp: chrono::Utc::now(),
        }
    }

    pub fn persistence_failed(operation: &str, message: impl Into<String>) -> Self {
        TranscriptEvent::PersistenceFailed {
            operation: operation.to_string(),
            message: message.into(),
            timestamp: chrono::Utc::now(),
        }
    }

    pub fn reload_discarded(stamp: u64, latest: u64) -> Self {
        TranscriptEvent::ReloadDiscarded { stamp, latest, timestamp: chrono::Utc::now() }
    }
}

/// Broadcast channel for [`TranscriptEvent`]s
pub struct EventBus {
    tx: broadcast::Sender<TranscriptEvent>,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// Slow subscribers lose the oldest events once `capacity` is exceeded.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<TranscriptEvent> {
        self.tx.subscribe()
    }

    /// Emit an event
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: TranscriptEvent,
    ) -> Result<usize, broadcast::error::SendError<TranscriptEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: TranscriptEvent) {
        let _ = self.tx.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}
