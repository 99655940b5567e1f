//! Transcript repository
//!
//! Single observable cache of the user's [`Transcript`], backed by a
//! [`TranscriptStore`]. Every mutation is applied to the cache first
//! (optimistic update) and published immediately; persistence and a full
//! reload then run on a spawned task, and the reload result replaces
//! whatever the cache holds at that point.
//!
//! Mutations are call-and-forget. Each returns the [`JoinHandle`] of its
//! persist-and-reload tail, which callers are free to drop. Tails of
//! different mutations are not serialized: in
//! [`ReconcileMode::LastReloadWins`] the reload that resolves last is what
//! observers end up seeing, even if it read older data. With
//! [`ReconcileMode::Stamped`] every reload is stamped when its read starts
//! and a result older than the last published one is discarded.
//!
//! Failures never escape: they are logged, reported as
//! [`TranscriptEvent::PersistenceFailed`], and the cache stays as it was
//! until the next successful reload.

use gpai_common::config::{ReconcileMode, SyncSettings};
use gpai_common::db::TranscriptStore;
use gpai_common::events::{EventBus, SnapshotSource, TranscriptEvent};
use gpai_common::models::{Course, TermId, Transcript};
use gpai_common::Result;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

struct Inner {
    store: Arc<dyn TranscriptStore>,
    transcript: watch::Sender<Option<Transcript>>,
    loading: watch::Sender<bool>,
    events: EventBus,
    mode: ReconcileMode,
    /// Stamp handed to the next reload
    next_stamp: AtomicU64,
    /// Stamp of the reload currently in the cache
    published_stamp: Mutex<u64>,
}

impl Inner {
    fn emit_snapshot(&self, source: SnapshotSource, transcript: &Transcript) {
        self.events.emit_lossy(TranscriptEvent::snapshot_published(
            source,
            transcript.terms.len(),
            transcript.course_count(),
        ));
    }

    fn report_failure(&self, operation: &str, err: &gpai_common::Error) {
        error!(operation, backend = self.store.backend(), error = %err, "Transcript persistence failed");
        self.events
            .emit_lossy(TranscriptEvent::persistence_failed(operation, err.to_string()));
    }

    /// Re-read the whole transcript and publish it
    ///
    /// Returns false when the read failed and nothing was published.
    async fn reload(&self, reason: &str) -> bool {
        let stamp = self.next_stamp.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(reason, stamp, "Reloading transcript");

        match self.store.load_transcript().await {
            Ok(transcript) => {
                self.publish_reload(stamp, transcript);
                true
            }
            Err(e) => {
                self.report_failure("load_transcript", &e);
                false
            }
        }
    }

    fn publish_reload(&self, stamp: u64, transcript: Transcript) {
        let mut latest = self
            .published_stamp
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if self.mode == ReconcileMode::Stamped && stamp < *latest {
            debug!(stamp, latest = *latest, "Discarding stale reload");
            self.events
                .emit_lossy(TranscriptEvent::reload_discarded(stamp, *latest));
            return;
        }

        *latest = stamp.max(*latest);
        self.emit_snapshot(SnapshotSource::Reloaded, &transcript);
        self.transcript.send_replace(Some(transcript));
    }

    fn set_loading(&self, loading: bool) {
        self.loading.send_replace(loading);
        self.events.emit_lossy(TranscriptEvent::loading_changed(loading));
    }
}

/// Observable, self-reconciling transcript cache
///
/// Cheap to clone; clones share the same cache.
#[derive(Clone)]
pub struct TranscriptRepository {
    inner: Arc<Inner>,
}

impl TranscriptRepository {
    /// Create the repository and start the initial load
    ///
    /// Must be called from within a tokio runtime. The loading flag is
    /// `true` until the initial load finishes, successfully or not.
    pub fn new(store: Arc<dyn TranscriptStore>, settings: &SyncSettings) -> Self {
        let (transcript, _) = watch::channel(None);
        let (loading, _) = watch::channel(true);

        info!(
            backend = store.backend(),
            mode = ?settings.reconcile,
            "Starting transcript repository"
        );

        let repository = Self {
            inner: Arc::new(Inner {
                store,
                transcript,
                loading,
                events: EventBus::new(settings.event_capacity),
                mode: settings.reconcile,
                next_stamp: AtomicU64::new(0),
                published_stamp: Mutex::new(0),
            }),
        };

        let inner = Arc::clone(&repository.inner);
        tokio::spawn(async move {
            inner.set_loading(true);
            if !inner.reload("initial load").await {
                warn!("Initial transcript load failed; starting with no transcript");
            }
            inner.set_loading(false);
        });

        repository
    }

    /// Latest snapshot (`None` until the first successful load)
    pub fn snapshot(&self) -> Option<Transcript> {
        self.inner.transcript.borrow().clone()
    }

    /// Receiver yielding every published snapshot
    pub fn subscribe(&self) -> watch::Receiver<Option<Transcript>> {
        self.inner.transcript.subscribe()
    }

    /// Receiver for the initial-load flag
    pub fn loading(&self) -> watch::Receiver<bool> {
        self.inner.loading.subscribe()
    }

    pub fn is_loading(&self) -> bool {
        *self.inner.loading.borrow()
    }

    pub async fn wait_until_loaded(&self) {
        let mut rx = self.inner.loading.subscribe();
        // The sender lives as long as `self`, so this only ends on a false flag
        let _ = rx.wait_for(|loading| !*loading).await;
    }

    /// Subscribe to repository events
    pub fn events(&self) -> broadcast::Receiver<TranscriptEvent> {
        self.inner.events.subscribe()
    }

    pub fn reconcile_mode(&self) -> ReconcileMode {
        self.inner.mode
    }

    /// Re-read storage and publish the result
    pub fn reload(&self) -> JoinHandle<()> {
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            inner.reload("requested").await;
        })
    }

    /// Replace the course with matching id, then persist and reload
    pub fn update_course(&self, course: Course) -> JoinHandle<()> {
        self.apply_optimistic(|t| t.with_course_replaced(&course));
        self.spawn_tail("update_course", move |store| async move {
            store.update_course(&course).await
        })
    }

    /// Drop the course with matching id, then delete it and reload
    pub fn remove_course(&self, course: &Course) -> JoinHandle<()> {
        let course_id = course.id;
        self.apply_optimistic(|t| t.without_course(course_id));
        self.spawn_tail("delete_course", move |store| async move {
            store.delete_course(course_id).await
        })
    }

    /// Append `course` to the term with id `term_id`, then insert and reload
    pub fn add_course(&self, term_id: TermId, course: Course) -> JoinHandle<()> {
        self.apply_optimistic(|t| t.with_course_added(term_id, &course));
        self.spawn_tail("insert_course", move |store| async move {
            store.insert_course(&course, term_id).await.map(|_| ())
        })
    }

    /// Rename the term with id `term_id`, then persist and reload
    pub fn rename_term(&self, term_id: TermId, name: impl Into<String>) -> JoinHandle<()> {
        let name = name.into();
        self.apply_optimistic(|t| t.with_term_renamed(term_id, &name));
        self.spawn_tail("update_term", move |store| async move {
            store.update_term(term_id, &name).await
        })
    }

    /// Publish `transcript` as-is, then rewrite storage with it and reload
    pub fn update_transcript(&self, transcript: Transcript) -> JoinHandle<()> {
        self.inner.emit_snapshot(SnapshotSource::Replaced, &transcript);
        self.inner.transcript.send_replace(Some(transcript.clone()));
        self.spawn_tail("write_transcript", move |store| async move {
            store.write_transcript(&transcript).await
        })
    }

    /// Apply `edit` to the cached transcript, if there is one
    fn apply_optimistic(&self, edit: impl FnOnce(&Transcript) -> Transcript) {
        let mut published = None;
        self.inner.transcript.send_if_modified(|current| match current {
            Some(transcript) => {
                let next = edit(transcript);
                published = Some((next.terms.len(), next.course_count()));
                *transcript = next;
                true
            }
            None => false,
        });

        if let Some((terms, courses)) = published {
            self.inner.events.emit_lossy(TranscriptEvent::snapshot_published(
                SnapshotSource::Optimistic,
                terms,
                courses,
            ));
        }
    }

    fn spawn_tail<F, Fut>(&self, operation: &'static str, write: F) -> JoinHandle<()>
    where
        F: FnOnce(Arc<dyn TranscriptStore>) -> Fut + Send + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            if let Err(e) = write(Arc::clone(&inner.store)).await {
                inner.report_failure(operation, &e);
            }
            inner.reload(operation).await;
        })
    }
}
