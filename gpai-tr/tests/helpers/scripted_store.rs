//! Store wrapper for driving reconciliation order from tests
//!
//! Loads are numbered in call order starting at 0 (the repository's initial
//! load). A gated load reads the inner store immediately, then parks until
//! its gate is released, so the data it returns is as of the read.

use async_trait::async_trait;
use gpai_common::db::{MemoryTranscriptStore, TranscriptStore};
use gpai_common::models::{Course, CourseId, TermId, Transcript};
use gpai_common::{Error, Result};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::sync::{oneshot, watch};

pub struct ScriptedStore {
    inner: MemoryTranscriptStore,
    loads: AtomicUsize,
    gates: Mutex<HashMap<usize, oneshot::Receiver<()>>>,
    parked: watch::Sender<usize>,
    fail_writes: AtomicBool,
    fail_loads: AtomicBool,
}

impl ScriptedStore {
    pub fn new(transcript: &Transcript) -> Self {
        Self {
            inner: MemoryTranscriptStore::with_transcript(transcript).unwrap(),
            loads: AtomicUsize::new(0),
            gates: Mutex::new(HashMap::new()),
            parked: watch::channel(0).0,
            fail_writes: AtomicBool::new(false),
            fail_loads: AtomicBool::new(false),
        }
    }

    /// Park load number `index`; send on the returned channel to release it.
    /// Dropping the sender releases it too.
    pub fn gate_load(&self, index: usize) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().unwrap().insert(index, rx);
        tx
    }

    /// Wait until `count` gated loads have parked
    pub async fn wait_parked(&self, count: usize) {
        let mut rx = self.parked.subscribe();
        rx.wait_for(|n| *n >= count).await.unwrap();
    }

    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn fail_loads(&self, fail: bool) {
        self.fail_loads.store(fail, Ordering::SeqCst);
    }

    /// Current stored transcript, bypassing gates and failures
    pub async fn stored(&self) -> Transcript {
        self.inner.load_transcript().await.unwrap()
    }

    fn check_write(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            Err(Error::Internal("injected write failure".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl TranscriptStore for ScriptedStore {
    fn backend(&self) -> &'static str {
        "scripted"
    }

    async fn insert_term(&self, name: &str) -> Result<TermId> {
        self.check_write()?;
        self.inner.insert_term(name).await
    }

    async fn insert_course(&self, course: &Course, term_id: TermId) -> Result<CourseId> {
        self.check_write()?;
        self.inner.insert_course(course, term_id).await
    }

    async fn update_course(&self, course: &Course) -> Result<()> {
        self.check_write()?;
        self.inner.update_course(course).await
    }

    async fn update_term(&self, term_id: TermId, name: &str) -> Result<()> {
        self.check_write()?;
        self.inner.update_term(term_id, name).await
    }

    async fn delete_course(&self, course_id: CourseId) -> Result<()> {
        self.check_write()?;
        self.inner.delete_course(course_id).await
    }

    async fn delete_term(&self, term_id: TermId) -> Result<()> {
        self.check_write()?;
        self.inner.delete_term(term_id).await
    }

    async fn truncate(&self) -> Result<()> {
        self.check_write()?;
        self.inner.truncate().await
    }

    async fn load_transcript(&self) -> Result<Transcript> {
        let index = self.loads.fetch_add(1, Ordering::SeqCst);
        let result = if self.fail_loads.load(Ordering::SeqCst) {
            Err(Error::Internal("injected load failure".to_string()))
        } else {
            self.inner.load_transcript().await
        };

        let gate = self.gates.lock().unwrap().remove(&index);
        if let Some(gate) = gate {
            self.parked.send_modify(|n| *n += 1);
            let _ = gate.await;
        }
        result
    }

    async fn write_transcript(&self, transcript: &Transcript) -> Result<()> {
        self.check_write()?;
        self.inner.write_transcript(transcript).await
    }
}
