//! In-memory transcript store
//!
//! Same contract as the SQLite store, backed by a mutex-guarded table pair.
//! Used for tests and for running without a database file.

use crate::db::models::{assemble_transcript, CourseRow, TermRow};
use crate::db::store::TranscriptStore;
use crate::models::{Course, CourseId, TermId, Transcript};
use crate::{Error, Result};
use async_trait::async_trait;
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Default)]
struct Tables {
    next_term_id: TermId,
    next_course_id: CourseId,
    terms: Vec<TermRow>,
    courses: Vec<CourseRow>,
}

impl Tables {
    fn insert_term(&mut self, name: &str) -> TermId {
        self.next_term_id += 1;
        self.terms.push(TermRow { id: self.next_term_id, name: name.to_string() });
        self.next_term_id
    }

    fn insert_course(&mut self, course: &Course, term_id: TermId) -> Result<CourseId> {
        if !self.terms.iter().any(|t| t.id == term_id) {
            return Err(Error::NotFound(format!("term {term_id}")));
        }
        self.next_course_id += 1;
        let mut row = CourseRow::from_course(course, term_id);
        row.id = self.next_course_id;
        self.courses.push(row);
        Ok(self.next_course_id)
    }

    fn truncate(&mut self) {
        self.terms.clear();
        self.courses.clear();
    }
}

/// [`TranscriptStore`] held entirely in memory
#[derive(Debug, Default)]
pub struct MemoryTranscriptStore {
    tables: Mutex<Tables>,
}

impl MemoryTranscriptStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with `transcript` (ids reassigned)
    pub fn with_transcript(transcript: &Transcript) -> Result<Self> {
        let store = Self::new();
        store.write_all(transcript)?;
        Ok(store)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| Error::Internal("memory store lock poisoned".to_string()))
    }

    fn write_all(&self, transcript: &Transcript) -> Result<()> {
        let mut tables = self.lock()?;
        // Build on a copy so a failure leaves the store untouched
        let mut next = Tables {
            next_term_id: tables.next_term_id,
            next_course_id: tables.next_course_id,
            ..Tables::default()
        };
        for term in &transcript.terms {
            let term_id = next.insert_term(&term.name);
            for course in &term.courses {
                next.insert_course(course, term_id)?;
            }
        }
        *tables = next;
        Ok(())
    }
}

#[async_trait]
impl TranscriptStore for MemoryTranscriptStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn insert_term(&self, name: &str) -> Result<TermId> {
        Ok(self.lock()?.insert_term(name))
    }

    async fn insert_course(&self, course: &Course, term_id: TermId) -> Result<CourseId> {
        self.lock()?.insert_course(course, term_id)
    }

    async fn update_course(&self, course: &Course) -> Result<()> {
        let mut tables = self.lock()?;
        if let Some(row) = tables.courses.iter_mut().find(|r| r.id == course.id) {
            *row = CourseRow::from_course(course, row.term_id);
        }
        Ok(())
    }

    async fn update_term(&self, term_id: TermId, name: &str) -> Result<()> {
        let mut tables = self.lock()?;
        if let Some(row) = tables.terms.iter_mut().find(|r| r.id == term_id) {
            row.name = name.to_string();
        }
        Ok(())
    }

    async fn delete_course(&self, course_id: CourseId) -> Result<()> {
        self.lock()?.courses.retain(|r| r.id != course_id);
        Ok(())
    }

    async fn delete_term(&self, term_id: TermId) -> Result<()> {
        let mut tables = self.lock()?;
        tables.terms.retain(|r| r.id != term_id);
        tables.courses.retain(|r| r.term_id != term_id);
        Ok(())
    }

    async fn truncate(&self) -> Result<()> {
        self.lock()?.truncate();
        Ok(())
    }

    async fn load_transcript(&self) -> Result<Transcript> {
        let tables = self.lock()?;
        Ok(assemble_transcript(&tables.terms, &tables.courses))
    }

    async fn write_transcript(&self, transcript: &Transcript) -> Result<()> {
        self.write_all(transcript)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Term;

    fn two_terms() -> Transcript {
        Transcript::new(vec![
            Term::new(
                "2021 Fall Term",
                vec![Course::new("CSC 101", "Intro", 3, "A"), Course::new("MA 141", "Calc", 4, "B")],
            ),
            Term::new("2022 Spring Term", vec![Course::new("CSC 216", "SD", 3, "B+")]),
        ])
    }

    #[tokio::test]
    async fn test_write_then_load_assigns_ids() {
        let store = MemoryTranscriptStore::new();
        store.write_transcript(&two_terms()).await.unwrap();

        let loaded = store.load_transcript().await.unwrap();
        assert!(loaded.same_content(&two_terms()));
        assert_eq!(loaded.terms[0].id, 1);
        assert_eq!(loaded.terms[1].id, 2);
        let ids: Vec<_> = loaded.courses().map(|c| c.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_ids_are_never_reused() {
        let store = MemoryTranscriptStore::with_transcript(&two_terms()).unwrap();
        store.write_transcript(&two_terms()).await.unwrap();
        let loaded = store.load_transcript().await.unwrap();
        assert_eq!(loaded.terms[0].id, 3);
        assert_eq!(loaded.courses().next().unwrap().id, 4);
    }

    #[tokio::test]
    async fn test_delete_term_cascades() {
        let store = MemoryTranscriptStore::with_transcript(&two_terms()).unwrap();
        store.delete_term(1).await.unwrap();
        let loaded = store.load_transcript().await.unwrap();
        assert_eq!(loaded.terms.len(), 1);
        assert_eq!(loaded.course_count(), 1);
    }

    #[tokio::test]
    async fn test_insert_course_into_missing_term_fails() {
        let store = MemoryTranscriptStore::new();
        let err = store
            .insert_course(&Course::new("CSC 101", "Intro", 3, "A"), 42)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_update_and_delete_course() {
        let store = MemoryTranscriptStore::with_transcript(&two_terms()).unwrap();
        let mut course = store.load_transcript().await.unwrap().terms[0].courses[1].clone();
        course = course.with_grade("A");
        store.update_course(&course).await.unwrap();
        store.delete_course(1).await.unwrap();

        let loaded = store.load_transcript().await.unwrap();
        assert_eq!(loaded.terms[0].courses.len(), 1);
        assert_eq!(loaded.terms[0].courses[0], course);
    }
}
