//! Persistence gateway contract
//!
//! The synchronizer only ever talks to storage through [`TranscriptStore`].
//! Rows mirror the domain model with an added foreign key from each course
//! to its owning term; deleting a term deletes its courses.

use crate::models::{Course, CourseId, TermId, Transcript};
use crate::Result;
use async_trait::async_trait;

/// CRUD over term and course rows keyed by surrogate ids
#[async_trait]
pub trait TranscriptStore: Send + Sync {
    /// Implementation name for logging (e.g. "sqlite", "memory")
    fn backend(&self) -> &'static str;

    /// Insert a term row, returning its new id
    async fn insert_term(&self, name: &str) -> Result<TermId>;

    /// Insert a course under `term_id`, returning its new id
    ///
    /// The course's own `id` is ignored.
    async fn insert_course(&self, course: &Course, term_id: TermId) -> Result<CourseId>;

    /// Overwrite every column of the course row with id `course.id`
    ///
    /// Updating a missing row is not an error.
    async fn update_course(&self, course: &Course) -> Result<()>;

    /// Rename a term
    async fn update_term(&self, term_id: TermId, name: &str) -> Result<()>;

    async fn delete_course(&self, course_id: CourseId) -> Result<()>;

    /// Delete a term and, by cascade, its courses
    async fn delete_term(&self, term_id: TermId) -> Result<()>;

    /// Remove every term and course
    async fn truncate(&self) -> Result<()>;

    /// All terms with their courses, both in id order
    async fn load_transcript(&self) -> Result<Transcript>;

    /// Replace all stored data with `transcript`
    ///
    /// Truncates, then inserts every term followed by its courses, in
    /// order. Implementations must make this all-or-nothing.
    async fn write_transcript(&self, transcript: &Transcript) -> Result<()>;
}
