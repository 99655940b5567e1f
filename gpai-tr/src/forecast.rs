//! What-if GPA drafts
//!
//! A [`Forecast`] is a detached copy of a transcript that can be edited
//! freely and projected under a [`GpaPolicy`]. Nothing is stored until
//! [`Forecast::commit`] hands the draft to the repository as a whole-transcript
//! replacement.

use crate::repository::TranscriptRepository;
use gpai_common::grades::GRADE_OPTIONS;
use gpai_common::models::{Course, GpaPolicy, GpaSummary, Term, Transcript};
use gpai_common::{Error, Result};
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct Forecast {
    base: Transcript,
    draft: Transcript,
    policy: GpaPolicy,
}

impl Forecast {
    pub fn new(base: Transcript) -> Self {
        Self::with_policy(base, GpaPolicy::default())
    }

    pub fn with_policy(base: Transcript, policy: GpaPolicy) -> Self {
        Self { draft: base.clone(), base, policy }
    }

    pub fn base(&self) -> &Transcript {
        &self.base
    }

    pub fn draft(&self) -> &Transcript {
        &self.draft
    }

    /// True once the draft differs from the transcript it started from
    pub fn is_dirty(&self) -> bool {
        self.draft != self.base
    }

    /// Throw away every edit
    pub fn discard(&mut self) {
        self.draft = self.base.clone();
    }

    /// Append an empty term and return its index
    pub fn add_term(&mut self, name: impl Into<String>) -> usize {
        self.draft.terms.push(Term::new(name, Vec::new()));
        self.draft.terms.len() - 1
    }

    pub fn add_course(&mut self, term_index: usize, course: Course) -> Result<()> {
        self.term_mut(term_index)?.courses.push(course);
        Ok(())
    }

    /// Change credits and grade of a drafted course, recomputing its points
    ///
    /// `grade` must be one of [`GRADE_OPTIONS`].
    pub fn edit_course(
        &mut self,
        term_index: usize,
        course_index: usize,
        credits: u32,
        grade: &str,
    ) -> Result<()> {
        if !GRADE_OPTIONS.contains(&grade) {
            return Err(Error::InvalidInput(format!("unknown grade {grade:?}")));
        }
        let course = self.course_mut(term_index, course_index)?;
        *course = course.with_attempted(credits).with_grade(grade);
        Ok(())
    }

    pub fn remove_course(&mut self, term_index: usize, course_index: usize) -> Result<Course> {
        let term = self.term_mut(term_index)?;
        if course_index >= term.courses.len() {
            return Err(Error::NotFound(format!(
                "course {course_index} in term {term_index}"
            )));
        }
        Ok(term.courses.remove(course_index))
    }

    pub fn projected(&self) -> GpaSummary {
        self.draft.summary_with(&self.policy)
    }

    pub fn projected_gpa(&self) -> f64 {
        self.projected().gpa
    }

    pub fn projected_letter(&self) -> &'static str {
        self.projected().letter()
    }

    /// Persist the draft through `repository` and rebase on the result
    ///
    /// Waits for reconciliation, so the new base and draft carry the ids
    /// storage assigned. If the reloaded transcript does not match the draft
    /// (the write failed, or another edit landed in between) the draft is
    /// kept, the base becomes the stored transcript, and `Error::Internal` is
    /// returned.
    pub async fn commit(&mut self, repository: &TranscriptRepository) -> Result<()> {
        debug!(
            terms = self.draft.terms.len(),
            courses = self.draft.course_count(),
            "Committing forecast"
        );
        repository
            .update_transcript(self.draft.clone())
            .await
            .map_err(|e| Error::Internal(format!("forecast commit task failed: {e}")))?;

        let stored = repository.snapshot().unwrap_or_default();
        if !stored.same_content(&self.draft) {
            warn!("Stored transcript does not match the committed forecast");
            self.base = stored;
            return Err(Error::Internal("forecast was not stored".to_string()));
        }

        self.base = stored.clone();
        self.draft = stored;
        Ok(())
    }

    fn term_mut(&mut self, term_index: usize) -> Result<&mut Term> {
        self.draft
            .terms
            .get_mut(term_index)
            .ok_or_else(|| Error::NotFound(format!("term {term_index}")))
    }

    fn course_mut(&mut self, term_index: usize, course_index: usize) -> Result<&mut Course> {
        self.term_mut(term_index)?
            .courses
            .get_mut(course_index)
            .ok_or_else(|| Error::NotFound(format!("course {course_index} in term {term_index}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gpai_common::models::GpaCap;

    fn base() -> Transcript {
        Transcript::new(vec![Term::new(
            "2021 Fall Term",
            vec![
                Course::new("CSC 101", "Introduction to Programming", 3, "A"),
                Course::new("MATH 225", "Calculus II", 3, "C"),
            ],
        )])
    }

    #[test]
    fn test_fresh_forecast_projects_base() {
        let forecast = Forecast::new(base());
        assert!(!forecast.is_dirty());
        assert!((forecast.projected_gpa() - 3.0).abs() < 1e-9);
        assert_eq!(forecast.projected_letter(), "B");
    }

    #[test]
    fn test_edit_course_recomputes_points() {
        let mut forecast = Forecast::new(base());
        forecast.edit_course(0, 1, 4, "B").unwrap();

        let edited = &forecast.draft().terms[0].courses[1];
        assert_eq!(edited.attempted, 4);
        assert_eq!(edited.earned, 4);
        assert!((edited.points - 12.0).abs() < 1e-9);
        // (12 + 12) / 7
        assert!((forecast.projected_gpa() - 24.0 / 7.0).abs() < 1e-9);
        assert!(forecast.is_dirty());
        // Base is untouched
        assert_eq!(forecast.base(), &base());
    }

    #[test]
    fn test_add_term_and_course() {
        let mut forecast = Forecast::new(base());
        let next = forecast.add_term("2022 Spring Term");
        assert_eq!(next, 1);
        forecast
            .add_course(next, Course::new("PHYS 201", "Physics I", 4, "A"))
            .unwrap();

        let summary = forecast.projected();
        assert_eq!(summary.credits, 10);
        assert!((summary.earned_points - 34.0).abs() < 1e-9);
    }

    #[test]
    fn test_remove_and_discard() {
        let mut forecast = Forecast::new(base());
        let removed = forecast.remove_course(0, 1).unwrap();
        assert_eq!(removed.course_code, "MATH 225");
        assert!((forecast.projected_gpa() - 4.0).abs() < 1e-9);

        forecast.discard();
        assert!(!forecast.is_dirty());
    }

    #[test]
    fn test_out_of_range_indices() {
        let mut forecast = Forecast::new(base());
        assert!(matches!(
            forecast.add_course(3, Course::new("X 100", "X", 1, "A")),
            Err(Error::NotFound(_))
        ));
        assert!(matches!(forecast.edit_course(0, 9, 3, "A"), Err(Error::NotFound(_))));
        assert!(matches!(forecast.remove_course(0, 2), Err(Error::NotFound(_))));
        assert!(!forecast.is_dirty());
    }

    #[test]
    fn test_edit_rejects_unknown_grade() {
        let mut forecast = Forecast::new(base());
        assert!(matches!(forecast.edit_course(0, 0, 3, "CR"), Err(Error::InvalidInput(_))));
        assert!(!forecast.is_dirty());
    }

    #[test]
    fn test_uncapped_policy() {
        let transcript = Transcript::new(vec![Term::new(
            "2021 Fall Term",
            vec![Course::new("CSC 101", "Introduction to Programming", 3, "A+")],
        )]);
        let capped = Forecast::new(transcript.clone());
        let uncapped = Forecast::with_policy(
            transcript,
            GpaPolicy { cap: GpaCap::Uncapped, ..GpaPolicy::default() },
        );
        assert!((capped.projected_gpa() - 4.0).abs() < 1e-9);
        assert!((uncapped.projected_gpa() - 4.33).abs() < 1e-9);
    }
}
