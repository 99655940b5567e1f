//! Transcript domain model
//!
//! Value aggregates for courses, terms and transcripts plus the derived
//! credit and GPA computations. Everything here is pure; persistence lives in
//! [`crate::db`].

use crate::grades::{self, GradeKind, GPA_CAP};
use serde::{Deserialize, Serialize};

/// Surrogate id of a course row (`0` = not yet persisted)
pub type CourseId = i64;

/// Surrogate id of a term row (`0` = not yet persisted)
pub type TermId = i64;

/// One enrollment record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub id: CourseId,
    pub course_code: String,
    pub course_name: String,
    /// Credit hours attempted
    pub attempted: u32,
    /// Credit hours earned
    pub earned: u32,
    /// Quality points (weight times credit hours, not per credit)
    pub points: f64,
    pub grade: String,
}

impl Course {
    /// Create a transient course, deriving points from the grade table
    ///
    /// Earned credits are taken to equal attempted credits.
    pub fn new(
        course_code: impl Into<String>,
        course_name: impl Into<String>,
        attempted: u32,
        grade: impl Into<String>,
    ) -> Self {
        let grade = grade.into();
        Self {
            id: 0,
            course_code: course_code.into(),
            course_name: course_name.into(),
            attempted,
            earned: attempted,
            points: grades::quality_points(attempted, &grade),
            grade,
        }
    }

    /// Copy with a new grade and recomputed points
    pub fn with_grade(&self, grade: impl Into<String>) -> Self {
        let grade = grade.into();
        Self {
            points: grades::quality_points(self.attempted, &grade),
            grade,
            ..self.clone()
        }
    }

    /// Copy with new credit hours and recomputed points
    pub fn with_attempted(&self, credits: u32) -> Self {
        Self {
            attempted: credits,
            earned: credits,
            points: grades::quality_points(credits, &self.grade),
            ..self.clone()
        }
    }

    /// Character-range "graded" test (first character in `'A'..='F'`)
    pub fn is_for_grade(&self) -> bool {
        grades::is_letter_range(&self.grade)
    }

    pub fn grade_kind(&self) -> GradeKind {
        GradeKind::classify(&self.grade)
    }

    pub fn is_persisted(&self) -> bool {
        self.id != 0
    }
}

/// Predicate deciding which courses count as graded
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GradedCourseFilter {
    /// First grade character in `'A'..='F'` (accepts `CR`)
    #[default]
    LetterRange,
    /// Only [`GradeKind::Standard`] grades
    Classified,
}

impl GradedCourseFilter {
    pub fn is_graded(&self, course: &Course) -> bool {
        match self {
            GradedCourseFilter::LetterRange => course.is_for_grade(),
            GradedCourseFilter::Classified => course.grade_kind().counts_toward_gpa(),
        }
    }
}

/// Upper bound applied to computed GPA values
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GpaCap {
    /// Clamp to 4.0
    #[default]
    Capped,
    /// Allow values up to 4.33 (all A+)
    Uncapped,
}

/// How GPA aggregates are computed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GpaPolicy {
    #[serde(default)]
    pub graded: GradedCourseFilter,
    #[serde(default)]
    pub cap: GpaCap,
}

/// Aggregate over a set of graded courses
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct GpaSummary {
    pub credits: u32,
    pub earned_points: f64,
    pub gpa: f64,
}

impl GpaSummary {
    fn from_totals(credits: u32, earned_points: f64, cap: GpaCap) -> Self {
        let gpa = if credits == 0 {
            0.0
        } else {
            let raw = earned_points / f64::from(credits);
            match cap {
                GpaCap::Capped => raw.min(GPA_CAP),
                GpaCap::Uncapped => raw,
            }
        };
        Self { credits, earned_points, gpa }
    }

    fn accumulate<'a>(courses: impl Iterator<Item = &'a Course>, policy: &GpaPolicy) -> Self {
        let (credits, points) = courses
            .filter(|c| policy.graded.is_graded(c))
            .fold((0u32, 0.0f64), |(credits, points), c| {
                (credits.saturating_add(c.attempted), points + c.points)
            });
        Self::from_totals(credits, points, policy.cap)
    }

    /// Letter equivalent of this summary's GPA
    pub fn letter(&self) -> &'static str {
        grades::letter_for_gpa(self.gpa)
    }
}

/// A single academic enrollment period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Term {
    pub id: TermId,
    pub name: String,
    pub courses: Vec<Course>,
}

impl Term {
    /// Create a transient term
    pub fn new(name: impl Into<String>, courses: Vec<Course>) -> Self {
        Self { id: 0, name: name.into(), courses }
    }

    pub fn graded_courses(&self) -> impl Iterator<Item = &Course> {
        self.courses.iter().filter(|c| c.is_for_grade())
    }

    pub fn summary_with(&self, policy: &GpaPolicy) -> GpaSummary {
        GpaSummary::accumulate(self.courses.iter(), policy)
    }

    pub fn summary(&self) -> GpaSummary {
        self.summary_with(&GpaPolicy::default())
    }

    pub fn total_credits(&self) -> u32 {
        self.summary().credits
    }

    pub fn total_earned_points(&self) -> f64 {
        self.summary().earned_points
    }

    pub fn gpa(&self) -> f64 {
        self.summary().gpa
    }
}

/// A student's full record, terms in order of appearance
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    pub terms: Vec<Term>,
}

impl Transcript {
    pub fn new(terms: Vec<Term>) -> Self {
        Self { terms }
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn courses(&self) -> impl Iterator<Item = &Course> {
        self.terms.iter().flat_map(|t| t.courses.iter())
    }

    pub fn course_count(&self) -> usize {
        self.terms.iter().map(|t| t.courses.len()).sum()
    }

    pub fn find_course(&self, id: CourseId) -> Option<&Course> {
        self.courses().find(|c| c.id == id)
    }

    pub fn find_term(&self, id: TermId) -> Option<&Term> {
        self.terms.iter().find(|t| t.id == id)
    }

    pub fn summary_with(&self, policy: &GpaPolicy) -> GpaSummary {
        GpaSummary::accumulate(self.courses(), policy)
    }

    pub fn summary(&self) -> GpaSummary {
        self.summary_with(&GpaPolicy::default())
    }

    pub fn total_credits(&self) -> u32 {
        self.summary().credits
    }

    pub fn total_earned_points(&self) -> f64 {
        self.summary().earned_points
    }

    pub fn gpa(&self) -> f64 {
        self.summary().gpa
    }

    /// Attempted credits over every course, graded or not
    pub fn total_attempted(&self) -> u32 {
        self.courses().fold(0u32, |total, c| total.saturating_add(c.attempted))
    }

    /// Earned credits over every course, graded or not
    pub fn total_earned(&self) -> u32 {
        self.courses().fold(0u32, |total, c| total.saturating_add(c.earned))
    }

    /// Copy with the course of matching id replaced
    pub fn with_course_replaced(&self, course: &Course) -> Self {
        Self {
            terms: self
                .terms
                .iter()
                .map(|term| Term {
                    courses: term
                        .courses
                        .iter()
                        .map(|c| if c.id == course.id { course.clone() } else { c.clone() })
                        .collect(),
                    ..term.clone()
                })
                .collect(),
        }
    }

    /// Copy without courses whose id matches
    pub fn without_course(&self, id: CourseId) -> Self {
        Self {
            terms: self
                .terms
                .iter()
                .map(|term| Term {
                    courses: term.courses.iter().filter(|c| c.id != id).cloned().collect(),
                    ..term.clone()
                })
                .collect(),
        }
    }

    /// Copy with `course` appended to the term of matching id
    ///
    /// Unknown term ids leave the transcript unchanged.
    pub fn with_course_added(&self, term_id: TermId, course: &Course) -> Self {
        let mut next = self.clone();
        for term in next.terms.iter_mut().filter(|t| t.id == term_id) {
            term.courses.push(course.clone());
        }
        next
    }

    /// Copy with the term of matching id renamed
    pub fn with_term_renamed(&self, term_id: TermId, name: &str) -> Self {
        let mut next = self.clone();
        for term in next.terms.iter_mut().filter(|t| t.id == term_id) {
            term.name = name.to_string();
        }
        next
    }

    /// Structural equality ignoring surrogate ids
    pub fn same_content(&self, other: &Transcript) -> bool {
        self.terms.len() == other.terms.len()
            && self.terms.iter().zip(&other.terms).all(|(a, b)| {
                a.name == b.name
                    && a.courses.len() == b.courses.len()
                    && a.courses.iter().zip(&b.courses).all(|(x, y)| {
                        x.course_code == y.course_code
                            && x.course_name == y.course_name
                            && x.attempted == y.attempted
                            && x.earned == y.earned
                            && x.points == y.points
                            && x.grade == y.grade
                    })
            })
    }
}
