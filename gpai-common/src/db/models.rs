//! Database row models

use crate::models::{Course, CourseId, Term, TermId, Transcript};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermRow {
    pub id: TermId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseRow {
    pub id: CourseId,
    pub term_id: TermId,
    pub course_code: String,
    pub course_name: String,
    pub attempted: i64,
    pub earned: i64,
    pub points: f64,
    pub grade: String,
}

impl CourseRow {
    /// Row for `course` under `term_id`, keeping the course's id
    pub fn from_course(course: &Course, term_id: TermId) -> Self {
        Self {
            id: course.id,
            term_id,
            course_code: course.course_code.clone(),
            course_name: course.course_name.clone(),
            attempted: i64::from(course.attempted),
            earned: i64::from(course.earned),
            points: course.points,
            grade: course.grade.clone(),
        }
    }

    /// Negative credit counts (only possible from foreign writers) read as zero
    pub fn to_course(&self) -> Course {
        Course {
            id: self.id,
            course_code: self.course_code.clone(),
            course_name: self.course_name.clone(),
            attempted: u32::try_from(self.attempted).unwrap_or(0),
            earned: u32::try_from(self.earned).unwrap_or(0),
            points: self.points,
            grade: self.grade.clone(),
        }
    }
}

/// Group course rows under their terms
///
/// Terms keep the order given; courses keep their relative order within a
/// term. Courses whose term is absent are dropped.
pub fn assemble_transcript(terms: &[TermRow], courses: &[CourseRow]) -> Transcript {
    Transcript::new(
        terms
            .iter()
            .map(|term| Term {
                id: term.id,
                name: term.name.clone(),
                courses: courses
                    .iter()
                    .filter(|c| c.term_id == term.id)
                    .map(CourseRow::to_course)
                    .collect(),
            })
            .collect(),
    )
}
