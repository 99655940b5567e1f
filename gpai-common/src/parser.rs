//! Transcript text parser
//!
//! Turns the plain text of an unofficial transcript into a [`Transcript`].
//! The input is whatever the PDF text extractor produced: line-delimited,
//! with column alignment and whitespace widths left as-is.
//!
//! Parsing is a single forward pass driven by a small state machine:
//!
//! ```text
//! BeforeStart --marker--> BetweenTerms --header--> InTerm --header--> InTerm
//! ```
//!
//! Lines before the `Beginning of Undergraduate Record` marker are ignored.
//! Every later line is checked against the term-header pattern and,
//! independently, against the course-record pattern. Terms that never
//! collect a course are dropped. The parser never fails; malformed input
//! only yields fewer terms.

use crate::models::{Course, Term, Transcript};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use tracing::debug;

/// Line that starts the undergraduate section of the record
pub const START_MARKER: &str = "Beginning of Undergraduate Record";

/// e.g. `2021 Fall Term`
static TERM_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d{4}\s+\w+\s+Term").expect("valid term header pattern"));

/// code, title, attempted, earned, grade, quality points
static COURSE_RECORD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"([A-Z]{1,4}\s+\d{3}\**)\s+([\w\s\-&]+)\s+(\d+\.\d{3})\s+(\d+\.\d{3})\s+([A-Z+\-]*)\s+(\d+\.\d{3})",
    )
    .expect("valid course record pattern")
});

static WHITESPACE_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace pattern"));

/// What the parser skipped while producing a transcript
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseReport {
    pub lines_scanned: usize,
    pub marker_found: bool,
    /// Term headers that collected no courses
    pub terms_dropped: usize,
    /// Course lines seen before any term header
    pub orphan_courses: usize,
    /// Course lines whose numeric columns could not be converted
    pub rejected_lines: usize,
}

enum ParseState {
    BeforeStart,
    BetweenTerms,
    InTerm { name: String, courses: Vec<Course> },
}

/// Stateless transcript parser
#[derive(Debug, Clone, Copy, Default)]
pub struct TranscriptParser;

impl TranscriptParser {
    pub fn new() -> Self {
        Self
    }

    pub fn parse(&self, raw_text: &str) -> Transcript {
        self.parse_with_report(raw_text).0
    }

    pub fn parse_with_report(&self, raw_text: &str) -> (Transcript, ParseReport) {
        let mut report = ParseReport::default();
        let mut terms = Vec::new();
        let mut state = ParseState::BeforeStart;

        for line in raw_text.lines() {
            report.lines_scanned += 1;

            if let ParseState::BeforeStart = state {
                if line.contains(START_MARKER) {
                    report.marker_found = true;
                    state = ParseState::BetweenTerms;
                }
                continue;
            }

            if let Some(header) = TERM_HEADER.find(line) {
                if let ParseState::InTerm { name, courses } = std::mem::replace(
                    &mut state,
                    ParseState::InTerm { name: header.as_str().to_string(), courses: Vec::new() },
                ) {
                    seal(&mut terms, &mut report, name, courses);
                }
            }

            let Some(caps) = COURSE_RECORD.captures(line) else {
                continue;
            };
            match &mut state {
                ParseState::InTerm { courses, .. } => match course_from_captures(&caps) {
                    Some(course) => courses.push(course),
                    None => {
                        debug!(line, "Rejected course line with unreadable numeric columns");
                        report.rejected_lines += 1;
                    }
                },
                _ => report.orphan_courses += 1,
            }
        }

        if let ParseState::InTerm { name, courses } = state {
            seal(&mut terms, &mut report, name, courses);
        }

        let transcript = Transcript::new(terms);
        debug!(
            lines = report.lines_scanned,
            marker_found = report.marker_found,
            terms = transcript.terms.len(),
            courses = transcript.course_count(),
            terms_dropped = report.terms_dropped,
            orphan_courses = report.orphan_courses,
            "Parsed transcript text"
        );
        (transcript, report)
    }
}

/// Parse transcript text with the default parser
pub fn parse(raw_text: &str) -> Transcript {
    TranscriptParser::new().parse(raw_text)
}

fn seal(terms: &mut Vec<Term>, report: &mut ParseReport, name: String, courses: Vec<Course>) {
    if courses.is_empty() {
        report.terms_dropped += 1;
    } else {
        terms.push(Term::new(name, courses));
    }
}

fn course_from_captures(caps: &Captures<'_>) -> Option<Course> {
    let attempted: f64 = caps[3].parse().ok()?;
    let earned: f64 = caps[4].parse().ok()?;
    let points: f64 = caps[6].parse().ok()?;

    Some(Course {
        id: 0,
        course_code: collapse_whitespace(&caps[1]),
        course_name: collapse_whitespace(&caps[2]),
        // Truncation toward zero, as the credit columns are whole hours
        attempted: attempted as u32,
        earned: earned as u32,
        points,
        grade: caps[5].trim().to_string(),
    })
}

fn collapse_whitespace(s: &str) -> String {
    WHITESPACE_RUN.replace_all(s.trim(), " ").into_owned()
}
