use gpai_common::models::{Course, Term, Transcript};

/// Extracted text of a two-term unofficial transcript
pub const FIXTURE_TEXT: &str = "\
Unofficial Transcript
Student: Wolf, Mister
Beginning of Undergraduate Record
2021 Fall Term
CSC 101   Introduction to Programming     3.000   3.000   A-    9.000
MATH 225  Calculus II                     4.000   4.000   B+   12.000

2022 Spring Term
CSC 216   Software Development            3.000   3.000   A     9.000
ENG 102   Composition and Rhetoric        3.000   3.000   B     9.000
";

/// One term with CSC 101 (id 1) and MATH 225 (id 2) once stored
pub fn fall_term() -> Transcript {
    Transcript::new(vec![Term::new(
        "2021 Fall Term",
        vec![
            Course::new("CSC 101", "Introduction to Programming", 3, "A-"),
            Course::new("MATH 225", "Calculus II", 4, "B+"),
        ],
    )])
}
