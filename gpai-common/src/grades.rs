//! Letter grade table and grade classification
//!
//! Quality-point weights per credit hour, the inverse GPA-to-letter mapping,
//! and an explicit classification of grade tokens into kinds.

use serde::{Deserialize, Serialize};

/// Selectable letter grades, best first
pub const GRADE_OPTIONS: [&str; 13] = [
    "A+", "A", "A-", "B+", "B", "B-", "C+", "C", "C-", "D+", "D", "D-", "F",
];

/// Highest displayed GPA when the cap is applied
pub const GPA_CAP: f64 = 4.0;

/// Quality-point weight per credit hour for a letter grade
///
/// Returns `None` for tokens outside the table (transfer credit, withdrawals,
/// pass/fail and so on).
pub fn grade_weight(grade: &str) -> Option<f64> {
    let weight = match grade {
        "A+" => 4.33,
        "A" => 4.0,
        "A-" => 3.667,
        "B+" => 3.333,
        "B" => 3.0,
        "B-" => 2.667,
        "C+" => 2.333,
        "C" => 2.0,
        "C-" => 1.667,
        "D+" => 1.333,
        "D" => 1.0,
        "D-" => 0.667,
        "F" => 0.0,
        _ => return None,
    };
    Some(weight)
}

/// Quality points for `credits` hours at `grade`
///
/// Unknown grades weigh nothing.
pub fn quality_points(credits: u32, grade: &str) -> f64 {
    f64::from(credits) * grade_weight(grade).unwrap_or(0.0)
}

/// Letter equivalent of a GPA value
pub fn letter_for_gpa(gpa: f64) -> &'static str {
    match gpa {
        g if g >= 4.33 => "A+",
        g if g >= 4.0 => "A",
        g if g >= 3.667 => "A-",
        g if g >= 3.33 => "B+",
        g if g >= 3.0 => "B",
        g if g >= 2.667 => "B-",
        g if g >= 2.333 => "C+",
        g if g >= 2.0 => "C",
        g if g >= 1.667 => "C-",
        g if g >= 1.333 => "D+",
        g if g >= 1.0 => "D",
        g if g >= 0.667 => "D-",
        _ => "F",
    }
}

/// Character-range test used for "graded" courses
///
/// True iff the first character of the token is in `'A'..='F'`. Note that
/// this accepts non-GPA tokens such as `CR` (transfer credit) and rejects
/// nothing that starts with those letters.
pub fn is_letter_range(grade: &str) -> bool {
    grade.chars().next().is_some_and(|c| ('A'..='F').contains(&c))
}

/// Modifier attached to a standard letter grade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GradeModifier {
    Plus,
    None,
    Minus,
}

/// Explicit classification of a grade token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GradeKind {
    /// A through F with an optional modifier
    Standard { letter: char, modifier: GradeModifier },
    Withdrawal,
    PassFail,
    Audit,
    Transfer,
    Incomplete,
    Unknown,
}

impl GradeKind {
    /// Classify a (trimmed) grade token
    pub fn classify(grade: &str) -> Self {
        match grade {
            "W" | "WD" | "WF" | "WP" => return GradeKind::Withdrawal,
            "P" | "S" | "U" | "NP" | "NC" => return GradeKind::PassFail,
            "AU" | "AUD" => return GradeKind::Audit,
            "CR" | "TR" | "T" => return GradeKind::Transfer,
            "I" | "IN" | "IP" => return GradeKind::Incomplete,
            _ => {}
        }

        let mut chars = grade.chars();
        let letter = match chars.next() {
            Some(c @ ('A' | 'B' | 'C' | 'D' | 'F')) => c,
            _ => return GradeKind::Unknown,
        };
        let modifier = match (chars.next(), chars.next()) {
            (None, _) => GradeModifier::None,
            (Some('+'), None) if letter != 'F' => GradeModifier::Plus,
            (Some('-'), None) if letter != 'F' => GradeModifier::Minus,
            _ => return GradeKind::Unknown,
        };

        GradeKind::Standard { letter, modifier }
    }

    /// Whether a course with this grade contributes to GPA
    pub fn counts_toward_gpa(&self) -> bool {
        matches!(self, GradeKind::Standard { .. })
    }
}
