//! Command-line surface of the `gpai-tr` binary

use crate::repository::TranscriptRepository;
use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use gpai_common::events::TranscriptEvent;
use gpai_common::grades::GRADE_OPTIONS;
use gpai_common::models::{Course, CourseId, GpaPolicy, TermId, Transcript};
use gpai_common::TranscriptParser;
use std::io::Write;
use std::path::PathBuf;
use tokio::sync::broadcast::{self, error::TryRecvError};
use tokio::task::JoinHandle;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "gpai-tr")]
#[command(about = "Transcript store and GPA calculator for GPAi")]
#[command(version)]
pub struct Cli {
    /// Folder holding the transcript database
    #[arg(short, long, global = true)]
    pub root_folder: Option<String>,

    /// Config file (defaults to the platform config location)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Replace the stored transcript with one parsed from extracted PDF text
    Import {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Print terms, courses and GPA
    Show {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Add a course to an existing term
    AddCourse {
        #[arg(long)]
        term_id: TermId,
        #[arg(long)]
        code: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        credits: u32,
        #[arg(long)]
        grade: String,
    },

    /// Change credits and/or grade of a course
    EditCourse {
        #[arg(long)]
        id: CourseId,
        #[arg(long)]
        credits: Option<u32>,
        #[arg(long)]
        grade: Option<String>,
    },

    /// Delete a course
    RemoveCourse {
        #[arg(long)]
        id: CourseId,
    },
}

/// Execute `command` against a loaded repository, writing output to `out`
pub async fn run<W: Write>(
    command: &Command,
    repository: &TranscriptRepository,
    policy: &GpaPolicy,
    out: &mut W,
) -> Result<()> {
    let current = repository.snapshot().unwrap_or_default();
    let mut events = repository.events();

    match command {
        Command::Import { file } => {
            let text = std::fs::read_to_string(file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let (transcript, report) = TranscriptParser::new().parse_with_report(&text);
            if !report.marker_found {
                warn!(file = %file.display(), "No start-of-record marker found");
            }
            if report.orphan_courses > 0 || report.rejected_lines > 0 {
                warn!(
                    orphan_courses = report.orphan_courses,
                    rejected_lines = report.rejected_lines,
                    "Some course lines were skipped"
                );
            }
            info!(
                terms = transcript.terms.len(),
                courses = transcript.course_count(),
                "Importing transcript"
            );

            let tail = repository.update_transcript(transcript);
            reconcile(tail, &mut events).await?;

            let stored = repository.snapshot().unwrap_or_default();
            let summary = stored.summary_with(policy);
            writeln!(
                out,
                "Imported {} terms, {} courses; GPA {:.3} ({})",
                stored.terms.len(),
                stored.course_count(),
                summary.gpa,
                summary.letter()
            )?;
        }

        Command::Show { json } => {
            if *json {
                let summary = current.summary_with(policy);
                let value = serde_json::json!({
                    "transcript": current,
                    "summary": summary,
                    "letter": summary.letter(),
                });
                writeln!(out, "{}", serde_json::to_string_pretty(&value)?)?;
            } else {
                write!(out, "{}", render_transcript(&current, policy))?;
            }
        }

        Command::AddCourse { term_id, code, name, credits, grade } => {
            if current.find_term(*term_id).is_none() {
                bail!("No term with id {term_id}");
            }
            check_grade(grade)?;
            let tail = repository.add_course(*term_id, Course::new(code, name, *credits, grade));
            reconcile(tail, &mut events).await?;
            writeln!(out, "Added {code} to term {term_id}")?;
        }

        Command::EditCourse { id, credits, grade } => {
            let mut course = current
                .find_course(*id)
                .cloned()
                .ok_or_else(|| anyhow!("No course with id {id}"))?;
            if let Some(credits) = credits {
                course = course.with_attempted(*credits);
            }
            if let Some(grade) = grade {
                check_grade(grade)?;
                course = course.with_grade(grade);
            }
            let tail = repository.update_course(course.clone());
            reconcile(tail, &mut events).await?;
            writeln!(out, "Updated {} ({} credits, {})", course.course_code, course.attempted, course.grade)?;
        }

        Command::RemoveCourse { id } => {
            let course = current
                .find_course(*id)
                .ok_or_else(|| anyhow!("No course with id {id}"))?;
            let tail = repository.remove_course(course);
            reconcile(tail, &mut events).await?;
            writeln!(out, "Removed {}", course.course_code)?;
        }
    }

    Ok(())
}

fn check_grade(grade: &str) -> Result<()> {
    if GRADE_OPTIONS.contains(&grade) {
        Ok(())
    } else {
        bail!("Unknown grade {grade:?}; expected one of {}", GRADE_OPTIONS.join(", "))
    }
}

/// Wait for a mutation's tail and surface a swallowed persistence failure
async fn reconcile(
    tail: JoinHandle<()>,
    events: &mut broadcast::Receiver<TranscriptEvent>,
) -> Result<()> {
    tail.await.context("Reconciliation task failed")?;
    loop {
        match events.try_recv() {
            Ok(TranscriptEvent::PersistenceFailed { operation, message, .. }) => {
                bail!("{operation} failed: {message}");
            }
            Ok(_) => {}
            Err(TryRecvError::Lagged(skipped)) => {
                warn!(skipped, "Event receiver lagged while reconciling");
            }
            Err(TryRecvError::Empty | TryRecvError::Closed) => return Ok(()),
        }
    }
}

/// Plain-text table of every term followed by the overall GPA
pub fn render_transcript(transcript: &Transcript, policy: &GpaPolicy) -> String {
    let mut text = String::new();
    if transcript.is_empty() {
        text.push_str("No transcript stored\n");
        return text;
    }

    for term in &transcript.terms {
        let summary = term.summary_with(policy);
        text.push_str(&format!("{} (term {})\n", term.name, term.id));
        for course in &term.courses {
            text.push_str(&format!(
                "  {:>4}  {:<10} {:<36} {:>2}/{:<2} {:<3} {:>7.3}\n",
                course.id,
                course.course_code,
                course.course_name,
                course.earned,
                course.attempted,
                course.grade,
                course.points
            ));
        }
        text.push_str(&format!(
            "  {} credits, GPA {:.3} ({})\n\n",
            summary.credits,
            summary.gpa,
            summary.letter()
        ));
    }

    let summary = transcript.summary_with(policy);
    text.push_str(&format!(
        "Overall: {} credits, {:.3} points, GPA {:.3} ({})\n",
        summary.credits,
        summary.earned_points,
        summary.gpa,
        summary.letter()
    ));
    text
}
