//! # GPAi Common Library
//!
//! Shared code for the GPAi crates:
//! - Grade table and grade classification
//! - Transcript domain model and GPA aggregation
//! - Transcript text parser
//! - Persistence gateway (SQLite and in-memory)
//! - Event types (TranscriptEvent) and EventBus
//! - Configuration loading

pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod grades;
pub mod models;
pub mod parser;

pub use error::{Error, Result};
pub use models::{Course, GpaPolicy, GpaSummary, Term, Transcript};
pub use parser::TranscriptParser;
