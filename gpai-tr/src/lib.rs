//! gpai-tr: transcript synchronizer and command-line tool
//!
//! [`TranscriptRepository`] keeps the observable transcript cache in step
//! with a [`gpai_common::db::TranscriptStore`]; [`Forecast`] drafts what-if
//! edits on top of it.

pub mod cli;
pub mod forecast;
pub mod repository;

pub use forecast::Forecast;
pub use repository::TranscriptRepository;
