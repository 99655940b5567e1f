//! Test helpers for gpai-tr integration tests
//!
//! - ScriptedStore: in-memory store whose reloads can be parked and whose
//!   calls can be made to fail
//! - Fixtures: sample transcripts and transcript text

#![allow(dead_code)]

pub mod fixtures;
pub mod scripted_store;

pub use fixtures::{fall_term, FIXTURE_TEXT};
pub use scripted_store::ScriptedStore;
