//! Persistence gateway and its implementations

#[cfg(feature = "sqlx")]
pub mod init;
pub mod memory;
pub mod models;
#[cfg(feature = "sqlx")]
pub mod sqlite;
pub mod store;

#[cfg(feature = "sqlx")]
pub use init::*;
pub use memory::MemoryTranscriptStore;
pub use models::*;
#[cfg(feature = "sqlx")]
pub use sqlite::SqliteTranscriptStore;
pub use store::TranscriptStore;
