//! Cookie Guardian Storage Layer
//!
//! Persistent key-value preferences, scoped per origin, in the manner of a
//! browser's `localStorage`. Values are JSON scalars stored as text.
//! Storage failures never reach callers: a failing durable store degrades to
//! session-only memory.

mod database;
mod error;
mod migrations;
mod store;

pub use database::Database;
pub use error::StorageError;
pub use store::{DatabaseStore, MemoryStore, PreferenceStore};

pub type Result<T> = std::result::Result<T, StorageError>;
