//! Cookie Guardian Core
//!
//! The consent widget: banner and toggle button rendering, consent state
//! persisted per origin, consent callbacks, and the periodic tracker sweep.

mod banner;
mod config;
mod error;
mod guardian;
mod state;

pub use banner::{BANNER_ID, BUTTON_ID};
pub use config::{Callbacks, Config, ConsentCallback};
pub use error::CoreError;
pub use guardian::{Action, CookieGuardian, SharedDocument, SWEEP_INTERVAL};
pub use state::BannerState;

// Re-export the building blocks
pub use guardian_dom::{Document, DomError, NodeId};
pub use guardian_privacy::{
    ConsentCategory, ConsentState, SweepReport, TrackerDenylist, STORAGE_NAMESPACE,
};
pub use guardian_storage::{
    Database, DatabaseStore, MemoryStore, PreferenceStore, StorageError,
};

use std::path::Path;
use std::sync::Arc;

pub type Result<T> = std::result::Result<T, CoreError>;

/// Initialize logging
pub fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt().with_env_filter(filter).with_target(true).init();
}

/// SQLite-backed preferences for `origin`, stored at `path`.
pub fn durable_store<P: AsRef<Path>>(path: P, origin: &str) -> Result<Arc<dyn PreferenceStore>> {
    let db = Database::open(path)?;
    tracing::info!(origin, "Opened preference store");
    Ok(Arc::new(DatabaseStore::new(db, origin)))
}
