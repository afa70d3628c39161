//! Cookie Guardian Privacy
//!
//! Consent categories:
//! - Required: always granted, never stored
//! - Preferences, Statistics, Marketing, Unclassified: opt-in, stored per origin
//!
//! Sweeping is best effort. Removing a `<script>` only stops future loads of
//! that tag; code that already ran keeps its timers, globals and requests.

mod category;
mod sweeper;
mod tracking;

pub use category::{ConsentCategory, ConsentState, STORAGE_NAMESPACE};
pub use sweeper::{SweepReport, Sweeper};
pub use tracking::{TrackerDenylist, TRACKER_DOMAINS};
