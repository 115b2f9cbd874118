//! Common utilities for the OMERO.insight client
//!
//! This crate provides the pieces shared by every front end: error handling,
//! tracing setup, and the injected preference store that replaces the
//! platform's per-user key-value preferences.

pub mod error;
pub mod logging;
pub mod prefs;
pub mod test_utils;

pub use error::{Error, Result};
pub use logging::{setup_file_logging, setup_logging};
pub use prefs::{FilePreferences, MemoryPreferences, PreferenceStore, Preferences};
