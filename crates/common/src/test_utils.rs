//! Test utilities for the OMERO.insight client
//!
//! Provides preference store doubles shared by the unit and integration
//! tests of every crate.
//!
//! # Example
//!
//! ```
//! use common::test_utils::memory_preferences;
//! use common::PreferenceStore;
//!
//! let store = memory_preferences(&[("server_editor", "omeroServer", "a,b,c")]);
//! assert_eq!(store.get("server_editor", "omeroServer").as_deref(), Some("a,b,c"));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::prefs::{MemoryPreferences, PreferenceStore, Preferences};
use crate::{Error, Result};

/// Create an in-memory store seeded with `(node, key, value)` entries
pub fn memory_preferences(entries: &[(&str, &str, &str)]) -> Arc<MemoryPreferences> {
    let store = MemoryPreferences::new();
    for (node, key, value) in entries {
        store
            .put(node, key, value)
            .expect("memory preferences never fail");
    }
    Arc::new(store)
}

/// Scoped handle over a fresh in-memory store
pub fn scoped_memory_preferences(node: &str) -> (Arc<MemoryPreferences>, Preferences) {
    let store = memory_preferences(&[]);
    let prefs = Preferences::new(store.clone(), node);
    (store, prefs)
}

/// Store whose writes always fail
///
/// Reads are served from the seed values; every write attempt is counted so
/// tests can check that callers tried, failed and carried on.
#[derive(Debug, Default)]
pub struct FailingPreferences {
    inner: MemoryPreferences,
    attempts: AtomicUsize,
}

impl FailingPreferences {
    pub fn new(entries: &[(&str, &str, &str)]) -> Self {
        let inner = MemoryPreferences::new();
        for (node, key, value) in entries {
            inner
                .put(node, key, value)
                .expect("memory preferences never fail");
        }
        Self {
            inner,
            attempts: AtomicUsize::new(0),
        }
    }

    /// Number of rejected writes so far
    pub fn write_attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl PreferenceStore for FailingPreferences {
    fn get(&self, node: &str, key: &str) -> Option<String> {
        self.inner.get(node, key)
    }

    fn put(&self, node: &str, key: &str, _value: &str) -> Result<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(Error::Preferences(format!(
            "write to {}/{} rejected",
            node, key
        )))
    }

    fn remove(&self, node: &str, key: &str) -> Result<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(Error::Preferences(format!(
            "remove of {}/{} rejected",
            node, key
        )))
    }
}
