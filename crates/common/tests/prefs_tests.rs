//! Preference Store Integration Tests
//!
//! Tests the preference backends through the public API:
//! - File-backed store shared by several scoped handles
//! - Reopening a store sees earlier writes
//! - Failing store reports errors without losing seeded values
//!
//! Run with: `cargo test -p common --test prefs_tests`

use common::test_utils::{FailingPreferences, memory_preferences};
use common::{Error, FilePreferences, PreferenceStore, Preferences};
use std::fs;
use std::sync::Arc;
use tempfile::tempdir;

// ============================================================================
// File Store Tests
// ============================================================================

#[test]
fn test_file_store_nodes_written_as_tables() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("preferences.toml");

    let store: Arc<dyn PreferenceStore> = Arc::new(FilePreferences::open(&path).unwrap());
    let login = Preferences::new(store.clone(), "screen_login");
    let editor = Preferences::new(store, "server_editor");

    login.put("omeroUser", "alice").unwrap();
    editor
        .put("omeroServer", "test.openmicroscopy.org,134.20.12.33")
        .unwrap();

    let content = fs::read_to_string(&path).unwrap();
    assert!(content.contains("[screen_login]"));
    assert!(content.contains("[server_editor]"));
    assert!(content.contains("omeroServer = \"test.openmicroscopy.org,134.20.12.33\""));
}

#[test]
fn test_file_store_reopen_and_remove() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("preferences.toml");

    {
        let store = FilePreferences::open(&path).unwrap();
        store.put("screen_login", "omeroConnectionSpeed", "2").unwrap();
        store.put("screen_login", "omeroTransferEncrypted", "true").unwrap();
    }

    let store = FilePreferences::open(&path).unwrap();
    assert_eq!(
        store.get("screen_login", "omeroConnectionSpeed").as_deref(),
        Some("2")
    );

    store.remove("screen_login", "omeroConnectionSpeed").unwrap();
    let store = FilePreferences::open(&path).unwrap();
    assert!(store.get("screen_login", "omeroConnectionSpeed").is_none());
    assert_eq!(
        store.get("screen_login", "omeroTransferEncrypted").as_deref(),
        Some("true")
    );
}

#[test]
fn test_remove_missing_key_is_noop() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("preferences.toml");

    let store = FilePreferences::open(&path).unwrap();
    store.remove("server_editor", "omeroServer").unwrap();
    // Nothing changed, so nothing was written
    assert!(!path.exists());
}

#[test]
fn test_store_path_accessor() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("prefs.toml");
    let store = FilePreferences::open(&path).unwrap();
    assert_eq!(store.path(), path.as_path());
}

// ============================================================================
// Test Double Tests
// ============================================================================

#[test]
fn test_failing_store_through_scoped_handle() {
    let store = Arc::new(FailingPreferences::new(&[(
        "server_editor",
        "omeroServer",
        "a,b",
    )]));
    let prefs = Preferences::new(store.clone(), "server_editor");

    assert_eq!(prefs.get("omeroServer").as_deref(), Some("a,b"));
    let err = prefs.put("omeroServer", "c").unwrap_err();
    assert!(matches!(err, Error::Preferences(_)));
    assert_eq!(store.write_attempts(), 1);
    assert_eq!(prefs.get("omeroServer").as_deref(), Some("a,b"));
}

#[test]
fn test_memory_store_isolated_between_instances() {
    let a = memory_preferences(&[("node", "key", "a")]);
    let b = memory_preferences(&[]);
    assert_eq!(a.get("node", "key").as_deref(), Some("a"));
    assert!(b.get("node", "key").is_none());
}
