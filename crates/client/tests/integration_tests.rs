//! Client Integration Tests
//!
//! Exercises the client library against a file-backed preference store:
//! - Server list persistence and most-recently-used ordering
//! - Login screen restoring and saving user, server and settings
//! - Configuration files driving the login screen
//! - Serialization properties of the persisted server list
//!
//! Run with: `cargo test -p client --test integration_tests`

use client::config::{ClientConfig, load_config};
use client::login::{LoginOutcome, LoginScreen};
use client::servers::{self, ServerList, ServerListEvent, parse_servers, serialize_servers};
use client::tui::configure_login;
use common::test_utils::{FailingPreferences, memory_preferences};
use common::{FilePreferences, PreferenceStore, Preferences};
use model::ConnectionSpeed;
use proptest::prelude::*;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::tempdir;

fn open_store(path: &Path) -> Arc<dyn PreferenceStore> {
    Arc::new(FilePreferences::open(path).unwrap())
}

fn server_list(store: Arc<dyn PreferenceStore>) -> ServerList {
    ServerList::new(Preferences::new(store, servers::PREFERENCES_NODE), None)
}

// ============================================================================
// Server List Persistence
// ============================================================================

#[test]
fn test_missing_value_loads_empty_list() {
    let dir = tempdir().unwrap();
    let list = server_list(open_store(&dir.path().join("prefs.toml")));

    assert!(list.persisted_servers().is_empty());
    assert_eq!(list.row_count(), 0);
    assert_eq!(list.selected_server(), None);
}

#[test]
fn test_load_keeps_stored_order() {
    let store = memory_preferences(&[("server_editor", "omeroServer", "a,b,c")]);
    let list = server_list(store);
    assert_eq!(list.persisted_servers(), vec!["a", "b", "c"]);
    assert_eq!(list.entries(), ["a", "b", "c"]);
}

#[test]
fn test_save_then_reopen_puts_preferred_last() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("prefs.toml");

    {
        let mut list = server_list(open_store(&path));
        list.add("omero1.example.org");
        list.add("omero2.example.org");
        list.add("omero3.example.org");
        list.save("omero1.example.org").unwrap();
    }

    let list = server_list(open_store(&path));
    assert_eq!(
        list.persisted_servers(),
        vec![
            "omero2.example.org",
            "omero3.example.org",
            "omero1.example.org"
        ]
    );
}

#[test]
fn test_save_twice_does_not_duplicate() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("prefs.toml");

    server_list(open_store(&path)).save("a").unwrap();
    server_list(open_store(&path)).save("a").unwrap();

    let list = server_list(open_store(&path));
    let stored = list.persisted_servers();
    assert_eq!(stored.iter().filter(|s| *s == "a").count(), 1);
    assert_eq!(stored, vec!["a"]);
}

#[test]
fn test_save_empty_keeps_persisted_value() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("prefs.toml");

    // Nothing stored yet: nothing is written
    let written = server_list(open_store(&path)).save("").unwrap();
    assert_eq!(written, None);
    assert_eq!(
        open_store(&path).get("server_editor", "omeroServer"),
        None
    );

    // A stored value survives a save of an emptied list
    server_list(open_store(&path)).save("keep.example.org").unwrap();
    let mut list = server_list(open_store(&path));
    list.select(0);
    list.remove_selected();
    assert_eq!(list.row_count(), 0);
    assert_eq!(list.save("").unwrap(), None);
    assert_eq!(
        server_list(open_store(&path)).persisted_servers(),
        vec!["keep.example.org"]
    );
}

#[test]
fn test_edits_are_not_persisted_until_save() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("prefs.toml");
    server_list(open_store(&path)).save("a").unwrap();

    let mut list = server_list(open_store(&path));
    list.add("b");
    list.edit(0, "c");
    assert_eq!(list.entries(), ["c", "b"]);
    assert_eq!(list.persisted_servers(), vec!["a"]);

    list.reload();
    assert_eq!(list.entries(), ["a"]);
    assert_eq!(list.selected_index(), None);
}

#[test]
fn test_add_normalizes_urls_and_keeps_addresses() {
    let store = memory_preferences(&[]);
    let mut list = server_list(store);

    list.add("http://test.openmicroscopy.org/");
    list.add("134.20.12.33");
    assert_eq!(list.entries(), ["test.openmicroscopy.org", "134.20.12.33"]);
    assert_eq!(list.selected_server(), Some("134.20.12.33"));
}

#[test]
fn test_remove_only_entry_clears_selection() {
    let store = memory_preferences(&[("server_editor", "omeroServer", "only")]);
    let mut list = server_list(store);
    list.select(0);

    let event = list.remove(0);
    assert_eq!(
        event,
        Some(ServerListEvent::Removed {
            index: 0,
            removed: "only".to_string(),
            selected: None,
        })
    );
    assert_eq!(list.row_count(), 0);
    assert_eq!(list.selected_index(), None);
}

#[test]
fn test_observer_sees_every_change() {
    let store = memory_preferences(&[("server_editor", "omeroServer", "a,b")]);
    let mut list = server_list(store);

    let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
    let sink = seen.clone();
    list.subscribe(move |event| sink.lock().unwrap().push(event.clone()));

    list.select(1);
    list.add("c");
    list.edit(0, "z");
    list.remove(2);
    list.remove(7);

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 4);
    assert!(matches!(seen[0], ServerListEvent::SelectionChanged { .. }));
    assert!(matches!(seen[1], ServerListEvent::Added { index: 2, .. }));
    assert!(matches!(seen[2], ServerListEvent::Edited { index: 0, .. }));
    assert!(matches!(seen[3], ServerListEvent::Removed { index: 2, .. }));
}

#[test]
fn test_save_reports_store_failure() {
    let store = Arc::new(FailingPreferences::new(&[(
        "server_editor",
        "omeroServer",
        "a,b",
    )]));
    let list = server_list(store.clone());

    assert!(list.save("c").is_err());
    assert_eq!(store.write_attempts(), 1);
    assert_eq!(list.persisted_servers(), vec!["a", "b"]);
}

#[test]
fn test_failed_file_write_is_not_reported_as_saved() {
    let dir = tempdir().unwrap();
    let blocker = dir.path().join("blocker");
    fs::write(&blocker, "regular file").unwrap();
    let store = open_store(&blocker.join("prefs.toml"));

    let mut list = server_list(store.clone());
    list.add("a.example.org");
    assert!(list.save("b.example.org").is_err());

    assert!(list.persisted_servers().is_empty());
    assert_eq!(LoginScreen::new(store).server(), "");
}

// ============================================================================
// Login Screen
// ============================================================================

#[test]
fn test_login_persists_and_restores_state() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("prefs.toml");

    {
        let mut login = LoginScreen::new(open_store(&path));
        login.apply_server("omero.example.org:4064");
        login.set_username("alice");
        login.set_password("secret");
        login.toggle_encryption();
        login.set_connection_speed(ConnectionSpeed::Low);

        match login.login() {
            LoginOutcome::Submitted(credentials) => {
                assert_eq!(credentials.username(), "alice");
                assert_eq!(credentials.password(), "secret");
                assert_eq!(credentials.hostname(), "omero.example.org");
                assert_eq!(credentials.port(), Some(4064));
                assert!(credentials.is_encrypted());
                assert_eq!(credentials.speed(), ConnectionSpeed::Low);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    let login = LoginScreen::new(open_store(&path));
    assert_eq!(login.username(), "alice");
    assert_eq!(login.password(), "");
    assert_eq!(login.server(), "omero.example.org:4064");
    assert!(login.is_encrypted());
    assert_eq!(login.connection_speed(), ConnectionSpeed::Low);
}

#[test]
fn test_login_moves_server_to_end_of_list() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("prefs.toml");
    open_store(&path)
        .put("server_editor", "omeroServer", "a.example.org,b.example.org")
        .unwrap();

    let mut login = LoginScreen::new(open_store(&path));
    assert_eq!(login.server(), "b.example.org");

    login.apply_server("a.example.org");
    login.set_username("bob");
    assert!(matches!(login.login(), LoginOutcome::Submitted(_)));

    let list = server_list(open_store(&path));
    assert_eq!(list.persisted_servers(), vec!["b.example.org", "a.example.org"]);
}

#[test]
fn test_incomplete_login_writes_nothing() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("prefs.toml");

    let mut login = LoginScreen::new(open_store(&path));
    login.apply_server("omero.example.org");
    assert!(matches!(login.login(), LoginOutcome::Incomplete));

    let store = open_store(&path);
    assert_eq!(store.get("screen_login", "omeroUser"), None);
    assert_eq!(store.get("server_editor", "omeroServer"), None);
}

#[test]
fn test_login_survives_failing_store() {
    let store = Arc::new(FailingPreferences::new(&[]));
    let mut login = LoginScreen::new(store.clone());
    login.apply_server("omero.example.org");
    login.set_username("carol");

    assert!(matches!(login.login(), LoginOutcome::Submitted(_)));
    assert!(store.write_attempts() >= 2);
    assert!(!login.controls_enabled());

    login.on_login_failure();
    assert!(login.controls_enabled());
    assert!(!login.has_attempted_to_login());
}

#[test]
fn test_removing_shown_server_switches_to_new_selection() {
    let store = memory_preferences(&[("server_editor", "omeroServer", "a,b,c")]);
    let mut login = LoginScreen::new(store);
    assert_eq!(login.server(), "c");

    assert!(login.open_server_editor());
    assert_eq!(login.editor().selected_server(), Some("c"));

    login.remove_selected_server();
    assert_eq!(login.server(), "b");
    assert_eq!(login.editor().entries(), ["a", "b"]);
}

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn test_config_file_drives_login_screen() {
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("client.toml");
    fs::write(
        &config_path,
        r#"
[client]
log_level = "debug"

[login]
default_server = "omero.example.org"
server_configurable = false
encrypted = true
encryption_configurable = false
quit_button_text = "Exit"
"#,
    )
    .unwrap();

    let config = load_config(config_path.to_str().unwrap()).unwrap();
    assert_eq!(config.client.log_level, "debug");

    let mut login = LoginScreen::new(memory_preferences(&[]));
    configure_login(&mut login, &config);

    assert_eq!(login.server(), "omero.example.org");
    assert!(!login.open_server_editor());
    assert!(login.is_encrypted());
    assert!(!login.is_encryption_configurable());
    assert_eq!(login.quit_button_text(), "Exit");
    assert_eq!(login.quit_button_mnemonic(), 'E');
}

#[test]
fn test_config_save_round_trip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join("client.toml");

    let mut config = ClientConfig::default();
    config.login.default_server = Some("omero.example.org:4064".to_string());
    config.save(&path).unwrap();

    let loaded = ClientConfig::load(Some(path)).unwrap();
    assert_eq!(
        loaded.login.default_server.as_deref(),
        Some("omero.example.org:4064")
    );
    assert_eq!(loaded.login.connect_timeout(), config.login.connect_timeout());
}

#[test]
fn test_invalid_config_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("client.toml");
    fs::write(&path, "[login]\nserver_configurable = false\n").unwrap();

    assert!(load_config(path.to_str().unwrap()).is_err());
}

// ============================================================================
// Property Tests
// ============================================================================

fn host_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9]{0,8}(\\.[a-z0-9]{1,6}){0,2}"
}

proptest! {
    /// Property: the persisted value splits back into the storable names
    #[test]
    fn prop_serialize_then_parse_keeps_storable_names(
        names in prop::collection::vec("[ a-z0-9.,:]{0,12}", 0..8),
    ) {
        let value = serialize_servers(names.iter().map(String::as_str));
        let expected: Vec<String> = names
            .iter()
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty() && !n.contains(servers::SERVER_NAME_SEPARATOR))
            .collect();

        prop_assert_eq!(parse_servers(&value), expected);
        prop_assert!(!value.starts_with(servers::SERVER_NAME_SEPARATOR));
        prop_assert!(!value.ends_with(servers::SERVER_NAME_SEPARATOR));
    }

    /// Property: after save(x) the reloaded list ends with x exactly once
    #[test]
    fn prop_save_puts_preferred_last_once(
        existing in prop::collection::vec(host_strategy(), 0..6),
        preferred in host_strategy(),
    ) {
        let store = memory_preferences(&[]);
        let mut list = server_list(store.clone());
        for name in &existing {
            list.add(name);
        }
        list.save(&preferred).unwrap();

        let stored = server_list(store).persisted_servers();
        prop_assert_eq!(stored.last(), Some(&preferred));
        prop_assert_eq!(stored.iter().filter(|s| **s == preferred).count(), 1);
        prop_assert_eq!(
            stored.len(),
            existing.iter().filter(|s| **s != preferred).count() + 1
        );
    }
}
