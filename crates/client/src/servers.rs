//! Server list editor
//!
//! Keeps the ordered list of server addresses the user can log in to and its
//! persisted form: a single comma-separated preference value. Edits only
//! touch the in-memory list; [`ServerList::save`] is the one operation that
//! writes, and it moves the server being logged in to the end of the list so
//! the most recently used server comes last.

use common::Preferences;
use tracing::{debug, info, warn};
use url::Url;

/// Preference node owning the server list
pub const PREFERENCES_NODE: &str = "server_editor";

/// Separator between server names in the persisted value
pub const SERVER_NAME_SEPARATOR: char = ',';

const OMERO_SERVER: &str = "omeroServer";

/// Schemes whose URLs are reduced to their host
const URL_SCHEMES: [&str; 4] = ["http", "https", "ftp", "file"];

/// Change made to a [`ServerList`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerListEvent {
    /// A server was appended and became the selection
    Added { index: usize, name: String },
    /// A server was removed; `selected` is the selection afterwards
    Removed {
        index: usize,
        removed: String,
        selected: Option<String>,
    },
    /// A server was renamed in place
    Edited {
        index: usize,
        previous: String,
        name: String,
    },
    /// The selection moved without the list changing
    SelectionChanged { selected: Option<String> },
}

type Observer = Box<dyn FnMut(&ServerListEvent) + Send>;

/// Normalise user input into a server name
///
/// Surrounding whitespace and trailing slashes are dropped. An `http`,
/// `https`, `ftp` or `file` URL with a host is reduced to the host; anything
/// else (bare host names, IP addresses, `host:port`, other schemes) is kept
/// as typed.
pub fn normalize_server_name(input: &str) -> String {
    let trimmed = input.trim().trim_end_matches('/').trim_end();
    match Url::parse(trimmed) {
        Ok(url) if URL_SCHEMES.contains(&url.scheme()) => match url.host_str() {
            Some(host) if !host.is_empty() => host.to_string(),
            _ => trimmed.to_string(),
        },
        _ => trimmed.to_string(),
    }
}

/// Split a persisted value into server names
///
/// Segments are trimmed and blank segments dropped.
pub fn parse_servers(value: &str) -> Vec<String> {
    value
        .split(SERVER_NAME_SEPARATOR)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Join server names into a persisted value
///
/// Names are trimmed; blank names and names containing the separator are
/// left out so the value always splits back into the same names.
pub fn serialize_servers<'a>(names: impl IntoIterator<Item = &'a str>) -> String {
    names
        .into_iter()
        .map(str::trim)
        .filter(|name| {
            if name.contains(SERVER_NAME_SEPARATOR) {
                warn!("Skipping server name containing separator: {:?}", name);
                return false;
            }
            !name.is_empty()
        })
        .collect::<Vec<_>>()
        .join(&SERVER_NAME_SEPARATOR.to_string())
}

fn is_storable(name: &str) -> bool {
    !name.is_empty() && !name.contains(SERVER_NAME_SEPARATOR)
}

/// Editable list of known servers
pub struct ServerList {
    prefs: Preferences,
    entries: Vec<String>,
    selected: Option<usize>,
    active_server: String,
    observers: Vec<Observer>,
}

impl ServerList {
    /// Create the list from the persisted value
    ///
    /// `active_server` names the server the application is connected to, if
    /// any; it is only used for display.
    pub fn new(prefs: Preferences, active_server: Option<&str>) -> Self {
        let mut list = Self {
            prefs,
            entries: Vec::new(),
            selected: None,
            active_server: active_server.unwrap_or_default().trim().to_string(),
            observers: Vec::new(),
        };
        list.entries = list.persisted_servers();
        debug!("Loaded {} servers from preferences", list.entries.len());
        list
    }

    /// Server names currently persisted, in stored order
    pub fn persisted_servers(&self) -> Vec<String> {
        self.prefs
            .get(OMERO_SERVER)
            .map(|value| parse_servers(&value))
            .unwrap_or_default()
    }

    /// Discard in-memory edits and reload the persisted list
    pub fn reload(&mut self) {
        self.entries = self.persisted_servers();
        self.selected = None;
    }

    /// Register an observer called after every change
    pub fn subscribe<F>(&mut self, observer: F)
    where
        F: FnMut(&ServerListEvent) + Send + 'static,
    {
        self.observers.push(Box::new(observer));
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn row_count(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected
    }

    pub fn selected_server(&self) -> Option<&str> {
        self.selected
            .and_then(|i| self.entries.get(i))
            .map(String::as_str)
    }

    /// Server the application is connected to, if any
    pub fn active_server(&self) -> Option<&str> {
        if self.active_server.is_empty() {
            None
        } else {
            Some(&self.active_server)
        }
    }

    pub fn set_active_server(&mut self, server: Option<&str>) {
        self.active_server = server.unwrap_or_default().trim().to_string();
    }

    /// True when the selected entry is the connected server
    pub fn is_active_selected(&self) -> bool {
        match (self.selected_server(), self.active_server()) {
            (Some(selected), Some(active)) => selected == active,
            _ => false,
        }
    }

    /// Select the row at `index`
    pub fn select(&mut self, index: usize) -> Option<ServerListEvent> {
        if index >= self.entries.len() || self.selected == Some(index) {
            return None;
        }
        self.selected = Some(index);
        self.notify(ServerListEvent::SelectionChanged {
            selected: Some(self.entries[index].clone()),
        })
    }

    pub fn clear_selection(&mut self) -> Option<ServerListEvent> {
        self.selected.take()?;
        self.notify(ServerListEvent::SelectionChanged { selected: None })
    }

    /// Select the first row named `server`
    pub fn set_focus(&mut self, server: &str) -> Option<ServerListEvent> {
        let index = self.entries.iter().position(|s| s == server.trim())?;
        self.select(index)
    }

    /// Append a server typed by the user and select it
    ///
    /// The input is normalised first. Blank input and names containing the
    /// separator are ignored.
    pub fn add(&mut self, name: &str) -> Option<ServerListEvent> {
        let name = normalize_server_name(name);
        self.push(name)
    }

    /// Append a server name as given (trimmed only) and select it
    pub fn add_row(&mut self, name: &str) -> Option<ServerListEvent> {
        self.push(name.trim().to_string())
    }

    fn push(&mut self, name: String) -> Option<ServerListEvent> {
        if !is_storable(&name) {
            warn!("Ignoring server name {:?}", name);
            return None;
        }
        self.entries.push(name.clone());
        let index = self.entries.len() - 1;
        self.selected = Some(index);
        debug!("Added server {} at row {}", name, index);
        self.notify(ServerListEvent::Added { index, name })
    }

    /// Remove the row at `index`
    ///
    /// Removing the selected row moves the selection to the previous row (or
    /// the new first row), and clears it when the list becomes empty.
    pub fn remove(&mut self, index: usize) -> Option<ServerListEvent> {
        if index >= self.entries.len() {
            return None;
        }
        let removed = self.entries.remove(index);
        self.selected = match self.selected {
            Some(sel) if sel == index => {
                if self.entries.is_empty() {
                    None
                } else {
                    Some(index.saturating_sub(1))
                }
            }
            Some(sel) if sel > index => Some(sel - 1),
            other => other,
        };
        debug!("Removed server {} from row {}", removed, index);
        let selected = self.selected_server().map(str::to_string);
        self.notify(ServerListEvent::Removed {
            index,
            removed,
            selected,
        })
    }

    pub fn remove_selected(&mut self) -> Option<ServerListEvent> {
        let index = self.selected?;
        self.remove(index)
    }

    /// Rename the row at `index`, normalising like [`ServerList::add`]
    pub fn edit(&mut self, index: usize, name: &str) -> Option<ServerListEvent> {
        let name = normalize_server_name(name);
        if !is_storable(&name) {
            warn!("Ignoring edited server name {:?}", name);
            return None;
        }
        let entry = self.entries.get_mut(index)?;
        if *entry == name {
            return None;
        }
        let previous = std::mem::replace(entry, name.clone());
        debug!("Edited server {} -> {}", previous, name);
        self.notify(ServerListEvent::Edited {
            index,
            previous,
            name,
        })
    }

    pub fn edit_selected(&mut self, name: &str) -> Option<ServerListEvent> {
        let index = self.selected?;
        self.edit(index, name)
    }

    /// Persist the list with `preferred` as the most recently used server
    ///
    /// Entries equal to `preferred` are dropped and `preferred` (when
    /// non-empty) is appended. If nothing remains the persisted value is
    /// left untouched. Returns the value written, if any.
    pub fn save(&self, preferred: &str) -> common::Result<Option<String>> {
        let preferred = preferred.trim();
        let mut names: Vec<&str> = self
            .entries
            .iter()
            .map(|s| s.trim())
            .filter(|name| *name != preferred)
            .collect();
        if !preferred.is_empty() {
            names.push(preferred);
        }

        let value = serialize_servers(names);
        if value.is_empty() {
            debug!("Server list empty, keeping persisted value");
            return Ok(None);
        }

        self.prefs.put(OMERO_SERVER, &value)?;
        info!("Saved server list ({} servers)", value.split(SERVER_NAME_SEPARATOR).count());
        Ok(Some(value))
    }

    fn notify(&mut self, event: ServerListEvent) -> Option<ServerListEvent> {
        for observer in &mut self.observers {
            observer(&event);
        }
        Some(event)
    }
}

impl std::fmt::Debug for ServerList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerList")
            .field("entries", &self.entries)
            .field("selected", &self.selected)
            .field("active_server", &self.active_server)
            .field("observers", &self.observers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::PreferenceStore;
    use common::test_utils::{FailingPreferences, memory_preferences};
    use std::sync::{Arc, Mutex};

    fn list_with(value: Option<&str>) -> (Arc<common::MemoryPreferences>, ServerList) {
        let store = match value {
            Some(v) => memory_preferences(&[(PREFERENCES_NODE, OMERO_SERVER, v)]),
            None => memory_preferences(&[]),
        };
        let prefs = Preferences::new(store.clone(), PREFERENCES_NODE);
        (store, ServerList::new(prefs, None))
    }

    fn persisted(store: &common::MemoryPreferences) -> Option<String> {
        store.get(PREFERENCES_NODE, OMERO_SERVER)
    }

    #[test]
    fn test_load_keeps_stored_order() {
        let (_store, list) = list_with(Some("a,b,c"));
        assert_eq!(list.persisted_servers(), vec!["a", "b", "c"]);
        assert_eq!(list.entries(), ["a", "b", "c"]);
        assert_eq!(list.selected_server(), None);
    }

    #[test]
    fn test_load_missing_value_is_empty() {
        let (_store, list) = list_with(None);
        assert!(list.persisted_servers().is_empty());
        assert_eq!(list.row_count(), 0);
    }

    #[test]
    fn test_load_drops_blank_segments() {
        let (_store, list) = list_with(Some("a,, b ,"));
        assert_eq!(list.entries(), ["a", "b"]);
    }

    #[test]
    fn test_normalize_url_to_host() {
        assert_eq!(
            normalize_server_name("http://test.openmicroscopy.org/"),
            "test.openmicroscopy.org"
        );
        assert_eq!(
            normalize_server_name("  https://omero.example.org:8443/webclient// "),
            "omero.example.org"
        );
    }

    #[test]
    fn test_normalize_keeps_literals() {
        assert_eq!(normalize_server_name("134.20.12.33"), "134.20.12.33");
        assert_eq!(normalize_server_name("localhost:4064"), "localhost:4064");
        assert_eq!(normalize_server_name("omero.example.org///"), "omero.example.org");
        assert_eq!(normalize_server_name("  omero  "), "omero");
    }

    #[test]
    fn test_normalize_keeps_unknown_schemes() {
        assert_eq!(normalize_server_name("omero://host.example.org"), "omero://host.example.org");
        assert_eq!(
            normalize_server_name("wss://omero.example.org/omero-ws/"),
            "wss://omero.example.org/omero-ws"
        );
        assert_eq!(normalize_server_name("ftp://files.example.org/"), "files.example.org");
    }

    #[test]
    fn test_add_selects_new_row() {
        let (_store, mut list) = list_with(Some("a"));
        let event = list.add("http://test.openmicroscopy.org/");
        assert_eq!(
            event,
            Some(ServerListEvent::Added {
                index: 1,
                name: "test.openmicroscopy.org".to_string()
            })
        );
        assert_eq!(list.selected_server(), Some("test.openmicroscopy.org"));
    }

    #[test]
    fn test_add_allows_duplicates() {
        let (_store, mut list) = list_with(Some("a"));
        list.add("a");
        assert_eq!(list.entries(), ["a", "a"]);
        assert_eq!(list.selected_index(), Some(1));
    }

    #[test]
    fn test_add_rejects_blank_and_separator() {
        let (_store, mut list) = list_with(None);
        assert!(list.add("   ").is_none());
        assert!(list.add("a,b").is_none());
        assert!(list.is_empty());
    }

    #[test]
    fn test_add_row_skips_normalization() {
        let (_store, mut list) = list_with(None);
        list.add_row(" wss://omero.example.org/omero-ws ");
        assert_eq!(list.entries(), ["wss://omero.example.org/omero-ws"]);
    }

    #[test]
    fn test_does_not_persist_until_save() {
        let (store, mut list) = list_with(Some("a"));
        list.add("b");
        list.remove(0);
        assert_eq!(persisted(&store).as_deref(), Some("a"));
    }

    #[test]
    fn test_remove_only_entry_clears_selection() {
        let (_store, mut list) = list_with(None);
        list.add("only");
        let event = list.remove(0);
        assert_eq!(
            event,
            Some(ServerListEvent::Removed {
                index: 0,
                removed: "only".to_string(),
                selected: None
            })
        );
        assert_eq!(list.row_count(), 0);
        assert_eq!(list.selected_server(), None);
    }

    #[test]
    fn test_remove_selected_moves_to_previous() {
        let (_store, mut list) = list_with(Some("a,b,c"));
        list.select(2);
        list.remove(2);
        assert_eq!(list.selected_server(), Some("b"));

        list.select(0);
        list.remove(0);
        assert_eq!(list.selected_server(), Some("b"));
        assert_eq!(list.entries(), ["b"]);
    }

    #[test]
    fn test_remove_before_selection_keeps_selected_entry() {
        let (_store, mut list) = list_with(Some("a,b,c"));
        list.select(2);
        list.remove(0);
        assert_eq!(list.selected_server(), Some("c"));
        assert_eq!(list.selected_index(), Some(1));
    }

    #[test]
    fn test_remove_out_of_range_is_noop() {
        let (_store, mut list) = list_with(Some("a"));
        assert!(list.remove(5).is_none());
        assert_eq!(list.row_count(), 1);
    }

    #[test]
    fn test_edit_normalizes() {
        let (_store, mut list) = list_with(Some("a,b"));
        let event = list.edit(1, "http://omero.example.org/");
        assert_eq!(
            event,
            Some(ServerListEvent::Edited {
                index: 1,
                previous: "b".to_string(),
                name: "omero.example.org".to_string()
            })
        );
        assert_eq!(list.entries(), ["a", "omero.example.org"]);
    }

    #[test]
    fn test_edit_invalid_is_noop() {
        let (_store, mut list) = list_with(Some("a"));
        assert!(list.edit(3, "x").is_none());
        assert!(list.edit(0, " ").is_none());
        assert!(list.edit(0, "a").is_none());
        assert_eq!(list.entries(), ["a"]);
    }

    #[test]
    fn test_save_moves_preferred_to_end() {
        let (store, list) = list_with(Some("a,b,c"));
        let written = list.save("a").unwrap();
        assert_eq!(written.as_deref(), Some("b,c,a"));
        assert_eq!(persisted(&store).as_deref(), Some("b,c,a"));
        assert_eq!(list.persisted_servers().last().map(String::as_str), Some("a"));
    }

    #[test]
    fn test_save_twice_does_not_duplicate() {
        let (store, list) = list_with(None);
        list.save("a").unwrap();
        list.save("a").unwrap();
        assert_eq!(persisted(&store).as_deref(), Some("a"));
    }

    #[test]
    fn test_save_new_preferred_appended() {
        let (_store, mut list) = list_with(Some("a"));
        list.add("b");
        list.save("c").unwrap();
        assert_eq!(list.persisted_servers(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_save_empty_keeps_persisted_value() {
        let (store, list) = list_with(None);
        assert_eq!(list.save("").unwrap(), None);
        assert_eq!(persisted(&store), None);

        let (store, mut list) = list_with(Some("a"));
        list.remove(0);
        assert_eq!(list.save("  ").unwrap(), None);
        assert_eq!(persisted(&store).as_deref(), Some("a"));
    }

    #[test]
    fn test_save_write_failure_reported() {
        let store = Arc::new(FailingPreferences::new(&[]));
        let list = ServerList::new(Preferences::new(store.clone(), PREFERENCES_NODE), None);
        assert!(list.save("a").is_err());
        assert_eq!(store.write_attempts(), 1);
    }

    #[test]
    fn test_active_selected() {
        let store = memory_preferences(&[(PREFERENCES_NODE, OMERO_SERVER, "a,b")]);
        let mut list = ServerList::new(Preferences::new(store, PREFERENCES_NODE), Some("b"));
        assert!(!list.is_active_selected());
        list.select(1);
        assert!(list.is_active_selected());
        list.select(0);
        assert!(!list.is_active_selected());
        assert_eq!(list.active_server(), Some("b"));

        list.set_active_server(None);
        assert!(!list.is_active_selected());
        assert_eq!(list.active_server(), None);
    }

    #[test]
    fn test_set_focus_and_selection_events() {
        let (_store, mut list) = list_with(Some("a,b"));
        assert_eq!(
            list.set_focus("b"),
            Some(ServerListEvent::SelectionChanged {
                selected: Some("b".to_string())
            })
        );
        assert!(list.set_focus("b").is_none());
        assert!(list.set_focus("zzz").is_none());
        assert!(list.clear_selection().is_some());
        assert!(list.clear_selection().is_none());
    }

    #[test]
    fn test_observers_receive_events() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let (_store, mut list) = list_with(None);
        let sink = seen.clone();
        list.subscribe(move |event| sink.lock().unwrap().push(event.clone()));

        list.add("a");
        list.add("b");
        list.remove(1);

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 3);
        assert!(matches!(seen[2], ServerListEvent::Removed { ref removed, .. } if removed == "b"));
    }

    #[test]
    fn test_reload_discards_edits() {
        let (_store, mut list) = list_with(Some("a,b"));
        list.add("c");
        list.remove(0);
        list.reload();
        assert_eq!(list.entries(), ["a", "b"]);
        assert_eq!(list.selected_server(), None);
    }

    #[test]
    fn test_serialize_skips_blank_and_separator() {
        assert_eq!(serialize_servers([" a ", "", "b,c", "d"]), "a,d");
        assert_eq!(serialize_servers(Vec::<&str>::new()), "");
    }
}
