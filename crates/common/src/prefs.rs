//! Per-user preference storage
//!
//! Preferences are string values grouped by node (one node per component,
//! e.g. `screen_login` or `server_editor`). Components receive a
//! [`Preferences`] handle scoped to their node instead of looking the store
//! up globally, so tests can hand them a [`MemoryPreferences`].
//!
//! # File format
//!
//! [`FilePreferences`] keeps one TOML table per node:
//!
//! ```toml
//! [screen_login]
//! omeroUser = "alice"
//!
//! [server_editor]
//! omeroServer = "test.openmicroscopy.org,134.20.12.33"
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::{Error, Result};

type PreferenceTable = BTreeMap<String, BTreeMap<String, String>>;

/// Key-value backend for user preferences
///
/// Reads never fail: a missing or unreadable value is `None`. Writes are
/// last-write-wins with no transactional guarantees.
pub trait PreferenceStore: Send + Sync {
    /// Value stored under `key` in `node`
    fn get(&self, node: &str, key: &str) -> Option<String>;

    /// Store `value` under `key` in `node`
    fn put(&self, node: &str, key: &str, value: &str) -> Result<()>;

    /// Delete `key` from `node`
    fn remove(&self, node: &str, key: &str) -> Result<()>;
}

fn lock(values: &Mutex<PreferenceTable>) -> MutexGuard<'_, PreferenceTable> {
    values.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// In-memory store, used for tests and `--preferences` less sessions
#[derive(Debug, Default)]
pub struct MemoryPreferences {
    values: Mutex<PreferenceTable>,
}

impl MemoryPreferences {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of values across all nodes
    pub fn len(&self) -> usize {
        lock(&self.values).values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl PreferenceStore for MemoryPreferences {
    fn get(&self, node: &str, key: &str) -> Option<String> {
        lock(&self.values).get(node)?.get(key).cloned()
    }

    fn put(&self, node: &str, key: &str, value: &str) -> Result<()> {
        lock(&self.values)
            .entry(node.to_string())
            .or_default()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, node: &str, key: &str) -> Result<()> {
        if let Some(table) = lock(&self.values).get_mut(node) {
            table.remove(key);
        }
        Ok(())
    }
}

/// TOML file backed store
///
/// The whole file is rewritten on every change. A change only becomes
/// visible to `get` once the file was written.
#[derive(Debug)]
pub struct FilePreferences {
    path: PathBuf,
    values: Mutex<PreferenceTable>,
}

impl FilePreferences {
    /// Open the store at `path`, starting empty if the file does not exist
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let values = if path.exists() {
            let content = fs::read_to_string(&path)?;
            toml::from_str::<PreferenceTable>(&content).map_err(|e| {
                Error::Preferences(format!("Failed to parse {}: {}", path.display(), e))
            })?
        } else {
            PreferenceTable::new()
        };

        tracing::debug!(
            "Opened preferences at {} ({} nodes)",
            path.display(),
            values.len()
        );

        Ok(Self {
            path,
            values: Mutex::new(values),
        })
    }

    /// Get the default preferences file path
    pub fn default_path() -> PathBuf {
        if let Some(config_dir) = dirs::config_dir() {
            config_dir.join("omero-insight").join("preferences.toml")
        } else {
            PathBuf::from(".config/omero-insight/preferences.toml")
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, values: &PreferenceTable) -> Result<()> {
        let content = toml::to_string_pretty(values)
            .map_err(|e| Error::Preferences(format!("Failed to serialize preferences: {}", e)))?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, content)?;

        tracing::trace!("Wrote preferences to {}", self.path.display());
        Ok(())
    }
}

impl PreferenceStore for FilePreferences {
    fn get(&self, node: &str, key: &str) -> Option<String> {
        lock(&self.values).get(node)?.get(key).cloned()
    }

    fn put(&self, node: &str, key: &str, value: &str) -> Result<()> {
        let mut values = lock(&self.values);
        let mut updated = values.clone();
        updated
            .entry(node.to_string())
            .or_default()
            .insert(key.to_string(), value.to_string());
        self.persist(&updated)?;
        *values = updated;
        Ok(())
    }

    fn remove(&self, node: &str, key: &str) -> Result<()> {
        let mut values = lock(&self.values);
        let mut updated = values.clone();
        let removed = updated
            .get_mut(node)
            .and_then(|table| table.remove(key))
            .is_some();
        if removed {
            self.persist(&updated)?;
            *values = updated;
        }
        Ok(())
    }
}

/// Preference handle scoped to one node
#[derive(Clone)]
pub struct Preferences {
    store: Arc<dyn PreferenceStore>,
    node: String,
}

impl Preferences {
    pub fn new(store: Arc<dyn PreferenceStore>, node: impl Into<String>) -> Self {
        Self {
            store,
            node: node.into(),
        }
    }

    pub fn node(&self) -> &str {
        &self.node
    }

    /// Handle for a sibling node sharing the same store
    pub fn sibling(&self, node: impl Into<String>) -> Self {
        Self::new(self.store.clone(), node)
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.store.get(&self.node, key)
    }

    pub fn put(&self, key: &str, value: &str) -> Result<()> {
        self.store.put(&self.node, key, value)
    }

    pub fn remove(&self, key: &str) -> Result<()> {
        self.store.remove(&self.node, key)
    }
}

impl std::fmt::Debug for Preferences {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Preferences")
            .field("node", &self.node)
            .finish_non_exhaustive()
    }
}
