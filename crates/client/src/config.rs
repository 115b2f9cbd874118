//! Client configuration management

use anyhow::{Context, Result, anyhow};
use model::{ConnectionSpeed, UserCredentials};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub client: ClientSettings,
    #[serde(default)]
    pub login: LoginSettings,
    #[serde(default)]
    pub preferences: PreferencesSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientSettings {
    pub log_level: String,
    /// Log file used while the TUI owns the terminal
    /// If None, uses `<data_dir>/omero-insight/insight-client.log`
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginSettings {
    /// Server offered when the user has none of their own
    #[serde(default)]
    pub default_server: Option<String>,
    /// Whether the user may pick a server other than the default
    pub server_configurable: bool,
    /// Force the transfer encryption setting (None keeps the user's choice)
    #[serde(default)]
    pub encrypted: Option<bool>,
    /// Whether the user may toggle transfer encryption
    pub encryption_configurable: bool,
    /// Show the connection speed selector
    pub show_connection_speed: bool,
    /// Label of the quit button
    #[serde(default)]
    pub quit_button_text: Option<String>,
    /// Seconds to wait for the server to accept the connection
    pub connect_timeout_secs: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PreferencesSettings {
    /// Preference file
    /// If None, uses `<config_dir>/omero-insight/preferences.toml`
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_file: None,
        }
    }
}

impl Default for LoginSettings {
    fn default() -> Self {
        Self {
            default_server: None,
            server_configurable: true,
            encrypted: None,
            encryption_configurable: true,
            show_connection_speed: true,
            quit_button_text: None,
            connect_timeout_secs: 10,
        }
    }
}

impl LoginSettings {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

impl ClientConfig {
    /// Load configuration from the specified path
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        let config_path = if let Some(p) = path {
            p
        } else {
            // Try standard locations in order
            let candidates = vec![
                Self::default_path(),
                PathBuf::from("/etc/omero-insight/client.toml"),
            ];

            candidates
                .into_iter()
                .find(|p| p.exists())
                .ok_or_else(|| anyhow!("No configuration file found, using defaults"))?
        };

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let config: ClientConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", config_path.display()))?;

        config.validate()?;

        tracing::info!("Loaded configuration from: {}", config_path.display());
        tracing::debug!(
            "Config: default_server={:?}, server_configurable={}, encryption_configurable={}",
            config.login.default_server,
            config.login.server_configurable,
            config.login.encryption_configurable
        );
        Ok(config)
    }

    /// Load configuration or return defaults if not found
    pub fn load_or_default() -> Self {
        match Self::load(None) {
            Ok(config) => config,
            Err(e) => {
                // Print to stderr since logging might not be initialized yet
                eprintln!("Config: {}", e);
                Self::default()
            }
        }
    }

    /// Save configuration to the specified path
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize configuration")?;

        // Create parent directories if they don't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        tracing::info!("Saved configuration to: {}", path.display());
        Ok(())
    }

    /// Get the default configuration file path
    pub fn default_path() -> PathBuf {
        if let Some(config_dir) = dirs::config_dir() {
            config_dir.join("omero-insight").join("client.toml")
        } else {
            PathBuf::from(".config/omero-insight/client.toml")
        }
    }

    /// Preference file to open, with `~` expanded
    pub fn preferences_path(&self) -> PathBuf {
        match &self.preferences.path {
            Some(path) => expand_path(path),
            None => common::FilePreferences::default_path(),
        }
    }

    /// Log file for interactive sessions, with `~` expanded
    pub fn log_file_path(&self) -> PathBuf {
        match &self.client.log_file {
            Some(path) => expand_path(path),
            None => dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from(".local/share"))
                .join("omero-insight")
                .join("insight-client.log"),
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        // Validate log level
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.client.log_level.as_str()) {
            return Err(anyhow!(
                "Invalid log level '{}', must be one of: {}",
                self.client.log_level,
                valid_levels.join(", ")
            ));
        }

        if self.login.connect_timeout_secs == 0 {
            return Err(anyhow!("connect_timeout_secs must be greater than zero"));
        }

        // The default server must be something the login screen can submit
        if let Some(server) = self.login.default_server.as_deref() {
            if server.trim().is_empty() {
                return Err(anyhow!("Empty default_server in [login]"));
            }
            UserCredentials::new("validate", "", server, ConnectionSpeed::default())
                .with_context(|| format!("Invalid default_server '{}'", server))?;
        }

        if !self.login.server_configurable && self.login.default_server.is_none() {
            return Err(anyhow!(
                "server_configurable = false requires a default_server"
            ));
        }

        Ok(())
    }
}

fn expand_path(path: &Path) -> PathBuf {
    PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).as_ref())
}

/// Load configuration from a user-supplied path, expanding `~`
pub fn load_config(path: &str) -> Result<ClientConfig> {
    let path_buf = PathBuf::from(shellexpand::tilde(path).as_ref());
    ClientConfig::load(Some(path_buf))
}
