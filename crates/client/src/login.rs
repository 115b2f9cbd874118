//! Login screen model
//!
//! Holds the form state behind the login screen: credentials being typed,
//! the server to connect to, transfer encryption and connection speed. The
//! user preferences it reads at start-up are written back when the user
//! logs in or changes the connection speed.

use std::sync::Arc;

use common::{PreferenceStore, Preferences};
use model::{ConnectionSpeed, CredentialsError, UserCredentials};
use tracing::{debug, info, warn};

use crate::servers::{self, ServerList, ServerListEvent};

/// Preference node owning the login preferences
pub const PREFERENCES_NODE: &str = "screen_login";

const OMERO_USER: &str = "omeroUser";
const OMERO_CONNECTION_SPEED: &str = "omeroConnectionSpeed";
const OMERO_TRANSFER_ENCRYPTED: &str = "omeroTransferEncrypted";

const DEFAULT_QUIT_TEXT: &str = "Quit";

/// Text input of the login form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginField {
    Username,
    Password,
}

/// Result of a login request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    /// Username or server missing, nothing happened
    Incomplete,
    /// A login is already in progress or the form is locked
    Busy,
    /// Credentials handed to the connection workflow
    Submitted(UserCredentials),
    /// The server address could not be used
    Rejected(CredentialsError),
}

/// State of the login screen
#[derive(Debug)]
pub struct LoginScreen {
    prefs: Preferences,
    editor: ServerList,
    username: String,
    password: String,
    server: String,
    default_server: Option<String>,
    speed: ConnectionSpeed,
    speed_visible: bool,
    encrypted: bool,
    encryption_configurable: bool,
    server_configurable: bool,
    login_attempt: bool,
    controls_enabled: bool,
    status: String,
    status_visible: bool,
    progress: u32,
    progress_max: u32,
    quit_text: String,
    quit_mnemonic: char,
    args: Vec<String>,
}

impl LoginScreen {
    /// Create the screen from the stored preferences
    ///
    /// The server shown is the most recently used one, i.e. the last
    /// persisted entry.
    pub fn new(store: Arc<dyn PreferenceStore>) -> Self {
        let prefs = Preferences::new(store, PREFERENCES_NODE);
        let editor = ServerList::new(prefs.sibling(servers::PREFERENCES_NODE), None);

        let username = prefs.get(OMERO_USER).unwrap_or_default();
        let speed = match prefs.get(OMERO_CONNECTION_SPEED) {
            None => ConnectionSpeed::default(),
            Some(value) if value.trim().is_empty() => ConnectionSpeed::default(),
            Some(value) => ConnectionSpeed::from_preference(&value).unwrap_or_else(|| {
                warn!("Ignoring stored connection speed {:?}", value);
                ConnectionSpeed::default()
            }),
        };
        let encrypted = prefs.get(OMERO_TRANSFER_ENCRYPTED).as_deref() == Some("true");
        let server = editor
            .persisted_servers()
            .pop()
            .unwrap_or_default();

        debug!(
            "Login screen: user={:?}, server={:?}, speed={}, encrypted={}",
            username, server, speed, encrypted
        );

        Self {
            prefs,
            editor,
            username,
            password: String::new(),
            server,
            default_server: None,
            speed,
            speed_visible: false,
            encrypted,
            encryption_configurable: true,
            server_configurable: true,
            login_attempt: false,
            controls_enabled: true,
            status: String::new(),
            status_visible: false,
            progress: 0,
            progress_max: 0,
            quit_text: DEFAULT_QUIT_TEXT.to_string(),
            quit_mnemonic: 'Q',
            args: Vec::new(),
        }
    }

    /// Extra command-line arguments passed on with the credentials
    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    // ------------------------------------------------------------------
    // Form fields
    // ------------------------------------------------------------------

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn server(&self) -> &str {
        &self.server
    }

    pub fn default_server(&self) -> Option<&str> {
        self.default_server.as_deref()
    }

    pub fn set_username(&mut self, value: &str) {
        if self.controls_enabled {
            self.username = value.to_string();
        }
    }

    pub fn set_password(&mut self, value: &str) {
        if self.controls_enabled {
            self.password = value.to_string();
        }
    }

    /// Mutable access to a text field, `None` while controls are disabled
    pub fn input_mut(&mut self, field: LoginField) -> Option<&mut String> {
        if !self.controls_enabled {
            return None;
        }
        match field {
            LoginField::Username => Some(&mut self.username),
            LoginField::Password => Some(&mut self.password),
        }
    }

    /// Username and server are both filled in
    pub fn can_login(&self) -> bool {
        !self.username.trim().is_empty() && !self.server.trim().is_empty()
    }

    /// The login action is available
    pub fn is_login_enabled(&self) -> bool {
        self.controls_enabled && self.can_login()
    }

    pub fn controls_enabled(&self) -> bool {
        self.controls_enabled
    }

    pub fn set_controls_enabled(&mut self, enabled: bool) {
        self.controls_enabled = enabled;
    }

    pub fn clean_fields(&mut self) {
        self.username.clear();
        self.password.clear();
    }

    pub fn clean_field(&mut self, field: LoginField) {
        match field {
            LoginField::Username => self.username.clear(),
            LoginField::Password => self.password.clear(),
        }
    }

    /// Field that should take the input focus
    ///
    /// The username while it is empty, the password otherwise, and none
    /// while a login attempt is in progress.
    pub fn focus_field(&self) -> Option<LoginField> {
        if self.login_attempt {
            return None;
        }
        if self.username.trim().is_empty() {
            Some(LoginField::Username)
        } else {
            Some(LoginField::Password)
        }
    }

    /// Re-enable the form and return the field to focus
    pub fn request_focus(&mut self) -> Option<LoginField> {
        if self.login_attempt {
            return None;
        }
        self.controls_enabled = true;
        self.focus_field()
    }

    // ------------------------------------------------------------------
    // Login
    // ------------------------------------------------------------------

    /// Submit the form
    ///
    /// On success the username, the encryption choice and the server list
    /// (with this server as most recently used) are persisted and the form
    /// is locked until [`LoginScreen::on_login_failure`].
    pub fn login(&mut self) -> LoginOutcome {
        if self.login_attempt || !self.controls_enabled {
            debug!("Login ignored while the form is locked");
            return LoginOutcome::Busy;
        }
        if !self.can_login() {
            return LoginOutcome::Incomplete;
        }
        let username = self.username.trim().to_string();
        let server = self.server.trim().to_string();
        self.controls_enabled = false;

        let credentials = match UserCredentials::new(&username, &self.password, &server, self.speed)
        {
            Ok(credentials) => credentials
                .with_encrypted(self.encrypted)
                .with_args(self.args.clone()),
            Err(e) => {
                warn!("Cannot log in to {:?}: {}", server, e);
                self.status = format!("There is a problem with the server name or URL: {}", e);
                self.controls_enabled = true;
                return LoginOutcome::Rejected(e);
            }
        };

        self.store(OMERO_USER, &username);
        self.store(
            OMERO_TRANSFER_ENCRYPTED,
            if self.encrypted { "true" } else { "false" },
        );
        if let Err(e) = self.editor.save(&server) {
            warn!("Failed to save server list: {}", e);
        }

        self.login_attempt = true;
        info!("Logging in to {} as {}", credentials.address(), username);
        LoginOutcome::Submitted(credentials)
    }

    pub fn on_login_failure(&mut self) {
        self.login_attempt = false;
        self.controls_enabled = true;
    }

    pub fn has_attempted_to_login(&self) -> bool {
        self.login_attempt
    }

    // ------------------------------------------------------------------
    // Encryption and speed
    // ------------------------------------------------------------------

    pub fn is_encrypted(&self) -> bool {
        self.encrypted
    }

    pub fn is_encryption_configurable(&self) -> bool {
        self.encryption_configurable
    }

    /// Flip transfer encryption, if the user may change it
    pub fn toggle_encryption(&mut self) -> bool {
        if !self.encryption_configurable || !self.controls_enabled {
            return false;
        }
        self.encrypted = !self.encrypted;
        true
    }

    pub fn set_encryption_configuration(&mut self, encrypted: bool, configurable: bool) {
        self.encrypted = encrypted;
        self.encryption_configurable = configurable;
    }

    pub fn connection_speed(&self) -> ConnectionSpeed {
        self.speed
    }

    /// Change and persist the connection speed
    pub fn set_connection_speed(&mut self, speed: ConnectionSpeed) {
        self.speed = speed;
        self.store(OMERO_CONNECTION_SPEED, &speed.index().to_string());
    }

    pub fn cycle_connection_speed(&mut self) {
        self.set_connection_speed(self.speed.next());
    }

    pub fn connection_speed_label(&self) -> &'static str {
        self.speed.label()
    }

    pub fn show_connection_speed(&mut self, visible: bool) {
        self.speed_visible = visible;
    }

    pub fn is_connection_speed_visible(&self) -> bool {
        self.speed_visible
    }

    // ------------------------------------------------------------------
    // Server selection
    // ------------------------------------------------------------------

    pub fn editor(&self) -> &ServerList {
        &self.editor
    }

    pub fn editor_mut(&mut self) -> &mut ServerList {
        &mut self.editor
    }

    pub fn is_server_configurable(&self) -> bool {
        self.server_configurable
    }

    /// Install the server offered by the deployment
    ///
    /// When the server is configurable the host is added to the editor
    /// unless the user already has it; otherwise it replaces the server
    /// shown. Users with fewer than two persisted servers are switched to
    /// the default.
    pub fn set_default_host_configuration(&mut self, host: &str, configurable: bool) {
        self.server_configurable = configurable;
        let host = host.trim();
        if host.is_empty() {
            self.default_server = None;
            return;
        }
        self.default_server = Some(host.to_string());

        if configurable {
            if !self.editor.persisted_servers().iter().any(|s| s == host) {
                self.editor.add_row(host);
            }
        } else {
            self.server = host.to_string();
        }

        if self.editor.persisted_servers().len() < 2 {
            self.set_new_server("");
        }
    }

    /// Prepare the server editor for display
    ///
    /// Returns false when the server may not be changed.
    pub fn open_server_editor(&mut self) -> bool {
        if !self.server_configurable {
            return false;
        }
        if self.editor.row_count() == 0 {
            if let Some(default) = self.default_server.clone() {
                self.editor.add_row(&default);
            }
        }
        let current = self.server.clone();
        self.editor.set_focus(&current);
        true
    }

    /// Use the server picked in the editor
    ///
    /// A blank name falls back to the default server.
    pub fn apply_server(&mut self, name: &str) {
        let name = name.trim();
        if !name.is_empty() && name == self.server.trim() {
            return;
        }
        self.set_new_server(name);
    }

    /// Follow a removal in the editor
    ///
    /// Removing the server currently shown switches to the editor's new
    /// selection.
    pub fn on_server_removed(&mut self, event: &ServerListEvent) {
        if let ServerListEvent::Removed {
            removed, selected, ..
        } = event
        {
            self.request_focus();
            if self.server.trim() == removed {
                let next = selected.clone().unwrap_or_default();
                self.set_new_server(&next);
            }
        }
    }

    /// Remove the editor's selected row and follow the change
    pub fn remove_selected_server(&mut self) -> Option<ServerListEvent> {
        let event = self.editor.remove_selected()?;
        self.on_server_removed(&event);
        Some(event)
    }

    fn set_new_server(&mut self, name: &str) {
        let name = name.trim();
        self.server = if name.is_empty() {
            self.default_server.clone().unwrap_or_default()
        } else {
            name.to_string()
        };
        debug!("Server set to {:?}", self.server);
    }

    // ------------------------------------------------------------------
    // Status and quit button
    // ------------------------------------------------------------------

    pub fn quit_button_text(&self) -> &str {
        &self.quit_text
    }

    pub fn quit_button_mnemonic(&self) -> char {
        self.quit_mnemonic
    }

    /// Relabel the quit button; blank text is ignored
    pub fn set_quit_button_text(&mut self, text: &str) {
        let text = text.trim();
        let Some(first) = text.chars().next() else {
            return;
        };
        if text == self.quit_text {
            return;
        }
        self.quit_text = text.to_string();
        self.quit_mnemonic = first.to_uppercase().next().unwrap_or(first);
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    /// Current progress as `(value, maximum)`
    pub fn progress(&self) -> (u32, u32) {
        (self.progress, self.progress_max)
    }

    pub fn is_status_visible(&self) -> bool {
        self.status_visible
    }

    pub fn init_progress(&mut self, max_tasks: u32) {
        self.progress_max = max_tasks;
        self.progress = 0;
    }

    pub fn set_status(&mut self, text: &str, percent: u32) {
        self.status = text.to_string();
        self.progress = percent;
    }

    pub fn set_status_visible(&mut self, visible: bool, request_focus: bool) {
        self.status_visible = visible;
        if request_focus {
            self.request_focus();
        }
    }

    fn store(&self, key: &str, value: &str) {
        if let Err(e) = self.prefs.put(key, value) {
            warn!("Failed to store {}: {}", key, e);
        }
    }
}
