//! TUI application state
//!
//! Wraps the [`LoginScreen`] model with what only the terminal needs:
//! which field has the cursor, which dialog is open and how the last
//! connection attempt went.

use model::UserCredentials;

use crate::connect::Session;
use crate::login::{LoginField, LoginOutcome, LoginScreen};
use crate::servers::ServerListEvent;

/// Connection attempt status
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionStatus {
    /// No attempt yet
    Idle,
    /// Attempt in progress
    Connecting,
    /// Server reachable
    Connected(Session),
    /// Attempt failed
    Failed(String),
}

/// Input mode for the application
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputMode {
    /// Typing in the login form
    Normal,
    /// Server editor list
    ServerEditor,
    /// Adding a server (input dialog over the editor)
    AddServer { input: String },
    /// Renaming a server (input dialog over the editor)
    EditServer { index: usize, input: String },
    /// Showing help overlay
    Help,
    /// Confirm quit dialog
    ConfirmQuit,
}

/// User action to be processed by the main loop
#[derive(Debug, Clone)]
pub enum AppAction {
    /// No action
    None,
    /// Quit the application
    Quit,
    /// Start the connection workflow
    Login(UserCredentials),
}

/// Main application state
pub struct App {
    /// Login form model
    pub login: LoginScreen,
    /// Field receiving typed characters
    pub focus: LoginField,
    /// Current input mode
    pub input_mode: InputMode,
    /// Outcome of the last login
    pub connection: ConnectionStatus,
    /// Status message to display
    pub status_message: Option<String>,
    /// Should quit flag
    pub should_quit: bool,
}

impl App {
    /// Create a new application state
    pub fn new(login: LoginScreen) -> Self {
        let focus = login.focus_field().unwrap_or(LoginField::Username);
        Self {
            login,
            focus,
            input_mode: InputMode::Normal,
            connection: ConnectionStatus::Idle,
            status_message: None,
            should_quit: false,
        }
    }

    // ------------------------------------------------------------------
    // Login form
    // ------------------------------------------------------------------

    /// Type a character into the focused field
    pub fn handle_char(&mut self, c: char) {
        if let Some(field) = self.login.input_mut(self.focus) {
            field.push(c);
        }
    }

    pub fn handle_backspace(&mut self) {
        if let Some(field) = self.login.input_mut(self.focus) {
            field.pop();
        }
    }

    /// Move the cursor to the other text field
    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            LoginField::Username => LoginField::Password,
            LoginField::Password => LoginField::Username,
        };
    }

    /// Submit the login form
    pub fn submit(&mut self) -> AppAction {
        if self.connection == ConnectionStatus::Connecting {
            return AppAction::None;
        }
        match self.login.login() {
            LoginOutcome::Busy => AppAction::None,
            LoginOutcome::Incomplete => {
                if let Some(field) = self.login.focus_field() {
                    self.focus = field;
                }
                self.set_status("Enter a username and choose a server".to_string());
                AppAction::None
            }
            LoginOutcome::Rejected(e) => {
                self.set_status(format!("There is a problem with the server name or URL: {}", e));
                AppAction::None
            }
            LoginOutcome::Submitted(credentials) => {
                self.connection = ConnectionStatus::Connecting;
                self.login.set_status_visible(true, false);
                self.login
                    .set_status(&format!("Connecting to {}...", credentials.address()), 0);
                self.set_status(format!("Connecting to {}...", credentials.hostname()));
                AppAction::Login(credentials)
            }
        }
    }

    /// The connection workflow succeeded
    pub fn on_connected(&mut self, session: Session) {
        self.login
            .editor_mut()
            .set_active_server(Some(&session.server));
        self.login.set_status(&format!("Connected to {}", session.server), 100);
        self.set_status(format!("Connected: {}", session));
        self.connection = ConnectionStatus::Connected(session);
    }

    /// The connection workflow failed; the form is unlocked again
    pub fn on_connect_failed(&mut self, error: String) {
        self.login.on_login_failure();
        self.login.set_status_visible(false, false);
        if let Some(field) = self.login.request_focus() {
            self.focus = field;
        }
        self.set_status(format!("Login failed: {}", error));
        self.connection = ConnectionStatus::Failed(error);
    }

    pub fn toggle_encryption(&mut self) {
        if self.login.toggle_encryption() {
            let state = if self.login.is_encrypted() { "on" } else { "off" };
            self.set_status(format!("Transfer encryption {}", state));
        } else {
            self.set_status("Transfer encryption cannot be changed".to_string());
        }
    }

    pub fn cycle_connection_speed(&mut self) {
        if !self.login.is_connection_speed_visible() || !self.login.controls_enabled() {
            return;
        }
        self.login.cycle_connection_speed();
        self.set_status(format!(
            "Connection speed:{}",
            self.login.connection_speed_label()
        ));
    }

    // ------------------------------------------------------------------
    // Server editor
    // ------------------------------------------------------------------

    /// Open the server editor dialog
    pub fn open_server_editor(&mut self) {
        if !self.login.controls_enabled() {
            return;
        }
        if self.login.open_server_editor() {
            self.input_mode = InputMode::ServerEditor;
        } else {
            self.set_status("The server cannot be changed".to_string());
        }
    }

    pub fn editor_navigate_up(&mut self) {
        let editor = self.login.editor_mut();
        match editor.selected_index() {
            Some(index) if index > 0 => {
                editor.select(index - 1);
            }
            None if !editor.is_empty() => {
                editor.select(0);
            }
            _ => {}
        }
    }

    pub fn editor_navigate_down(&mut self) {
        let editor = self.login.editor_mut();
        let next = editor.selected_index().map_or(0, |index| index + 1);
        editor.select(next);
    }

    /// Use the selected server and close the editor
    pub fn apply_selected_server(&mut self) {
        let selected = self
            .login
            .editor()
            .selected_server()
            .unwrap_or_default()
            .to_string();
        self.login.apply_server(&selected);
        self.input_mode = InputMode::Normal;
    }

    /// Remove the selected server
    pub fn remove_selected_server(&mut self) {
        if let Some(ServerListEvent::Removed { removed, .. }) = self.login.remove_selected_server() {
            self.set_status(format!("Removed server {}", removed));
        }
    }

    /// Handle 'a' key in the editor (add server)
    pub fn start_add_server(&mut self) {
        self.input_mode = InputMode::AddServer {
            input: String::new(),
        };
    }

    /// Handle 'e' key in the editor (rename selected server)
    pub fn start_edit_server(&mut self) {
        let editor = self.login.editor();
        if let (Some(index), Some(name)) = (editor.selected_index(), editor.selected_server()) {
            self.input_mode = InputMode::EditServer {
                index,
                input: name.to_string(),
            };
        }
    }

    /// Handle input in a server dialog
    pub fn handle_dialog_input(&mut self, c: char) {
        match &mut self.input_mode {
            InputMode::AddServer { input } | InputMode::EditServer { input, .. } => input.push(c),
            _ => {}
        }
    }

    /// Handle backspace in a server dialog
    pub fn handle_dialog_backspace(&mut self) {
        match &mut self.input_mode {
            InputMode::AddServer { input } | InputMode::EditServer { input, .. } => {
                input.pop();
            }
            _ => {}
        }
    }

    /// Confirm the server dialog and return to the editor
    pub fn confirm_dialog(&mut self) {
        let mode = std::mem::replace(&mut self.input_mode, InputMode::ServerEditor);
        let changed = match mode {
            InputMode::AddServer { input } => self.login.editor_mut().add(&input).is_some(),
            InputMode::EditServer { index, input } => {
                self.login.editor_mut().edit(index, &input).is_some()
            }
            other => {
                self.input_mode = other;
                return;
            }
        };
        if !changed {
            self.set_status("Server name not accepted".to_string());
        }
    }

    /// Cancel current input mode
    pub fn cancel_input(&mut self) {
        self.input_mode = match self.input_mode {
            InputMode::AddServer { .. } | InputMode::EditServer { .. } => InputMode::ServerEditor,
            _ => InputMode::Normal,
        };
    }

    // ------------------------------------------------------------------
    // Dialogs and status
    // ------------------------------------------------------------------

    /// Show help overlay
    pub fn show_help(&mut self) {
        self.input_mode = InputMode::Help;
    }

    /// Show quit confirmation
    pub fn show_quit_confirm(&mut self) {
        self.input_mode = InputMode::ConfirmQuit;
    }

    /// Confirm quit
    pub fn confirm_quit(&mut self) {
        self.should_quit = true;
    }

    /// Set status message
    pub fn set_status(&mut self, message: String) {
        self.status_message = Some(message);
    }
}
