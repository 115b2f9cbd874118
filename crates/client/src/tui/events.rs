//! TUI event handling
//!
//! Handles keyboard input using crossterm and dispatches actions to the application.

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use std::time::Duration;

use super::app::{App, AppAction, InputMode};

/// Event handler for TUI input
pub struct EventHandler {
    /// Tick rate for polling events
    tick_rate: Duration,
}

impl Default for EventHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl EventHandler {
    /// Create a new event handler
    pub fn new() -> Self {
        Self {
            tick_rate: Duration::from_millis(100),
        }
    }

    /// Create event handler with custom tick rate
    pub fn with_tick_rate(tick_rate: Duration) -> Self {
        Self { tick_rate }
    }

    /// Poll for next event
    ///
    /// Returns Some(Event) if an event occurred, None if tick timeout elapsed.
    pub fn poll(&self) -> Result<Option<Event>> {
        if event::poll(self.tick_rate)? {
            Ok(Some(event::read()?))
        } else {
            Ok(None)
        }
    }

    /// Handle a key event and return the resulting action
    pub fn handle_key(&self, app: &mut App, key: KeyEvent) -> AppAction {
        // Ctrl+C quits from anywhere
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return AppAction::Quit;
        }

        match &app.input_mode {
            InputMode::Normal => self.handle_normal_mode(app, key),
            InputMode::ServerEditor => self.handle_server_editor_mode(app, key),
            InputMode::AddServer { .. } | InputMode::EditServer { .. } => {
                self.handle_server_dialog_mode(app, key)
            }
            InputMode::Help => self.handle_help_mode(app, key),
            InputMode::ConfirmQuit => self.handle_confirm_quit_mode(app, key),
        }
    }

    /// Handle key events on the login form
    ///
    /// Printable characters go to the focused field, so commands use
    /// control keys.
    fn handle_normal_mode(&self, app: &mut App, key: KeyEvent) -> AppAction {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let alt = key.modifiers.contains(KeyModifiers::ALT);

        match key.code {
            KeyCode::Esc => {
                app.show_quit_confirm();
                AppAction::None
            }
            // Quit button mnemonic
            KeyCode::Char(c)
                if alt && c.to_uppercase().eq(std::iter::once(app.login.quit_button_mnemonic())) =>
            {
                app.show_quit_confirm();
                AppAction::None
            }
            KeyCode::F(1) => {
                app.show_help();
                AppAction::None
            }

            // Field navigation
            KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => {
                app.toggle_focus();
                AppAction::None
            }

            // Actions
            KeyCode::Enter => app.submit(),
            KeyCode::Char('s') if ctrl => {
                app.open_server_editor();
                AppAction::None
            }
            KeyCode::Char('e') if ctrl => {
                app.toggle_encryption();
                AppAction::None
            }
            KeyCode::Char('t') if ctrl => {
                app.cycle_connection_speed();
                AppAction::None
            }

            // Text input
            KeyCode::Backspace => {
                app.handle_backspace();
                AppAction::None
            }
            KeyCode::Char(c) if !ctrl && !alt => {
                app.handle_char(c);
                AppAction::None
            }
            _ => AppAction::None,
        }
    }

    /// Handle key events in the server editor list
    fn handle_server_editor_mode(&self, app: &mut App, key: KeyEvent) -> AppAction {
        match key.code {
            KeyCode::Esc => app.cancel_input(),
            KeyCode::Up | KeyCode::Char('k') => app.editor_navigate_up(),
            KeyCode::Down | KeyCode::Char('j') => app.editor_navigate_down(),
            KeyCode::Enter => app.apply_selected_server(),
            KeyCode::Char('a') => app.start_add_server(),
            KeyCode::Char('e') => app.start_edit_server(),
            KeyCode::Char('d') | KeyCode::Delete => app.remove_selected_server(),
            _ => {}
        }
        AppAction::None
    }

    /// Handle key events in the add/edit server dialog
    fn handle_server_dialog_mode(&self, app: &mut App, key: KeyEvent) -> AppAction {
        match key.code {
            KeyCode::Esc => app.cancel_input(),
            KeyCode::Enter => app.confirm_dialog(),
            KeyCode::Backspace => app.handle_dialog_backspace(),
            KeyCode::Char(c) if !c.is_control() && !c.is_whitespace() => {
                app.handle_dialog_input(c)
            }
            _ => {}
        }
        AppAction::None
    }

    /// Handle key events in help overlay mode
    fn handle_help_mode(&self, app: &mut App, key: KeyEvent) -> AppAction {
        match key.code {
            KeyCode::Esc | KeyCode::F(1) | KeyCode::Enter | KeyCode::Char('q') => {
                app.cancel_input();
                AppAction::None
            }
            _ => AppAction::None,
        }
    }

    /// Handle key events in quit confirmation mode
    fn handle_confirm_quit_mode(&self, app: &mut App, key: KeyEvent) -> AppAction {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                app.confirm_quit();
                AppAction::Quit
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                app.cancel_input();
                AppAction::None
            }
            _ => AppAction::None,
        }
    }
}

/// Async event handler for use with tokio
pub struct AsyncEventHandler {
    /// Inner synchronous handler
    inner: EventHandler,
}

impl Default for AsyncEventHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl AsyncEventHandler {
    /// Create a new async event handler
    pub fn new() -> Self {
        Self {
            inner: EventHandler::new(),
        }
    }

    /// Create async event handler with custom tick rate
    pub fn with_tick_rate(tick_rate: Duration) -> Self {
        Self {
            inner: EventHandler::with_tick_rate(tick_rate),
        }
    }

    /// Poll for next event asynchronously
    ///
    /// This wraps the blocking poll in a spawn_blocking to avoid
    /// blocking the tokio runtime.
    pub async fn poll(&self) -> Result<Option<Event>> {
        let tick_rate = self.inner.tick_rate;

        tokio::task::spawn_blocking(move || {
            if event::poll(tick_rate)? {
                Ok(Some(event::read()?))
            } else {
                Ok(None)
            }
        })
        .await?
    }

    /// Handle a key event and return the resulting action
    pub fn handle_key(&self, app: &mut App, key: KeyEvent) -> AppAction {
        self.inner.handle_key(app, key)
    }
}
