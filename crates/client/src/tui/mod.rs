//! Terminal User Interface
//!
//! Provides the interactive login screen.
//!
//! # Layout
//!
//! - **Top Panel**: Status bar showing the connection state and last message
//! - **Center Panel**: Login form (server, username, password, transfer
//!   encryption, login and quit buttons, progress)
//! - **Bottom Panel**: Help bar with context-sensitive keybindings
//!
//! The server editor, help and quit confirmation open as dialogs over the
//! form.
//!
//! # Keybindings
//!
//! - `Tab`: Switch between username and password
//! - `Enter`: Log in
//! - `Ctrl+S`: Open the server editor (`a` add, `e` edit, `d` remove)
//! - `Ctrl+E`: Toggle transfer encryption
//! - `Ctrl+T`: Change connection speed
//! - `Esc`: Quit (with confirmation)
//! - `F1`: Show help

pub mod app;
pub mod events;
pub mod ui;

use anyhow::{Context, Result};
use crossterm::{
    event::Event,
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use model::UserCredentials;
use ratatui::{Terminal, backend::CrosstermBackend};
use std::io::{self, Stdout};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::config::ClientConfig;
use crate::connect::{Connector, Session};
use crate::login::LoginScreen;

pub use app::{App, AppAction, ConnectionStatus, InputMode};
pub use events::{AsyncEventHandler, EventHandler};

/// Messages sent from async tasks to the TUI
#[derive(Debug)]
pub enum TuiMessage {
    /// Connection workflow finished
    Connected(Session),
    /// Connection workflow failed
    ConnectionFailed(String),
}

/// Apply the `[login]` settings to a login screen
pub fn configure_login(login: &mut LoginScreen, config: &ClientConfig) {
    let settings = &config.login;
    login.set_default_host_configuration(
        settings.default_server.as_deref().unwrap_or_default(),
        settings.server_configurable,
    );
    let encrypted = settings.encrypted.unwrap_or(login.is_encrypted());
    login.set_encryption_configuration(encrypted, settings.encryption_configurable);
    login.show_connection_speed(settings.show_connection_speed);
    if let Some(text) = settings.quit_button_text.as_deref() {
        login.set_quit_button_text(text);
    }
}

/// Apply the `[login]` settings, then the server picked on the command line
///
/// The command-line server is ignored when the server may not be changed.
pub fn prepare_login(login: &mut LoginScreen, config: &ClientConfig, server: Option<&str>) {
    configure_login(login, config);
    let Some(server) = server else {
        return;
    };
    if login.is_server_configurable() {
        login.apply_server(server);
    } else {
        warn!("Server is fixed by the configuration, ignoring {:?}", server);
    }
}

/// TUI runner that manages the terminal and event loop
pub struct TuiRunner<C: Connector> {
    /// Terminal instance
    terminal: Terminal<CrosstermBackend<Stdout>>,
    /// Application state
    app: App,
    /// Event handler
    event_handler: AsyncEventHandler,
    /// Downstream connection workflow
    connector: C,
    /// Channel for receiving messages from async tasks
    message_rx: mpsc::Receiver<TuiMessage>,
    /// Channel for sending messages from async tasks
    message_tx: mpsc::Sender<TuiMessage>,
}

impl<C: Connector> TuiRunner<C> {
    /// Create a new TUI runner
    pub fn new(login: LoginScreen, connector: C) -> Result<Self> {
        // Setup terminal
        enable_raw_mode().context("Failed to enable raw mode")?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen).context("Failed to enter alternate screen")?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend).context("Failed to create terminal")?;

        // Create message channel
        let (message_tx, message_rx) = mpsc::channel(100);

        Ok(Self {
            terminal,
            app: App::new(login),
            event_handler: AsyncEventHandler::new(),
            connector,
            message_rx,
            message_tx,
        })
    }

    /// Run the TUI main loop
    ///
    /// Returns the session if the user logged in before quitting.
    pub async fn run(&mut self) -> Result<Option<Session>> {
        info!("Starting TUI");

        // Initial render
        self.terminal.draw(|f| ui::render(f, &self.app))?;

        loop {
            // Process any pending messages from async tasks
            while let Ok(msg) = self.message_rx.try_recv() {
                self.handle_message(msg);
            }

            // Poll for terminal events
            if let Some(event) = self.event_handler.poll().await? {
                let action = match event {
                    Event::Key(key) => self.event_handler.handle_key(&mut self.app, key),
                    Event::Resize(_, _) => {
                        // Terminal will re-render on next draw
                        AppAction::None
                    }
                    _ => AppAction::None,
                };

                self.handle_action(action);
            }

            if self.app.should_quit {
                break;
            }

            self.terminal.draw(|f| ui::render(f, &self.app))?;
        }

        info!("TUI shutting down");
        Ok(match &self.app.connection {
            ConnectionStatus::Connected(session) => Some(session.clone()),
            _ => None,
        })
    }

    /// Handle TUI message from async task
    fn handle_message(&mut self, msg: TuiMessage) {
        match msg {
            TuiMessage::Connected(session) => {
                info!("Logged in: {}", session);
                self.app.on_connected(session);
            }
            TuiMessage::ConnectionFailed(error) => {
                warn!("Login failed: {}", error);
                self.app.on_connect_failed(error);
            }
        }
    }

    /// Handle an application action
    fn handle_action(&mut self, action: AppAction) {
        match action {
            AppAction::None => {}
            AppAction::Quit => {
                self.app.should_quit = true;
            }
            AppAction::Login(credentials) => {
                self.spawn_connect(credentials);
            }
        }
    }

    /// Spawn async task running the connection workflow
    fn spawn_connect(&self, credentials: UserCredentials) {
        let connector = self.connector.clone();
        let tx = self.message_tx.clone();

        tokio::spawn(async move {
            match connector.connect(credentials).await {
                Ok(session) => {
                    let _ = tx.send(TuiMessage::Connected(session)).await;
                }
                Err(e) => {
                    let _ = tx
                        .send(TuiMessage::ConnectionFailed(format!("{:#}", e)))
                        .await;
                }
            }
        });
    }
}

impl<C: Connector> Drop for TuiRunner<C> {
    fn drop(&mut self) {
        // Restore terminal state
        let _ = disable_raw_mode();
        let _ = execute!(self.terminal.backend_mut(), LeaveAlternateScreen);
        let _ = self.terminal.show_cursor();
    }
}

/// Run the TUI application
///
/// This is the main entry point for TUI mode. It creates a TuiRunner
/// and runs the main event loop. The login screen should already have been
/// through [`prepare_login`].
///
/// # Example
/// ```no_run
/// use std::sync::Arc;
/// use client::config::ClientConfig;
/// use client::connect::TcpConnector;
/// use client::login::LoginScreen;
/// use client::tui::{prepare_login, run};
/// use common::MemoryPreferences;
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let mut login = LoginScreen::new(Arc::new(MemoryPreferences::new()));
///     prepare_login(&mut login, &ClientConfig::default(), Some("omero.example.org"));
///     run(login, TcpConnector::default()).await?;
///     Ok(())
/// }
/// ```
pub async fn run<C: Connector>(login: LoginScreen, connector: C) -> Result<Option<Session>> {
    let mut runner = TuiRunner::new(login, connector)?;
    runner.run().await
}
