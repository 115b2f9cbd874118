//! TUI rendering with ratatui
//!
//! Renders the terminal user interface using ratatui widgets and layouts.

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Gauge, List, ListItem, ListState, Paragraph, Wrap},
};

use super::app::{App, ConnectionStatus, InputMode};
use crate::login::LoginField;

/// Colors used in the UI
mod colors {
    use ratatui::style::Color;

    pub const CONNECTED: Color = Color::Green;
    pub const CONNECTING: Color = Color::Yellow;
    pub const FAILED: Color = Color::Red;

    pub const ENCRYPTED: Color = Color::Green;
    pub const UNENCRYPTED: Color = Color::Gray;
    pub const DISABLED: Color = Color::DarkGray;

    pub const ACTIVE_BORDER: Color = Color::Cyan;
    pub const INACTIVE_BORDER: Color = Color::Gray;

    pub const HIGHLIGHT_BG: Color = Color::DarkGray;
    pub const STATUS_BAR_BG: Color = Color::Blue;
    pub const HELP_BAR_BG: Color = Color::DarkGray;
}

/// Render the complete UI
pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Status bar
            Constraint::Min(12),   // Login form
            Constraint::Length(1), // Help bar
        ])
        .split(frame.area());

    render_status_bar(frame, app, chunks[0]);
    render_login_form(frame, app, chunks[1]);
    render_help_bar(frame, app, chunks[2]);

    // Render overlays based on input mode
    match &app.input_mode {
        InputMode::ServerEditor => {
            render_server_editor(frame, app);
        }
        InputMode::AddServer { input } => {
            render_server_editor(frame, app);
            render_server_dialog(frame, " Add Server ", input);
        }
        InputMode::EditServer { input, .. } => {
            render_server_editor(frame, app);
            render_server_dialog(frame, " Edit Server ", input);
        }
        InputMode::Help => {
            render_help_overlay(frame);
        }
        InputMode::ConfirmQuit => {
            render_quit_dialog(frame, app);
        }
        InputMode::Normal => {}
    }
}

/// Render the top status bar
fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let (state, state_color) = match &app.connection {
        ConnectionStatus::Idle => ("Not connected".to_string(), Color::White),
        ConnectionStatus::Connecting => ("Connecting".to_string(), colors::CONNECTING),
        ConnectionStatus::Connected(session) => {
            (format!("Connected to {}", session.server), colors::CONNECTED)
        }
        ConnectionStatus::Failed(_) => ("Login failed".to_string(), colors::FAILED),
    };

    let status_message = app
        .status_message
        .as_ref()
        .map(|m| format!(" | {}", m))
        .unwrap_or_default();

    let paragraph = Paragraph::new(Line::from(vec![
        Span::styled(format!(" {}", state), Style::default().fg(state_color)),
        Span::styled(status_message, Style::default().fg(Color::Yellow)),
    ]))
    .style(Style::default().bg(colors::STATUS_BAR_BG))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title(" OMERO.insight ")
            .title_style(Style::default().add_modifier(Modifier::BOLD)),
    );

    frame.render_widget(paragraph, area);
}

/// Render the login form
fn render_login_form(frame: &mut Frame, app: &App, area: Rect) {
    let area = centered_rect(60, 90, area);
    let login = &app.login;

    let block = Block::default()
        .title(" Login ")
        .title_style(Style::default().add_modifier(Modifier::BOLD))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(colors::ACTIVE_BORDER));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(1), // Server
            Constraint::Length(3), // Username
            Constraint::Length(3), // Password
            Constraint::Length(1), // Options
            Constraint::Length(1), // Buttons
            Constraint::Length(1), // Progress
            Constraint::Min(0),
        ])
        .split(inner);

    // Server line, with the connection speed when shown
    let server = if login.server().is_empty() {
        "<no server>".to_string()
    } else {
        login.server().to_string()
    };
    let mut server_spans = vec![
        Span::styled("Server: ", Style::default().fg(Color::Gray)),
        Span::styled(server, Style::default().add_modifier(Modifier::BOLD)),
    ];
    if login.is_connection_speed_visible() {
        server_spans.push(Span::styled(
            login.connection_speed_label(),
            Style::default().fg(Color::Gray),
        ));
    }
    frame.render_widget(Paragraph::new(Line::from(server_spans)), chunks[0]);

    let masked: String = "*".repeat(login.password().chars().count());
    render_input(
        frame,
        "Username",
        login.username(),
        app.focus == LoginField::Username && app.input_mode == InputMode::Normal,
        login.controls_enabled(),
        chunks[1],
    );
    render_input(
        frame,
        "Password",
        &masked,
        app.focus == LoginField::Password && app.input_mode == InputMode::Normal,
        login.controls_enabled(),
        chunks[2],
    );

    let (lock, lock_color) = if login.is_encrypted() {
        ("[encrypted]", colors::ENCRYPTED)
    } else {
        ("[unencrypted]", colors::UNENCRYPTED)
    };
    let lock_style = if login.is_encryption_configurable() {
        Style::default().fg(lock_color)
    } else {
        Style::default().fg(colors::DISABLED)
    };
    frame.render_widget(
        Paragraph::new(Line::from(vec![
            Span::styled("Transfer: ", Style::default().fg(Color::Gray)),
            Span::styled(lock, lock_style),
        ])),
        chunks[3],
    );

    let login_style = if login.is_login_enabled() {
        Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(colors::DISABLED)
    };
    frame.render_widget(
        Paragraph::new(Line::from(vec![
            Span::styled("[ Login ]", login_style),
            Span::raw("  "),
            Span::styled(
                format!("[ {} ]", login.quit_button_text()),
                Style::default().fg(Color::Red),
            ),
        ]))
        .alignment(Alignment::Center),
        chunks[4],
    );

    if login.is_status_visible() {
        let (value, max) = login.progress();
        let ratio = if max == 0 {
            (value.min(100) as f64) / 100.0
        } else {
            (value.min(max) as f64) / (max as f64)
        };
        let gauge = Gauge::default()
            .gauge_style(Style::default().fg(colors::CONNECTING))
            .label(login.status().to_string())
            .ratio(ratio);
        frame.render_widget(gauge, chunks[5]);
    }
}

fn render_input(
    frame: &mut Frame,
    title: &str,
    value: &str,
    focused: bool,
    enabled: bool,
    area: Rect,
) {
    let border_color = if focused {
        colors::ACTIVE_BORDER
    } else {
        colors::INACTIVE_BORDER
    };
    let text = if focused {
        format!("{}_", value) // Show cursor
    } else {
        value.to_string()
    };
    let text_color = if enabled { Color::White } else { colors::DISABLED };

    let widget = Paragraph::new(text)
        .style(Style::default().fg(text_color))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" {} ", title))
                .border_style(Style::default().fg(border_color)),
        );
    frame.render_widget(widget, area);
}

/// Render the server editor dialog
fn render_server_editor(frame: &mut Frame, app: &App) {
    let area = centered_rect(60, 60, frame.area());
    frame.render_widget(Clear, area);

    let editor = app.login.editor();
    let items: Vec<ListItem> = editor
        .entries()
        .iter()
        .map(|name| {
            let active = editor.active_server() == Some(name.as_str());
            let (icon, color) = if active {
                ("[*]", colors::CONNECTED)
            } else {
                ("[ ]", Color::White)
            };
            ListItem::new(Line::from(vec![
                Span::styled(format!("{} ", icon), Style::default().fg(color)),
                Span::raw(name.clone()),
            ]))
        })
        .collect();

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(colors::ACTIVE_BORDER))
                .title(" Servers ")
                .title_style(
                    Style::default()
                        .fg(colors::ACTIVE_BORDER)
                        .add_modifier(Modifier::BOLD),
                ),
        )
        .highlight_style(
            Style::default()
                .bg(colors::HIGHLIGHT_BG)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    let mut state = ListState::default();
    state.select(editor.selected_index());

    frame.render_stateful_widget(list, area, &mut state);
}

/// Render the bottom help bar
fn render_help_bar(frame: &mut Frame, app: &App, area: Rect) {
    let help_text = match &app.input_mode {
        InputMode::Normal => {
            "Tab: Field | Enter: Login | ^S: Servers | ^E: Encryption | ^T: Speed | Esc: Quit | F1: Help"
        }
        InputMode::ServerEditor => {
            "j/k: Navigate | Enter: Use server | a: Add | e: Edit | d: Remove | Esc: Close"
        }
        InputMode::AddServer { .. } | InputMode::EditServer { .. } => "Enter: Confirm | Esc: Cancel",
        InputMode::Help => "Press Esc to close",
        InputMode::ConfirmQuit => "y: Quit | n: Cancel",
    };

    let paragraph = Paragraph::new(help_text)
        .style(Style::default().fg(Color::White).bg(colors::HELP_BAR_BG))
        .alignment(Alignment::Center);

    frame.render_widget(paragraph, area);
}

/// Render the add/edit server dialog
fn render_server_dialog(frame: &mut Frame, title: &str, input: &str) {
    let area = centered_rect(60, 20, frame.area());

    // Clear the area first
    frame.render_widget(Clear, area);

    let block = Block::default()
        .title(title.to_string())
        .title_style(Style::default().add_modifier(Modifier::BOLD))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(colors::ACTIVE_BORDER));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(2), // Label
            Constraint::Length(3), // Input
            Constraint::Min(0),    // Spacing
        ])
        .split(inner);

    let label = Paragraph::new("Server address (host, host:port or URL):")
        .style(Style::default().fg(Color::White));
    frame.render_widget(label, chunks[0]);

    let input_text = format!("{}_", input); // Show cursor
    let input_widget = Paragraph::new(input_text)
        .style(Style::default().fg(Color::Cyan))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray)),
        );
    frame.render_widget(input_widget, chunks[1]);
}

/// Render the help overlay
fn render_help_overlay(frame: &mut Frame) {
    let area = centered_rect(70, 70, frame.area());

    // Clear the area first
    frame.render_widget(Clear, area);

    let help_text = Text::from(vec![
        Line::from(Span::styled(
            "Connection Info",
            Style::default()
                .add_modifier(Modifier::BOLD)
                .add_modifier(Modifier::UNDERLINED),
        )),
        Line::from(""),
        Line::from("Username or session ID can be used to connect."),
        Line::from("Do not enter a password if a session ID is entered."),
        Line::from(""),
        Line::from(Span::styled(
            "Login Form",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from("  Tab          Switch between username and password"),
        Line::from("  Enter        Log in"),
        Line::from("  Ctrl+S       Choose or edit servers"),
        Line::from("  Ctrl+E       Toggle transfer encryption"),
        Line::from("  Ctrl+T       Change connection speed"),
        Line::from(""),
        Line::from(Span::styled(
            "Server Editor",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from("  Up / k       Move selection up"),
        Line::from("  Down / j     Move selection down"),
        Line::from("  Enter        Use selected server"),
        Line::from("  a / e / d    Add, edit or remove a server"),
        Line::from(""),
        Line::from(Span::styled(
            "General",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from("  F1           Show this help"),
        Line::from("  Esc          Quit (with confirmation)"),
        Line::from("  Ctrl+C       Quit immediately"),
    ]);

    let paragraph = Paragraph::new(help_text)
        .block(
            Block::default()
                .title(" Help ")
                .title_style(Style::default().add_modifier(Modifier::BOLD))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(colors::ACTIVE_BORDER)),
        )
        .wrap(Wrap { trim: false })
        .alignment(Alignment::Left);

    frame.render_widget(paragraph, area);
}

/// Render the quit confirmation dialog
fn render_quit_dialog(frame: &mut Frame, app: &App) {
    let area = centered_rect(40, 15, frame.area());

    // Clear the area first
    frame.render_widget(Clear, area);

    let text = Text::from(vec![
        Line::from(""),
        Line::from(Span::styled(
            "Are you sure you want to quit?",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("  [Y]es  ", Style::default().fg(Color::Green)),
            Span::styled("  [N]o  ", Style::default().fg(Color::Red)),
        ]),
    ]);

    let paragraph = Paragraph::new(text)
        .block(
            Block::default()
                .title(format!(" {} ", app.login.quit_button_text()))
                .title_style(Style::default().add_modifier(Modifier::BOLD))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Yellow)),
        )
        .alignment(Alignment::Center);

    frame.render_widget(paragraph, area);
}

/// Create a centered rectangle
fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::login::LoginScreen;
    use common::test_utils::memory_preferences;
    use ratatui::{Terminal, backend::TestBackend};

    fn buffer_text(terminal: &Terminal<TestBackend>) -> String {
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn test_centered_rect() {
        let area = Rect::new(0, 0, 100, 50);
        let centered = centered_rect(50, 50, area);

        // Should be centered
        assert!(centered.x > 0);
        assert!(centered.y > 0);
        assert!(centered.x + centered.width < area.width);
        assert!(centered.y + centered.height < area.height);
    }

    #[test]
    fn test_render_masks_password() {
        let store = memory_preferences(&[("server_editor", "omeroServer", "omero.example.org")]);
        let mut app = App::new(LoginScreen::new(store));
        app.login.set_username("alice");
        app.login.set_password("hunter2");

        let mut terminal = Terminal::new(TestBackend::new(120, 30)).unwrap();
        terminal.draw(|f| render(f, &app)).unwrap();

        let text = buffer_text(&terminal);
        assert!(text.contains("omero.example.org"));
        assert!(text.contains("alice"));
        assert!(!text.contains("hunter2"));
    }

    #[test]
    fn test_render_server_editor() {
        let store = memory_preferences(&[("server_editor", "omeroServer", "first.org,second.org")]);
        let mut app = App::new(LoginScreen::new(store));
        app.open_server_editor();

        let mut terminal = Terminal::new(TestBackend::new(120, 30)).unwrap();
        terminal.draw(|f| render(f, &app)).unwrap();

        let text = buffer_text(&terminal);
        assert!(text.contains("first.org"));
        assert!(text.contains("> "));
    }
}
