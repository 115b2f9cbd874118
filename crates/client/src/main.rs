//! OMERO.insight Client
//!
//! Terminal login client: pick a server, enter credentials and check that
//! the server is reachable.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::Parser;
use client::config::{ClientConfig, load_config};
use client::connect::{Connector, TcpConnector};
use client::login::{LoginOutcome, LoginScreen};
use client::tui;
use common::{FilePreferences, PreferenceStore, setup_file_logging, setup_logging};
use tracing::{error, info};

/// Environment variable holding the password in headless mode
const PASSWORD_ENV: &str = "INSIGHT_PASSWORD";

#[derive(Parser, Debug)]
#[command(name = "insight-client")]
#[command(author, version, about = "OMERO.insight Client - Log in to an OMERO server")]
#[command(long_about = "
Terminal login client for OMERO servers.
Remembers the servers you used, your username and your connection settings.

EXAMPLES:
    # Run with default config (interactive TUI)
    insight-client

    # Preselect a server
    insight-client --server omero.example.org:4064

    # Log in without the TUI (password read from INSIGHT_PASSWORD)
    INSIGHT_PASSWORD=secret insight-client --headless --user alice --server omero.example.org

    # Run with custom config and debug logging
    insight-client --config /path/to/client.toml --log-level debug

CONFIGURATION:
    The client looks for configuration files in the following order:
    1. Path specified with --config
    2. ~/.config/omero-insight/client.toml
    3. /etc/omero-insight/client.toml
    4. Built-in defaults

    Preferences (known servers, last user) are stored in
    ~/.config/omero-insight/preferences.toml unless --preferences is given.
")]
struct Args {
    /// Path to configuration file
    #[arg(short, long, value_name = "PATH")]
    config: Option<String>,

    /// Save default configuration to default location and exit
    #[arg(long)]
    save_config: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, value_name = "LEVEL")]
    log_level: Option<String>,

    /// Preference file to use instead of the configured one
    #[arg(long, value_name = "PATH")]
    preferences: Option<String>,

    /// Server to preselect (host, host:port or URL)
    #[arg(short, long, value_name = "HOST")]
    server: Option<String>,

    /// Username for headless login
    #[arg(short, long, value_name = "NAME")]
    user: Option<String>,

    /// Run in headless mode (no TUI, log in once and exit)
    #[arg(long)]
    headless: bool,

    /// Extra arguments passed on with the credentials
    #[arg(last = true)]
    extra: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Handle --save-config flag early (before loading config)
    if args.save_config {
        let config = ClientConfig::default();
        let path = ClientConfig::default_path();
        config.save(&path).context("Failed to save configuration")?;
        println!("Configuration saved to: {}", path.display());
        return Ok(());
    }

    // Load configuration first (to get log level from config if not specified)
    let config = if let Some(ref path) = args.config {
        load_config(path).context("Failed to load configuration")?
    } else {
        ClientConfig::load_or_default()
    };

    // Use CLI log level if specified, otherwise use config value
    let log_level = args
        .log_level
        .as_deref()
        .unwrap_or(&config.client.log_level);

    // The TUI owns stdout, so interactive sessions log to a file
    if args.headless {
        setup_logging(log_level).context("Failed to setup logging")?;
    } else {
        setup_file_logging(log_level, &config.log_file_path())
            .context("Failed to setup logging")?;
    }

    info!("OMERO.insight Client v{}", env!("CARGO_PKG_VERSION"));
    info!("Log level: {}", log_level);

    let prefs_path = match args.preferences.as_deref() {
        Some(path) => PathBuf::from(shellexpand::tilde(path).as_ref()),
        None => config.preferences_path(),
    };
    let store: Arc<dyn PreferenceStore> = Arc::new(
        FilePreferences::open(prefs_path.clone()).context("Failed to open preferences")?,
    );
    info!("Preferences: {}", prefs_path.display());

    let mut login = LoginScreen::new(store).with_args(args.extra.clone());
    tui::prepare_login(&mut login, &config, args.server.as_deref());
    let connector = TcpConnector::new(config.login.connect_timeout());

    let result = if args.headless {
        run_headless(login, connector, &args).await
    } else {
        match tui::run(login, connector).await {
            Ok(Some(session)) => {
                println!("Logged in: {}", session);
                Ok(())
            }
            Ok(None) => Ok(()),
            Err(e) => Err(e),
        }
    };

    info!("Client shutting down...");
    result
}

/// Submit the login form once without the TUI
async fn run_headless<C: Connector>(
    mut login: LoginScreen,
    connector: C,
    args: &Args,
) -> Result<()> {
    if let Some(user) = args.user.as_deref() {
        login.set_username(user);
    }
    if let Ok(password) = std::env::var(PASSWORD_ENV) {
        login.set_password(&password);
    }

    let credentials = match login.login() {
        LoginOutcome::Submitted(credentials) => credentials,
        LoginOutcome::Busy => bail!("A login is already in progress"),
        LoginOutcome::Incomplete => bail!(
            "Username, password and server are required (use --user, --server and {})",
            PASSWORD_ENV
        ),
        LoginOutcome::Rejected(e) => {
            return Err(e).context(format!("Invalid server {:?}", login.server()));
        }
    };

    match connector.connect(credentials).await {
        Ok(session) => {
            info!("Logged in: {}", session);
            println!("Logged in: {}", session);
            Ok(())
        }
        Err(e) => {
            error!("Login failed: {:#}", e);
            login.on_login_failure();
            Err(e)
        }
    }
}
