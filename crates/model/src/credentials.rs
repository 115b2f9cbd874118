//! Login credentials handed to the connection workflow

use std::fmt;

use url::Url;

use crate::error::{CredentialsError, Result};
use crate::types::ConnectionSpeed;

/// Lowest port accepted in a server address
pub const MIN_PORT: u16 = 0;

/// Highest port accepted in a server address
pub const MAX_PORT: u16 = 64000;

/// Port used when the server address does not name one
pub const DEFAULT_PORT: u16 = 4064;

/// URL schemes accepted in a server address
const SUPPORTED_SCHEMES: [&str; 4] = ["tcp", "ssl", "ws", "wss"];

/// Credentials collected by the login screen
#[derive(Clone, PartialEq, Eq)]
pub struct UserCredentials {
    username: String,
    password: String,
    hostname: String,
    port: Option<u16>,
    speed: ConnectionSpeed,
    encrypted: bool,
    args: Vec<String>,
}

impl UserCredentials {
    /// Build credentials from raw form values
    ///
    /// `server` accepts `host`, `host:port`, `[v6addr]:port` or a URL with one
    /// of the `tcp`, `ssl`, `ws` or `wss` schemes.
    pub fn new(
        username: &str,
        password: &str,
        server: &str,
        speed: ConnectionSpeed,
    ) -> Result<Self> {
        let username = username.trim();
        if username.is_empty() {
            return Err(CredentialsError::EmptyUsername);
        }
        let (hostname, port) = parse_server(server)?;

        Ok(Self {
            username: username.to_string(),
            password: password.to_string(),
            hostname,
            port,
            speed,
            encrypted: false,
            args: Vec::new(),
        })
    }

    /// Set whether data transfer should be encrypted
    pub fn with_encrypted(mut self, encrypted: bool) -> Self {
        self.encrypted = encrypted;
        self
    }

    /// Attach extra command-line arguments for the downstream workflow
    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    /// Port named in the server address, if any
    pub fn port(&self) -> Option<u16> {
        self.port
    }

    /// Port to dial, falling back to [`DEFAULT_PORT`]
    pub fn effective_port(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_PORT)
    }

    pub fn speed(&self) -> ConnectionSpeed {
        self.speed
    }

    pub fn is_encrypted(&self) -> bool {
        self.encrypted
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// True when the username field carries a session id
    ///
    /// Session logins are made without a password.
    pub fn is_session_login(&self) -> bool {
        self.password.is_empty()
    }

    /// `host:port` string to dial
    pub fn address(&self) -> String {
        if self.hostname.contains(':') && !self.hostname.starts_with('[') {
            format!("[{}]:{}", self.hostname, self.effective_port())
        } else {
            format!("{}:{}", self.hostname, self.effective_port())
        }
    }
}

impl fmt::Debug for UserCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("hostname", &self.hostname)
            .field("port", &self.port)
            .field("speed", &self.speed)
            .field("encrypted", &self.encrypted)
            .field("args", &self.args)
            .finish()
    }
}

/// Split a server address into host and optional port
fn parse_server(server: &str) -> Result<(String, Option<u16>)> {
    let server = server.trim();
    if server.is_empty() {
        return Err(CredentialsError::EmptyServer);
    }

    if server.contains("://") {
        let url = Url::parse(server).map_err(|_| CredentialsError::InvalidUrl(server.to_string()))?;
        let scheme = url.scheme().to_ascii_lowercase();
        if !SUPPORTED_SCHEMES.contains(&scheme.as_str()) {
            return Err(CredentialsError::UnsupportedScheme(scheme));
        }
        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| CredentialsError::InvalidUrl(server.to_string()))?;
        let port = url.port_or_known_default().map(check_port_range).transpose()?;
        return Ok((host.to_string(), port));
    }

    if let Some(rest) = server.strip_prefix('[') {
        let (host, tail) = rest
            .split_once(']')
            .ok_or_else(|| CredentialsError::InvalidUrl(server.to_string()))?;
        let port = match tail {
            "" => None,
            _ => match tail.strip_prefix(':') {
                Some(port) => Some(parse_port(port)?),
                None => return Err(CredentialsError::InvalidUrl(server.to_string())),
            },
        };
        return Ok((host.to_string(), port));
    }

    // A bare IPv6 address has several colons and no port
    if server.matches(':').count() == 1 {
        if let Some((host, port)) = server.split_once(':') {
            if host.is_empty() {
                return Err(CredentialsError::EmptyServer);
            }
            return Ok((host.to_string(), Some(parse_port(port)?)));
        }
    }

    Ok((server.to_string(), None))
}

fn parse_port(port: &str) -> Result<u16> {
    let value = port
        .trim()
        .parse::<u32>()
        .map_err(|_| CredentialsError::InvalidPort(port.to_string()))?;
    if value > MAX_PORT as u32 {
        return Err(CredentialsError::PortOutOfRange {
            port: value,
            min: MIN_PORT,
            max: MAX_PORT,
        });
    }
    Ok(value as u16)
}

fn check_port_range(port: u16) -> Result<u16> {
    if port > MAX_PORT {
        return Err(CredentialsError::PortOutOfRange {
            port: port as u32,
            min: MIN_PORT,
            max: MAX_PORT,
        });
    }
    Ok(port)
}
