//! Credential validation errors

use thiserror::Error;

/// Errors raised while building [`crate::UserCredentials`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialsError {
    /// Username (or session id) is blank
    #[error("Username must not be empty")]
    EmptyUsername,

    /// Server address is blank
    #[error("Server address must not be empty")]
    EmptyServer,

    /// Port is not a number
    #[error("Invalid port '{0}'")]
    InvalidPort(String),

    /// Port outside the accepted range
    #[error("Port {port} out of range ({min}-{max})")]
    PortOutOfRange { port: u32, min: u16, max: u16 },

    /// Server given as a URL with a scheme the client cannot speak
    #[error("Unsupported server URL scheme '{0}'")]
    UnsupportedScheme(String),

    /// Server URL could not be parsed or has no host
    #[error("Invalid server URL '{0}'")]
    InvalidUrl(String),
}

/// Type alias for credential results
pub type Result<T> = std::result::Result<T, CredentialsError>;
