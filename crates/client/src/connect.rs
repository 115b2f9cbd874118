//! Connection workflow started by a successful login
//!
//! The login screen only produces [`UserCredentials`]; what happens next is
//! behind the [`Connector`] trait. [`TcpConnector`] checks that the server
//! accepts connections on its port.

use std::future::Future;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use model::{ConnectionSpeed, UserCredentials};
use tokio::net::TcpStream;
use tracing::{debug, info};

/// Default time allowed for the server to accept the connection
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Established connection to a server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub username: String,
    pub server: String,
    pub peer: SocketAddr,
    pub encrypted: bool,
    pub speed: ConnectionSpeed,
    pub connect_time: Duration,
}

impl std::fmt::Display for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}@{} ({}, {}ms)",
            self.username,
            self.server,
            self.peer,
            self.connect_time.as_millis()
        )
    }
}

/// Downstream connection workflow
pub trait Connector: Clone + Send + Sync + 'static {
    fn connect(&self, credentials: UserCredentials) -> impl Future<Output = Result<Session>> + Send;
}

/// Checks that the server accepts TCP connections
#[derive(Debug, Clone)]
pub struct TcpConnector {
    timeout: Duration,
}

impl TcpConnector {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Default for TcpConnector {
    fn default() -> Self {
        Self::new(DEFAULT_CONNECT_TIMEOUT)
    }
}

impl Connector for TcpConnector {
    fn connect(
        &self,
        credentials: UserCredentials,
    ) -> impl Future<Output = Result<Session>> + Send {
        let timeout = self.timeout;
        async move {
            let address = credentials.address();
            debug!("Connecting to {} (timeout {:?})", address, timeout);

            let started = Instant::now();
            let stream = tokio::time::timeout(timeout, TcpStream::connect(&address))
                .await
                .with_context(|| format!("Timed out connecting to {}", address))?
                .with_context(|| format!("Failed to connect to {}", address))?;
            let connect_time = started.elapsed();
            let peer = stream.peer_addr().context("Failed to read peer address")?;

            info!("Server {} reachable at {} in {:?}", address, peer, connect_time);
            Ok(Session {
                username: credentials.username().to_string(),
                server: credentials.hostname().to_string(),
                peer,
                encrypted: credentials.is_encrypted(),
                speed: credentials.speed(),
                connect_time,
            })
        }
    }
}
