//! Error types for the listener and HTTP framing.

use std::io;
use std::net::SocketAddr;

use thiserror::Error;

/// Errors surfaced while binding or running the listener.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// Host name lookup failed.
    #[error("failed to resolve TCP address {host}:{port}: {source}")]
    Resolve {
        host: String,
        port: u16,
        #[source]
        source: io::Error,
    },
    /// Lookup returned no addresses.
    #[error("no TCP addresses resolved for {host}:{port}")]
    ResolveEmpty { host: String, port: u16 },
    /// No resolved address could be bound.
    #[error("failed to bind TCP listener at {addr}: {source}")]
    BindTcp {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },
    /// The bound socket reported no address.
    #[error("failed to read listener address: {source}")]
    LocalAddr {
        #[source]
        source: io::Error,
    },
    /// The socket could not be made non-blocking.
    #[error("failed to enable non-blocking listener: {source}")]
    NonBlocking {
        #[source]
        source: io::Error,
    },
    /// The accept thread could not be spawned.
    #[error("failed to spawn listener thread: {source}")]
    Spawn {
        #[source]
        source: io::Error,
    },
    /// The accept thread panicked before joining.
    #[error("listener thread panicked")]
    ThreadPanic,
}

/// Per-connection failures. Logged; they never affect queued jobs.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Reading or writing the socket failed.
    #[error("connection I/O failed: {0}")]
    Io(#[from] io::Error),
    /// The request head could not be parsed.
    #[error("malformed HTTP request: {message}")]
    Malformed { message: String },
    /// The request exceeds the size limit.
    #[error("request too large: {size} bytes exceeds {max_size} byte limit")]
    TooLarge { size: usize, max_size: usize },
}

impl TransportError {
    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed {
            message: message.into(),
        }
    }
}
