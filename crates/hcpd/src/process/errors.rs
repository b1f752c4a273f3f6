//! Error surface for bridge launch and supervision.

use thiserror::Error;

use crate::bootstrap::BootstrapError;
use crate::session::SessionError;

use super::shutdown::ShutdownError;

/// Errors surfaced while launching or supervising the bridge process.
#[derive(Debug, Error)]
pub enum LaunchError {
    /// Bootstrapping the bridge failed.
    #[error("bridge bootstrap failed: {source}")]
    Bootstrap {
        #[source]
        source: BootstrapError,
    },
    /// Starting or stopping the server session failed.
    #[error("server session failed: {source}")]
    Session {
        #[source]
        source: SessionError,
    },
    /// Installing the shutdown signal failed.
    #[error("failed to arm shutdown signal: {source}")]
    Shutdown {
        #[source]
        source: ShutdownError,
    },
}

impl From<BootstrapError> for LaunchError {
    fn from(source: BootstrapError) -> Self {
        Self::Bootstrap { source }
    }
}

impl From<SessionError> for LaunchError {
    fn from(source: SessionError) -> Self {
        Self::Session { source }
    }
}

impl From<ShutdownError> for LaunchError {
    fn from(source: ShutdownError) -> Self {
        Self::Shutdown { source }
    }
}
