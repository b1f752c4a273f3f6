use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use signal_hook::consts::signal::{SIGHUP, SIGINT, SIGQUIT, SIGTERM};
use signal_hook::flag;
use thiserror::Error;
use tracing::debug;

use super::PROCESS_TARGET;

const TERMINATION_SIGNALS: [i32; 4] = [SIGTERM, SIGINT, SIGQUIT, SIGHUP];

/// Abstraction over shutdown notification mechanisms.
///
/// The frame loop cannot block, so arming a signal yields a flag it polls
/// between ticks.
pub trait ShutdownSignal: Send + Sync {
    /// Installs the notification source and returns the flag it raises.
    fn arm(&self) -> Result<ShutdownFlag, ShutdownError>;
}

/// Errors reported by shutdown signal listeners.
#[derive(Debug, Error)]
pub enum ShutdownError {
    /// Installing signal handlers failed.
    #[error("failed to install signal handlers: {source}")]
    Install {
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
}

/// Shared flag raised once shutdown should proceed.
#[derive(Debug, Clone, Default)]
pub struct ShutdownFlag {
    raised: Arc<AtomicBool>,
}

impl ShutdownFlag {
    /// Flag that has not been raised.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests shutdown.
    pub fn raise(&self) {
        self.raised.store(true, Ordering::SeqCst);
    }

    /// Whether shutdown was requested.
    #[must_use]
    pub fn is_raised(&self) -> bool {
        self.raised.load(Ordering::SeqCst)
    }
}

/// Shutdown listener that raises its flag on termination signals.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemShutdownSignal;

impl SystemShutdownSignal {
    /// Listener for the process's termination signals.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl ShutdownSignal for SystemShutdownSignal {
    fn arm(&self) -> Result<ShutdownFlag, ShutdownError> {
        let shutdown = ShutdownFlag::new();
        for signal in TERMINATION_SIGNALS {
            flag::register(signal, Arc::clone(&shutdown.raised))
                .map_err(|source| ShutdownError::Install { source })?;
        }
        debug!(target: PROCESS_TARGET, "termination signal handlers installed");
        Ok(shutdown)
    }
}
