//! Server session lifecycle.
//!
//! A session is `STOPPED` or `STARTED`. A transition marker guards the
//! slow parts (binding, joining) so they run without the state lock held,
//! and duplicate requests for the transition already under way return
//! immediately.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use hcp_config::ListenerEndpoint;
use strum::Display;
use thiserror::Error;
use tracing::{debug, info};

use crate::dispatch::DispatchTable;
use crate::health::HealthReporter;
use crate::jobs::JobSender;
use crate::transport::{BridgeHandler, ListenerError, ListenerHandle, SocketListener};

const SESSION_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::session");

/// Settled session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionState {
    /// No listener is bound.
    Stopped,
    /// The listener is accepting.
    Started,
}

/// Transition currently in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Transition {
    /// Settled.
    None,
    /// Binding the endpoint.
    Starting,
    /// Joining the listener.
    Stopping,
}

/// Errors raised by session transitions.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Binding or joining the listener failed.
    #[error("failed to start listener: {0}")]
    Listener(#[from] ListenerError),
    /// The opposite transition is still running.
    #[error("cannot change session state while {transition}")]
    Busy { transition: Transition },
}

struct Lifecycle {
    state: SessionState,
    transition: Transition,
    listener: Option<ListenerHandle>,
    local_addr: Option<SocketAddr>,
}

/// The automation server: one listener bound to one endpoint.
///
/// The endpoint and dispatch table are fixed at construction.
pub struct Server {
    endpoint: ListenerEndpoint,
    dispatch: Arc<DispatchTable>,
    jobs: JobSender,
    reporter: Arc<dyn HealthReporter>,
    lifecycle: Mutex<Lifecycle>,
}

impl Server {
    /// Builds a stopped session for `endpoint`.
    pub fn new(
        endpoint: ListenerEndpoint,
        dispatch: DispatchTable,
        jobs: JobSender,
        reporter: Arc<dyn HealthReporter>,
    ) -> Self {
        Self {
            endpoint,
            dispatch: Arc::new(dispatch),
            jobs,
            reporter,
            lifecycle: Mutex::new(Lifecycle {
                state: SessionState::Stopped,
                transition: Transition::None,
                listener: None,
                local_addr: None,
            }),
        }
    }

    /// Current settled state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.lock().state
    }

    /// Transition in progress, if any.
    #[must_use]
    pub fn transition(&self) -> Transition {
        self.lock().transition
    }

    /// Bound address while started.
    #[must_use]
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.lock().local_addr
    }

    /// Endpoint the session binds.
    #[must_use]
    pub fn endpoint(&self) -> &ListenerEndpoint {
        &self.endpoint
    }

    /// Binds the endpoint and starts the listener thread.
    ///
    /// A no-op when already started or starting.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Listener`] when binding fails; the session
    /// stays stopped. Returns [`SessionError::Busy`] while stopping.
    pub fn start(&self) -> Result<(), SessionError> {
        {
            let mut lifecycle = self.lock();
            match (lifecycle.state, lifecycle.transition) {
                (_, Transition::Starting) | (SessionState::Started, Transition::None) => {
                    debug!(target: SESSION_TARGET, "start ignored; already started");
                    return Ok(());
                }
                (_, Transition::Stopping) => {
                    return Err(SessionError::Busy {
                        transition: Transition::Stopping,
                    });
                }
                (SessionState::Stopped, Transition::None) => {
                    lifecycle.transition = Transition::Starting;
                }
            }
        }

        let started = self.bind_and_start();
        let mut lifecycle = self.lock();
        lifecycle.transition = Transition::None;
        let (handle, address) = started?;
        lifecycle.listener = Some(handle);
        lifecycle.local_addr = Some(address);
        lifecycle.state = SessionState::Started;
        drop(lifecycle);

        info!(target: SESSION_TARGET, endpoint = %self.endpoint, %address, "session started");
        self.reporter.listener_started(address);
        Ok(())
    }

    fn bind_and_start(&self) -> Result<(ListenerHandle, SocketAddr), ListenerError> {
        let listener = SocketListener::bind(&self.endpoint)?;
        let address = listener.local_addr();
        self.jobs.resume();
        let handler = BridgeHandler::new(Arc::clone(&self.dispatch), self.jobs.clone());
        let handle = listener.start(Arc::new(handler))?;
        Ok((handle, address))
    }

    /// Stops accepting and joins the listener thread.
    ///
    /// The job queue is suspended first: queued jobs are abandoned and their
    /// connections answer 503, so the join never waits on a frame loop that
    /// is not ticking. A no-op when already stopped or stopping. Observers are notified
    /// only after the join, so no listener thread is alive once
    /// `listener_stopped` fires.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Listener`] when the listener thread panicked;
    /// the session is still marked stopped. Returns [`SessionError::Busy`]
    /// while starting.
    pub fn stop(&self) -> Result<(), SessionError> {
        let handle = {
            let mut lifecycle = self.lock();
            match (lifecycle.state, lifecycle.transition) {
                (_, Transition::Stopping) | (SessionState::Stopped, Transition::None) => {
                    debug!(target: SESSION_TARGET, "stop ignored; already stopped");
                    return Ok(());
                }
                (_, Transition::Starting) => {
                    return Err(SessionError::Busy {
                        transition: Transition::Starting,
                    });
                }
                (SessionState::Started, Transition::None) => {
                    lifecycle.transition = Transition::Stopping;
                    lifecycle.listener.take()
                }
            }
        };

        let abandoned = self.jobs.suspend();
        if abandoned > 0 {
            debug!(target: SESSION_TARGET, abandoned, "queued jobs abandoned on stop");
        }
        let joined = match handle {
            Some(handle) => {
                handle.shutdown();
                handle.join()
            }
            None => Ok(()),
        };

        {
            let mut lifecycle = self.lock();
            lifecycle.state = SessionState::Stopped;
            lifecycle.transition = Transition::None;
            lifecycle.local_addr = None;
        }
        info!(target: SESSION_TARGET, endpoint = %self.endpoint, "session stopped");
        self.reporter.listener_stopped();
        joined.map_err(SessionError::from)
    }

    // Transitions leave the lifecycle consistent at every unlock.
    fn lock(&self) -> MutexGuard<'_, Lifecycle> {
        self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        if let Err(error) = self.stop() {
            debug!(target: SESSION_TARGET, %error, "stop during drop failed");
        }
    }
}
