//! HTTP listener for automation clients.
//!
//! The listener binds the configured endpoint and accepts connections on a
//! background thread, handing each connection to its own thread.

mod errors;
mod handler;
mod http;
mod listener;
#[cfg(test)]
pub(crate) mod test_utils;

pub use self::errors::{ListenerError, TransportError};
pub use self::handler::READY_MESSAGE;
pub(crate) use self::handler::{BridgeHandler, ConnectionHandler};
pub(crate) use self::listener::{ListenerHandle, SocketListener};

const LISTENER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::transport");
