//! Error types for envelope decoding and action execution.
//!
//! Decode errors are raised on the listener thread and never reach the job
//! queue. Action errors are raised on the tree-owning thread and become
//! `ERROR` jobs.

use std::io;

use thiserror::Error;

use crate::element::ElementError;

/// The action envelope could not be turned into a typed request.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Body is not valid JSON or does not match the envelope shape.
    #[error("malformed action envelope: {message}")]
    Malformed {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    /// `cmd` was something other than `action`.
    #[error("unknown command '{command}'")]
    UnknownCommand { command: String },

    /// `params` did not match what the action requires.
    #[error("invalid params for '{action}': {message}")]
    InvalidParams { action: String, message: String },

    /// Body exceeded the request size limit.
    #[error("request too large: {size} bytes exceeds {max_size} byte limit")]
    RequestTooLarge { size: usize, max_size: usize },
}

impl DecodeError {
    /// Stable name used in error payloads.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnknownCommand { .. } => "UnknownCommand",
            Self::Malformed { .. } | Self::InvalidParams { .. } | Self::RequestTooLarge { .. } => {
                "DecodeError"
            }
        }
    }

    /// Wraps a JSON syntax or shape error.
    pub fn from_json_error(source: serde_json::Error) -> Self {
        Self::Malformed {
            message: source.to_string(),
            source: Some(source),
        }
    }

    /// Request that is not a usable envelope.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed {
            message: message.into(),
            source: None,
        }
    }

    /// Envelope whose `cmd` is not `action`.
    pub fn unknown_command(command: impl Into<String>) -> Self {
        Self::UnknownCommand {
            command: command.into(),
        }
    }

    /// Parameters that do not fit `action`.
    pub fn invalid_params(action: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParams {
            action: action.into(),
            message: message.into(),
        }
    }

    /// Body over the size limit.
    pub fn request_too_large(size: usize, max_size: usize) -> Self {
        Self::RequestTooLarge { size, max_size }
    }
}

/// Failure while executing a request against the tree.
#[derive(Debug, Error)]
pub enum ActionError {
    /// Resolution or query failure.
    #[error(transparent)]
    Element(#[from] ElementError),

    /// Producing the page source failed.
    #[error("failed to render page source: {0}")]
    Source(#[from] io::Error),
}

impl ActionError {
    /// Stable name used in error payloads.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Element(error) => error.kind(),
            Self::Source(_) => "InternalError",
        }
    }
}
