//! The `{ "cmd": "action", "action": ..., "params": ... }` envelope.

use serde::Deserialize;
use serde_json::Value;

use super::errors::DecodeError;

/// The only accepted value of `cmd`.
pub const ACTION_COMMAND: &str = "action";

/// Decoded action envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct ActionEnvelope {
    /// Command name; only `action` is accepted.
    pub cmd: String,
    /// Registered action name.
    #[serde(default)]
    pub action: String,
    /// Action parameters; `null` when absent.
    #[serde(default)]
    pub params: Value,
}

impl ActionEnvelope {
    /// Parses a request body.
    ///
    /// # Errors
    ///
    /// - [`DecodeError::Malformed`] for empty or non-JSON bodies and bodies
    ///   without a `cmd`.
    /// - [`DecodeError::UnknownCommand`] when `cmd` is not `action`.
    pub fn parse(body: &[u8]) -> Result<Self, DecodeError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Err(DecodeError::malformed("empty request body"));
        }
        let envelope: Self = serde_json::from_slice(body).map_err(DecodeError::from_json_error)?;
        if envelope.cmd != ACTION_COMMAND {
            return Err(DecodeError::unknown_command(envelope.cmd));
        }
        Ok(envelope)
    }
}
