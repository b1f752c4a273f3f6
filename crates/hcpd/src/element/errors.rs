//! Failures raised while resolving or querying elements.

use thiserror::Error;

/// Errors produced on the tree-owning thread while a job is processing.
///
/// They are converted into error payloads at the tick boundary and never
/// cross back to the listener as Rust errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ElementError {
    /// The search yielded no candidate.
    #[error("{message}")]
    ElementNotFound { message: String },

    /// The request is well formed but not supported in this mode.
    #[error("unsupported operation: {message}")]
    UnsupportedOperation { message: String },

    /// The selector cannot be used with the requested strategy.
    #[error("invalid selector '{selector}': {reason}")]
    InvalidSelector { selector: String, reason: String },

    /// A single-result query matched several nodes in strict mode.
    #[error("selector '{selector}' matched {matches} elements")]
    AmbiguousSelector { selector: String, matches: usize },
}

impl ElementError {
    /// Stable name used in error payloads.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ElementNotFound { .. } => "ElementNotFound",
            Self::UnsupportedOperation { .. } => "UnsupportedOperation",
            Self::InvalidSelector { .. } => "InvalidSelector",
            Self::AmbiguousSelector { .. } => "AmbiguousSelector",
        }
    }

    /// No element answers to `id`.
    pub fn unknown_id(id: impl AsRef<str>) -> Self {
        Self::ElementNotFound {
            message: format!("no element with id '{}'", id.as_ref()),
        }
    }

    /// The object was found but lacks the requested unit, or was not found.
    pub fn missing(component: impl AsRef<str>, object: impl AsRef<str>) -> Self {
        Self::ElementNotFound {
            message: format!(
                "could not find <{}> on <{}>",
                component.as_ref(),
                object.as_ref()
            ),
        }
    }

    /// Operation the strategy or element cannot perform.
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::UnsupportedOperation {
            message: message.into(),
        }
    }

    /// Selector that cannot be parsed for the strategy.
    pub fn invalid_selector(selector: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidSelector {
            selector: selector.into(),
            reason: reason.into(),
        }
    }

    /// Strict search with more than one match.
    pub fn ambiguous(selector: impl Into<String>, matches: usize) -> Self {
        Self::AmbiguousSelector {
            selector: selector.into(),
            matches,
        }
    }
}
