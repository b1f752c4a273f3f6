//! Layered configuration for the HCP automation bridge.
//!
//! Values are merged from built-in defaults, an optional TOML configuration
//! file, `HCP_*` environment variables, and command-line flags, in increasing
//! order of precedence. The resulting [`Config`] is resolved once at startup and
//! treated as immutable for the lifetime of a server session.

mod defaults;
mod endpoint;
mod logging;

use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use ortho_config::{OrthoConfig, OrthoError};
use serde::{Deserialize, Serialize};

pub use defaults::{
    DEFAULT_LISTENER_URI, DEFAULT_LOG_FILTER, DEFAULT_TICK_INTERVAL_MS, default_listener_uri,
    default_log_filter, default_log_format, default_tick_interval_ms,
};
pub use endpoint::{EndpointParseError, ListenerEndpoint, WILDCARD_HOST};
pub use logging::{LogFormat, LogFormatParseError};

/// Resolved configuration shared by the daemon binary and its library.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "HCP")]
pub struct Config {
    /// Bind specification for the automation listener, e.g. `http://*:14813`.
    #[serde(default = "default_listener_uri")]
    pub listener_uri: String,
    /// `tracing` filter expression applied to the global subscriber.
    #[serde(default = "defaults::default_log_filter_string")]
    pub log_filter: String,
    /// Output format for structured logs.
    #[serde(default = "default_log_format")]
    pub log_format: LogFormat,
    /// Frame period used by the headless frame loop.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    /// Optional JSON scene description loaded by the daemon binary.
    #[serde(default)]
    pub scene_path: Option<Utf8PathBuf>,
    /// Fails single-result `name` and `tag` lookups that match several nodes.
    #[serde(default)]
    pub strict_selectors: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listener_uri: default_listener_uri(),
            log_filter: defaults::default_log_filter_string(),
            log_format: default_log_format(),
            tick_interval_ms: default_tick_interval_ms(),
            scene_path: None,
            strict_selectors: false,
        }
    }
}

impl Config {
    /// Loads configuration from the process arguments and environment.
    ///
    /// # Errors
    ///
    /// Returns the layered loader error when a source is malformed.
    pub fn load() -> Result<Self, Arc<OrthoError>> {
        <Self as OrthoConfig>::load()
    }

    /// Loads configuration from an explicit argument list.
    ///
    /// The first element is treated as the binary name, matching
    /// [`std::env::args_os`].
    ///
    /// # Errors
    ///
    /// Returns the layered loader error when a source is malformed.
    pub fn load_from_iter<I, T>(args: I) -> Result<Self, Arc<OrthoError>>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        <Self as OrthoConfig>::load_from_iter(args)
    }

    /// Parses the configured listener URI.
    ///
    /// # Errors
    ///
    /// Returns [`EndpointParseError`] when the URI is not `http://<host>:<port>`.
    pub fn listener_endpoint(&self) -> Result<ListenerEndpoint, EndpointParseError> {
        self.listener_uri.parse()
    }

    /// Filter expression for the tracing subscriber.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Log output format.
    #[must_use]
    pub fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Frame period for the headless frame loop.
    #[must_use]
    pub fn tick_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.tick_interval_ms.max(1))
    }

    /// Scene description path, when one was configured.
    #[must_use]
    pub fn scene_path(&self) -> Option<&Utf8Path> {
        self.scene_path.as_deref()
    }
}
