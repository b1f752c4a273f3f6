use crate::logging::LogFormat;

/// Listener URI used when none is configured.
pub const DEFAULT_LISTENER_URI: &str = "http://*:14813";

/// Default log filter expression used by the binaries.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Default frame period of the headless frame loop, in milliseconds.
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 16;

/// Owned listener URI used where allocation is required (e.g. serde).
pub fn default_listener_uri() -> String {
    DEFAULT_LISTENER_URI.to_owned()
}

/// Default log filter expression used by the binaries.
pub fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

pub(crate) fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format for the binaries.
pub fn default_log_format() -> LogFormat {
    LogFormat::Json
}

/// Default frame period in milliseconds.
pub fn default_tick_interval_ms() -> u64 {
    DEFAULT_TICK_INTERVAL_MS
}
