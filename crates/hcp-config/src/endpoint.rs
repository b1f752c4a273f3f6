use std::fmt;
use std::str::FromStr;

use thiserror::Error;
use url::Url;

/// Host placeholder meaning "every local interface".
pub const WILDCARD_HOST: &str = "*";

const WILDCARD_BIND: &str = "0.0.0.0";

/// HTTP endpoint the automation listener binds to.
///
/// Written as `http://<host>:<port>`; a host of `*` binds all interfaces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenerEndpoint {
    host: String,
    port: u16,
}

impl ListenerEndpoint {
    /// Builds an endpoint from its parts.
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Host as configured, possibly the wildcard.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Host suitable for socket address resolution.
    #[must_use]
    pub fn bind_host(&self) -> &str {
        if self.is_wildcard() {
            WILDCARD_BIND
        } else {
            &self.host
        }
    }

    /// TCP port.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Whether the endpoint binds every interface.
    #[must_use]
    pub fn is_wildcard(&self) -> bool {
        self.host == WILDCARD_HOST
    }
}

impl fmt::Display for ListenerEndpoint {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "http://{}:{}", self.host, self.port)
    }
}

impl FromStr for ListenerEndpoint {
    type Err = EndpointParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let wildcard = input.contains("://*");
        let normalised = input.replacen("://*", &format!("://{WILDCARD_BIND}"), 1);
        let url = Url::parse(&normalised)?;
        if url.scheme() != "http" {
            return Err(EndpointParseError::UnsupportedScheme(
                url.scheme().to_owned(),
            ));
        }
        if !matches!(url.path(), "" | "/") {
            return Err(EndpointParseError::UnexpectedPath(input.to_owned()));
        }
        let host = url
            .host_str()
            .ok_or_else(|| EndpointParseError::MissingHost(input.to_owned()))?;
        let port = url
            .port_or_known_default()
            .ok_or_else(|| EndpointParseError::MissingPort(input.to_owned()))?;
        let host = if wildcard { WILDCARD_HOST } else { host };
        Ok(Self::new(host, port))
    }
}

/// Errors encountered while parsing a [`ListenerEndpoint`].
#[derive(Debug, Error)]
pub enum EndpointParseError {
    /// Only plain HTTP listeners are supported.
    #[error("unsupported listener scheme '{0}'")]
    UnsupportedScheme(String),
    /// The URI had no host component.
    #[error("missing listener host in '{0}'")]
    MissingHost(String),
    /// The URI had no usable port.
    #[error("missing listener port in '{0}'")]
    MissingPort(String),
    /// Endpoint prefixes are fixed by the server; paths are rejected.
    #[error("listener URI '{0}' must not carry a path")]
    UnexpectedPath(String),
    /// URL failed to parse.
    #[error(transparent)]
    Url(#[from] url::ParseError),
}
