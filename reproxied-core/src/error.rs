//! Error types shared by the middleware and its transport.

use std::error::Error as StdError;

use thiserror::Error;

/// Boxed error used for request and response body streams.
pub type BoxError = Box<dyn StdError + Send + Sync>;

/// Failure to turn a configuration string into an [`Endpoint`](crate::endpoint::Endpoint).
#[derive(Error, Debug)]
pub enum EndpointError {
    #[error("{0}")]
    Parse(#[from] url::ParseError),

    #[error("empty url")]
    Empty,

    #[error("url has no host")]
    MissingHost,

    #[error("invalid scheme {0:?}")]
    InvalidScheme(String),

    #[error("invalid authority {0:?}")]
    InvalidAuthority(String),
}

/// Raised while building a middleware instance. No instance exists when this is returned.
#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("unable to parse proxy url {url:?}: {source}")]
    InvalidProxy {
        url: String,
        #[source]
        source: EndpointError,
    },

    #[error("unable to parse target host url {url:?}: {source}")]
    InvalidTarget {
        url: String,
        #[source]
        source: EndpointError,
    },

    #[error("unable to build http client: {0}")]
    Client(#[from] reqwest::Error),
}

/// The executor could not complete the outbound call.
///
/// Carries only a human readable description: the middleware renders it as the
/// body of a `502 Bad Gateway` response.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct TransportFailure(pub String);

impl TransportFailure {
    pub fn new(description: impl Into<String>) -> Self {
        Self(description.into())
    }

    pub fn description(&self) -> &str {
        &self.0
    }
}

impl From<reqwest::Error> for TransportFailure {
    fn from(err: reqwest::Error) -> Self {
        // reqwest keeps the useful part (connection refused, dns, ...) in the source chain
        let mut description = err.to_string();
        let mut source = err.source();
        while let Some(cause) = source {
            description.push_str(": ");
            description.push_str(&cause.to_string());
            source = cause.source();
        }
        Self(description)
    }
}

impl From<http::Error> for TransportFailure {
    fn from(err: http::Error) -> Self {
        Self(err.to_string())
    }
}
