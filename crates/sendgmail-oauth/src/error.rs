//! Error types for `OAuth2` operations.

use crate::api_error::EndpointFailure;

/// Result type alias for `OAuth2` operations.
pub type Result<T> = std::result::Result<T, Error>;

/// `OAuth2` error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// HTTP request error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The token endpoint answered with a non-success status.
    #[error("{0}")]
    Endpoint(EndpointFailure),

    /// No refresh token available.
    #[error("No refresh token available")]
    NoRefreshToken,

    /// Invalid token response.
    #[error("Invalid token response: {0}")]
    InvalidResponse(String),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// URL parsing error.
    #[error("URL error: {0}")]
    UrlError(#[from] url::ParseError),
}

impl Error {
    /// Returns the endpoint failure if the server rejected the request.
    #[must_use]
    pub const fn endpoint_failure(&self) -> Option<&EndpointFailure> {
        match self {
            Self::Endpoint(failure) => Some(failure),
            _ => None,
        }
    }
}

impl From<EndpointFailure> for Error {
    fn from(failure: EndpointFailure) -> Self {
        Self::Endpoint(failure)
    }
}
