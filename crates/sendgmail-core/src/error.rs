//! Error types for the core library.

use crate::account::VaultError;
use sendgmail_oauth::EndpointFailure;
use thiserror::Error;

/// Errors that can occur in core operations.
///
/// Failures reported by a Google endpoint display as a single line naming
/// the action, the server's message and code, and the HTTP status.
#[derive(Debug, Error)]
pub enum Error {
    /// The credential vault could not be read or written.
    #[error("Credential vault unavailable: {0}")]
    VaultUnavailable(#[from] VaultError),

    /// The authorization code was refused.
    #[error("{0}")]
    AuthorizationDenied(EndpointFailure),

    /// The authorization-code exchange failed.
    #[error("{0}")]
    TokenExchangeFailed(EndpointFailure),

    /// Refreshing the access token failed.
    #[error("{0}")]
    TokenRefreshFailed(EndpointFailure),

    /// The send endpoint rejected a freshly refreshed access token.
    #[error("{0}")]
    SendUnauthorized(EndpointFailure),

    /// The send endpoint refused the message.
    #[error("{0}")]
    SendFailed(EndpointFailure),

    /// Credentials have to be entered but nobody can type them.
    #[error("Run sendgmail in interactive mode to acquire credentials.")]
    NoInteractiveInput,

    /// `OAuth2` protocol or transport error.
    #[error("OAuth2 error: {0}")]
    OAuth(#[from] sendgmail_oauth::Error),

    /// HTTP transport error on the send endpoint.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Terminal I/O failed.
    #[error("Terminal error: {0}")]
    Terminal(#[from] std::io::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// The endpoint failure behind this error, if a server refused a request.
    #[must_use]
    pub const fn endpoint_failure(&self) -> Option<&EndpointFailure> {
        match self {
            Self::AuthorizationDenied(failure)
            | Self::TokenExchangeFailed(failure)
            | Self::TokenRefreshFailed(failure)
            | Self::SendUnauthorized(failure)
            | Self::SendFailed(failure) => Some(failure),
            _ => None,
        }
    }
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
