//! Access token lifecycle.

mod manager;

pub use manager::TokenManager;

use chrono::{DateTime, Utc};
use sendgmail_oauth::Token;
use std::fmt;

/// Where a token stands, derived from its contents and the clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenState {
    /// Nothing loaded yet.
    Uninitialized,
    /// Client credentials only: the user has to authorize the application.
    NeedsAuthorization,
    /// Refresh token but no unexpired access token.
    NeedsAccessToken,
    /// Unexpired access token.
    Ready,
}

impl TokenState {
    /// Derives the state of `token` at `now`.
    #[must_use]
    pub fn of(token: Option<&Token>, now: DateTime<Utc>) -> Self {
        match token {
            None => Self::Uninitialized,
            Some(token) if !token.has_refresh_token() => Self::NeedsAuthorization,
            Some(token) if token.is_fresh_at(now) => Self::Ready,
            Some(_) => Self::NeedsAccessToken,
        }
    }
}

impl fmt::Display for TokenState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Uninitialized => "not configured",
            Self::NeedsAuthorization => "needs authorization",
            Self::NeedsAccessToken => "needs access token",
            Self::Ready => "ready",
        })
    }
}
