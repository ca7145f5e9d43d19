//! `OAuth2` token record and the merge rules applied to server responses.

use crate::error::{Error, Result};
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stored credentials for one mail-send endpoint.
///
/// A token is a value: every grant or refresh produces a new `Token` through
/// [`with_grant`](Self::with_grant) or [`with_refresh`](Self::with_refresh),
/// and the client credentials travel along unchanged because the token
/// endpoint never echoes them back.
///
/// `issued_at` is not part of the serialized form. It is the time the token
/// was last written to the credential vault and is filled in by whoever
/// loads or saves it.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// Bearer credential, absent until the first grant or refresh.
    #[serde(default)]
    pub access_token: Option<String>,
    /// Validity of the access token in seconds, counted from `issued_at`.
    #[serde(default)]
    pub expires_in: i64,
    /// Long-lived credential used to obtain new access tokens.
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Scope granted by the authorization server.
    #[serde(default)]
    pub scope: Option<String>,
    /// Token type (usually "Bearer").
    #[serde(default)]
    pub token_type: Option<String>,
    /// OAuth client ID.
    pub client_id: String,
    /// OAuth client secret.
    pub client_secret: String,
    /// When the token was persisted.
    #[serde(skip)]
    pub issued_at: DateTime<Utc>,
}

impl Token {
    /// Creates a token holding only client credentials.
    #[must_use]
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            access_token: None,
            expires_in: 0,
            refresh_token: None,
            scope: None,
            token_type: None,
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            issued_at: DateTime::<Utc>::UNIX_EPOCH,
        }
    }

    /// Sets the persistence time.
    #[must_use]
    pub const fn with_issued_at(mut self, issued_at: DateTime<Utc>) -> Self {
        self.issued_at = issued_at;
        self
    }

    /// Instant after which the access token must not be used.
    #[must_use]
    pub fn expires_at(&self) -> DateTime<Utc> {
        TimeDelta::try_seconds(self.expires_in)
            .and_then(|validity| self.issued_at.checked_add_signed(validity))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Returns true if the access token is present and not past its deadline.
    ///
    /// No clock-skew margin is applied.
    #[must_use]
    pub fn is_fresh_at(&self, now: DateTime<Utc>) -> bool {
        self.access_token.is_some() && now <= self.expires_at()
    }

    /// Returns true if a refresh token has been obtained.
    #[must_use]
    pub const fn has_refresh_token(&self) -> bool {
        self.refresh_token.is_some()
    }

    /// Returns the refresh token if available.
    ///
    /// # Errors
    ///
    /// Returns an error if no refresh token is available.
    pub fn refresh_token(&self) -> Result<&str> {
        self.refresh_token.as_deref().ok_or(Error::NoRefreshToken)
    }

    /// Merges an authorization-code grant.
    ///
    /// Everything the server returned replaces the previous values; the
    /// client credentials are kept. A refresh token missing from the
    /// response leaves the previous one in place.
    #[must_use]
    pub fn with_grant(&self, response: TokenResponse) -> Self {
        Self {
            access_token: Some(response.access_token),
            expires_in: response.expires_in.unwrap_or_default(),
            refresh_token: response.refresh_token.or_else(|| self.refresh_token.clone()),
            scope: response.scope,
            token_type: response.token_type,
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
            issued_at: self.issued_at,
        }
    }

    /// Merges a refresh-token grant.
    ///
    /// Refresh responses usually omit the refresh token, so the stored one
    /// is kept. A rotated refresh token replaces it, since the server may
    /// already have invalidated the old one.
    #[must_use]
    pub fn with_refresh(&self, response: TokenResponse) -> Self {
        self.with_grant(response)
    }

    /// Returns a copy without the access token, forcing the next use to
    /// refresh it.
    #[must_use]
    pub fn without_access_token(&self) -> Self {
        Self {
            access_token: None,
            ..self.clone()
        }
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const REDACTED: &str = "<redacted>";
        let redact = |value: &Option<String>| value.as_ref().map(|_| REDACTED);

        f.debug_struct("Token")
            .field("access_token", &redact(&self.access_token))
            .field("expires_in", &self.expires_in)
            .field("refresh_token", &redact(&self.refresh_token))
            .field("scope", &self.scope)
            .field("token_type", &self.token_type)
            .field("client_id", &self.client_id)
            .field("client_secret", &REDACTED)
            .field("issued_at", &self.issued_at)
            .finish()
    }
}

/// Token response from `OAuth2` server.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TokenResponse {
    /// Access token.
    pub access_token: String,
    /// Expires in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<i64>,
    /// Refresh token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Scope.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    /// Token type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
}
