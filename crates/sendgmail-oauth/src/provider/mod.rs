//! `OAuth2` provider configuration.

use crate::error::{Error, Result};
use url::Url;

/// Out-of-band redirect URI: the user copies the code from the browser.
pub const OOB_REDIRECT_URI: &str = "urn:ietf:wg:oauth:2.0:oob";

/// Scope that allows sending mail and nothing else.
pub const GMAIL_SEND_SCOPE: &str = "https://www.googleapis.com/auth/gmail.send";

/// `OAuth2` provider configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Provider {
    /// Provider name shown in error messages (e.g., "Google").
    pub name: String,
    /// Authorization endpoint URL.
    pub auth_url: Url,
    /// Token endpoint URL.
    pub token_url: Url,
    /// Scopes requested during authorization.
    pub scopes: Vec<String>,
    /// Redirect URI sent with the authorization and code exchange requests.
    pub redirect_uri: String,
}

impl Provider {
    /// Creates a new provider configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if URLs are invalid.
    pub fn new(
        name: impl Into<String>,
        auth_url: impl AsRef<str>,
        token_url: impl AsRef<str>,
    ) -> Result<Self> {
        Ok(Self {
            name: name.into(),
            auth_url: Url::parse(auth_url.as_ref())?,
            token_url: Url::parse(token_url.as_ref())?,
            scopes: Vec::new(),
            redirect_uri: OOB_REDIRECT_URI.to_string(),
        })
    }

    /// Sets the requested scopes.
    #[must_use]
    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = scopes;
        self
    }

    /// Replaces the authorization endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid.
    pub fn with_auth_url(mut self, url: impl AsRef<str>) -> Result<Self> {
        self.auth_url = Url::parse(url.as_ref())?;
        Ok(self)
    }

    /// Replaces the token endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid.
    pub fn with_token_url(mut self, url: impl AsRef<str>) -> Result<Self> {
        self.token_url = Url::parse(url.as_ref())?;
        Ok(self)
    }

    /// Google configuration for sending mail through the Gmail API.
    ///
    /// # Errors
    ///
    /// Returns an error if URL parsing fails.
    pub fn google() -> Result<Self> {
        Ok(Self::new(
            "Google",
            "https://accounts.google.com/o/oauth2/auth",
            "https://oauth2.googleapis.com/token",
        )?
        .with_scopes(vec![GMAIL_SEND_SCOPE.to_string()]))
    }

    /// Validates that the configuration can be used.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration is invalid.
    pub fn validate(&self) -> Result<()> {
        if self.scopes.is_empty() {
            return Err(Error::InvalidConfig("no scopes configured".into()));
        }
        if self.redirect_uri.is_empty() {
            return Err(Error::InvalidConfig("redirect_uri is empty".into()));
        }
        for url in [&self.auth_url, &self.token_url] {
            if !matches!(url.scheme(), "https" | "http") {
                return Err(Error::InvalidConfig(format!("unsupported URL scheme: {url}")));
            }
        }
        Ok(())
    }
}
