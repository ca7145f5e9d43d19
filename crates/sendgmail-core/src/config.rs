//! Relay configuration.

use crate::account::credentials::DEFAULT_VAULT_USER;
use crate::error::{Error, Result};
use sendgmail_oauth::Provider;
use url::Url;

/// Gmail API endpoint that sends a raw message.
pub const GMAIL_SEND_URL: &str = "https://content.googleapis.com/gmail/v1/users/me/messages/send";

/// Prefix of vault entry names, shared with git's credential entries.
pub const TARGET_PREFIX: &str = "git:";

/// Where to send mail and how to authorize.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    /// `OAuth2` provider.
    pub provider: Provider,
    /// Mail-send endpoint.
    pub send_url: Url,
    /// Prefix of the vault entry name.
    pub target_prefix: String,
    /// User name of the vault entry.
    pub vault_user: String,
}

impl RelayConfig {
    /// Gmail defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if URL parsing fails.
    pub fn gmail() -> Result<Self> {
        Ok(Self {
            provider: Provider::google()?,
            send_url: parse_url(GMAIL_SEND_URL)?,
            target_prefix: TARGET_PREFIX.to_string(),
            vault_user: DEFAULT_VAULT_USER.to_string(),
        })
    }

    /// Replaces the mail-send endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid.
    pub fn with_send_url(mut self, url: &str) -> Result<Self> {
        self.send_url = parse_url(url)?;
        Ok(self)
    }

    /// Replaces the token endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid.
    pub fn with_token_url(mut self, url: &str) -> Result<Self> {
        self.provider = self.provider.with_token_url(url)?;
        Ok(self)
    }

    /// Replaces the authorization endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid.
    pub fn with_auth_url(mut self, url: &str) -> Result<Self> {
        self.provider = self.provider.with_auth_url(url)?;
        Ok(self)
    }

    /// Vault entry name: the prefix followed by the send endpoint, so each
    /// endpoint keeps its own credentials.
    #[must_use]
    pub fn identity(&self) -> String {
        format!("{}{}", self.target_prefix, self.send_url)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration is invalid.
    pub fn validate(&self) -> Result<()> {
        self.provider.validate()?;
        if !matches!(self.send_url.scheme(), "https" | "http") {
            return Err(Error::Config(format!(
                "unsupported send URL scheme: {}",
                self.send_url
            )));
        }
        if self.vault_user.is_empty() {
            return Err(Error::Config("vault user is empty".into()));
        }
        Ok(())
    }
}

fn parse_url(url: &str) -> Result<Url> {
    Url::parse(url).map_err(|e| Error::Config(format!("invalid URL {url}: {e}")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_gmail_identity() {
        let config = RelayConfig::gmail().unwrap();
        assert_eq!(
            config.identity(),
            "git:https://content.googleapis.com/gmail/v1/users/me/messages/send"
        );
        config.validate().unwrap();
    }

    #[test]
    fn test_endpoints_get_distinct_identities() {
        let gmail = RelayConfig::gmail().unwrap();
        let other = gmail.clone().with_send_url("http://127.0.0.1:8025/send").unwrap();
        assert_ne!(gmail.identity(), other.identity());
        assert_eq!(other.identity(), "git:http://127.0.0.1:8025/send");
    }

    #[test]
    fn test_invalid_overrides() {
        let config = RelayConfig::gmail().unwrap();
        assert!(matches!(config.clone().with_send_url("::"), Err(Error::Config(_))));
        assert!(config.with_token_url("nope").is_err());
    }
}
