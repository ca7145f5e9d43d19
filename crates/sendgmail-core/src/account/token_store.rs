//! Token persistence on top of a [`SecretStore`].

use super::credentials::SecretStore;
use super::VaultError;
use crate::error::Result;
use sendgmail_oauth::Token;
use std::sync::Arc;
use tracing::debug;

/// Reads and writes the token for one mail-send endpoint.
///
/// The vault entry's payload is the token's JSON form. The token's
/// `issued_at` is never part of the payload: it is taken from the entry's
/// write time on load and from the new write time on save.
#[derive(Clone)]
pub struct TokenStore {
    vault: Arc<dyn SecretStore>,
    identity: String,
}

impl TokenStore {
    /// Creates a store for the entry named `identity`.
    #[must_use]
    pub fn new(vault: Arc<dyn SecretStore>, identity: impl Into<String>) -> Self {
        Self {
            vault,
            identity: identity.into(),
        }
    }

    /// Name of the vault entry.
    #[must_use]
    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Loads the stored token, or `None` on first run.
    ///
    /// # Errors
    ///
    /// Returns [`Error::VaultUnavailable`](crate::Error::VaultUnavailable) if
    /// the vault fails or the entry cannot be decoded.
    pub fn load(&self) -> Result<Option<Token>> {
        let Some(secret) = self.vault.get(&self.identity)? else {
            debug!("No stored token for {}", self.identity);
            return Ok(None);
        };

        let token: Token = serde_json::from_slice(&secret.payload)
            .map_err(|e| VaultError::Corrupt(format!("{}: {e}", self.identity)))?;
        debug!("Loaded token for {} written at {}", self.identity, secret.last_written);
        Ok(Some(token.with_issued_at(secret.last_written)))
    }

    /// Saves `token`, replacing the stored one.
    ///
    /// Returns the token as persisted, with `issued_at` set to the write time.
    ///
    /// # Errors
    ///
    /// Returns [`Error::VaultUnavailable`](crate::Error::VaultUnavailable) if
    /// the vault cannot be written.
    pub fn save(&self, token: &Token) -> Result<Token> {
        let payload = serde_json::to_vec(token)?;
        let written_at = self.vault.put(&self.identity, &payload)?;
        debug!("Saved token for {}", self.identity);
        Ok(token.clone().with_issued_at(written_at))
    }

    /// Deletes the stored token. Returns false if there was none.
    ///
    /// # Errors
    ///
    /// Returns [`Error::VaultUnavailable`](crate::Error::VaultUnavailable) if
    /// the vault cannot be written.
    pub fn delete(&self) -> Result<bool> {
        Ok(self.vault.delete(&self.identity)?)
    }
}

impl std::fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenStore")
            .field("identity", &self.identity)
            .finish_non_exhaustive()
    }
}
