//! Secure credential storage using system keyring.
//!
//! Provides secure storage for the relay's `OAuth2` token using the
//! platform's native credential storage:
//! - Linux: Secret Service (GNOME Keyring, `KWallet`)
//! - macOS: Keychain
//! - Windows: Credential Manager

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use keyring::Entry;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// User name under which relay tokens are stored.
pub const DEFAULT_VAULT_USER: &str = "PersonalAccessToken";

/// Error type for vault operations.
#[derive(Debug, thiserror::Error)]
pub enum VaultError {
    /// Failed to access keyring.
    #[error("Keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    /// The entry exists but its content cannot be decoded.
    #[error("Corrupt vault entry: {0}")]
    Corrupt(String),

    /// The vault cannot be reached at all.
    #[error("{0}")]
    Unavailable(String),
}

/// A vault entry's payload and the time it was last written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Secret {
    /// Opaque payload bytes.
    pub payload: Vec<u8>,
    /// When the payload was written.
    pub last_written: DateTime<Utc>,
}

/// A key-value credential vault.
///
/// Implementations must tell a missing entry (`Ok(None)`) apart from a
/// vault failure (`Err`), and `put` must replace an existing entry in one
/// step.
pub trait SecretStore: Send + Sync {
    /// Reads the entry stored under `identity`.
    ///
    /// # Errors
    ///
    /// Returns an error if the vault cannot be read.
    fn get(&self, identity: &str) -> Result<Option<Secret>, VaultError>;

    /// Writes `payload` under `identity`, returning the recorded write time.
    ///
    /// # Errors
    ///
    /// Returns an error if the vault cannot be written.
    fn put(&self, identity: &str, payload: &[u8]) -> Result<DateTime<Utc>, VaultError>;

    /// Removes the entry under `identity`. Returns false if there was none.
    ///
    /// # Errors
    ///
    /// Returns an error if the vault cannot be written.
    fn delete(&self, identity: &str) -> Result<bool, VaultError>;
}

/// What is stored as the keyring password.
///
/// Keyrings do not expose an entry's modification time on every platform,
/// so the write time is recorded next to the payload.
#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    written_at: DateTime<Utc>,
    payload: String,
}

/// [`SecretStore`] backed by the OS keyring.
///
/// Entries are addressed by (identity, user): the identity is the keyring
/// service name and the user is fixed per store.
#[derive(Debug, Clone)]
pub struct KeyringStore {
    user: String,
}

impl KeyringStore {
    /// Creates a store writing entries under `user`.
    #[must_use]
    pub fn new(user: impl Into<String>) -> Self {
        Self { user: user.into() }
    }

    fn entry(&self, identity: &str) -> Result<Entry, VaultError> {
        Ok(Entry::new(identity, &self.user)?)
    }
}

impl Default for KeyringStore {
    fn default() -> Self {
        Self::new(DEFAULT_VAULT_USER)
    }
}

impl SecretStore for KeyringStore {
    fn get(&self, identity: &str) -> Result<Option<Secret>, VaultError> {
        let envelope = match self.entry(identity)?.get_password() {
            Ok(envelope) => envelope,
            Err(keyring::Error::NoEntry) => {
                debug!("No keyring entry for {identity}");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let envelope: Envelope = serde_json::from_str(&envelope)
            .map_err(|e| VaultError::Corrupt(format!("{identity}: {e}")))?;
        let payload = STANDARD
            .decode(envelope.payload)
            .map_err(|e| VaultError::Corrupt(format!("{identity}: {e}")))?;

        debug!("Read keyring entry for {identity}");
        Ok(Some(Secret {
            payload,
            last_written: envelope.written_at,
        }))
    }

    fn put(&self, identity: &str, payload: &[u8]) -> Result<DateTime<Utc>, VaultError> {
        let written_at = Utc::now();
        let envelope = Envelope {
            written_at,
            payload: STANDARD.encode(payload),
        };
        let envelope = serde_json::to_string(&envelope)
            .map_err(|e| VaultError::Keyring(keyring::Error::PlatformFailure(Box::new(e))))?;

        self.entry(identity)?.set_password(&envelope)?;
        debug!("Stored keyring entry for {identity}");
        Ok(written_at)
    }

    fn delete(&self, identity: &str) -> Result<bool, VaultError> {
        match self.entry(identity)?.delete_credential() {
            Ok(()) => {
                debug!("Deleted keyring entry for {identity}");
                Ok(true)
            }
            Err(keyring::Error::NoEntry) => {
                debug!("No keyring entry to delete for {identity}");
                Ok(false)
            }
            Err(e) => {
                warn!("Failed to delete keyring entry: {e}");
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    // Note: These tests interact with the actual system keyring.
    // They are marked as ignored by default to avoid polluting the keyring
    // during automated testing. Run manually with `cargo test -- --ignored`

    use super::*;

    const TEST_IDENTITY: &str = "git:https://sendgmail.invalid/keyring-test";

    #[test]
    #[ignore = "Interacts with system keyring"]
    fn test_store_and_retrieve_payload() {
        let store = KeyringStore::new("sendgmail-test");
        let written_at = store.put(TEST_IDENTITY, b"{\"client_id\":\"x\"}").unwrap();

        let secret = store.get(TEST_IDENTITY).unwrap().unwrap();
        assert_eq!(secret.payload, b"{\"client_id\":\"x\"}");
        assert_eq!(secret.last_written, written_at);

        assert!(store.delete(TEST_IDENTITY).unwrap());
        assert!(store.get(TEST_IDENTITY).unwrap().is_none());
        assert!(!store.delete(TEST_IDENTITY).unwrap());
    }

    #[test]
    fn test_envelope_keeps_timestamp_out_of_payload() {
        let envelope = Envelope {
            written_at: Utc::now(),
            payload: STANDARD.encode(b"{}"),
        };
        let json = serde_json::to_string(&envelope).unwrap();
        let decoded: Envelope = serde_json::from_str(&json).unwrap();

        assert_eq!(decoded.written_at, envelope.written_at);
        assert_eq!(STANDARD.decode(decoded.payload).unwrap(), b"{}");
    }
}
