//! In-process vault.

use super::credentials::{Secret, SecretStore, VaultError};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// [`SecretStore`] that keeps entries in memory for the life of the value.
///
/// Nothing is persisted. Useful for tests and for embedding the relay where
/// credentials are managed by the caller.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Secret>>,
    writes: Mutex<usize>,
    unavailable: Option<String>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store whose every operation fails with `reason`.
    #[must_use]
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            unavailable: Some(reason.into()),
            ..Self::default()
        }
    }

    /// Seeds an entry with an explicit write time.
    pub fn insert(&self, identity: impl Into<String>, payload: impl Into<Vec<u8>>, last_written: DateTime<Utc>) {
        lock(&self.entries).insert(
            identity.into(),
            Secret {
                payload: payload.into(),
                last_written,
            },
        );
    }

    /// Number of successful `put` calls.
    #[must_use]
    pub fn write_count(&self) -> usize {
        *lock(&self.writes)
    }

    fn check(&self) -> Result<(), VaultError> {
        match &self.unavailable {
            Some(reason) => Err(VaultError::Unavailable(reason.clone())),
            None => Ok(()),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl SecretStore for MemoryStore {
    fn get(&self, identity: &str) -> Result<Option<Secret>, VaultError> {
        self.check()?;
        Ok(lock(&self.entries).get(identity).cloned())
    }

    fn put(&self, identity: &str, payload: &[u8]) -> Result<DateTime<Utc>, VaultError> {
        self.check()?;
        let last_written = Utc::now();
        self.insert(identity, payload, last_written);
        *lock(&self.writes) += 1;
        Ok(last_written)
    }

    fn delete(&self, identity: &str) -> Result<bool, VaultError> {
        self.check()?;
        Ok(lock(&self.entries).remove(identity).is_some())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_entry_is_not_an_error() {
        let store = MemoryStore::new();
        assert!(store.get("git:x").unwrap().is_none());
        assert!(!store.delete("git:x").unwrap());
    }

    #[test]
    fn test_put_replaces_and_counts() {
        let store = MemoryStore::new();
        store.put("git:x", b"one").unwrap();
        let written = store.put("git:x", b"two").unwrap();

        let secret = store.get("git:x").unwrap().unwrap();
        assert_eq!(secret.payload, b"two");
        assert_eq!(secret.last_written, written);
        assert_eq!(store.write_count(), 2);
    }

    #[test]
    fn test_unavailable_store_fails_everything() {
        let store = MemoryStore::unavailable("locked");
        assert!(matches!(store.get("git:x"), Err(VaultError::Unavailable(_))));
        assert!(store.put("git:x", b"").is_err());
        assert!(store.delete("git:x").is_err());
    }
}
