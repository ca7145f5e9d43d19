//! Stored credentials.
//!
//! The OS credential vault is reached through the [`SecretStore`] trait;
//! [`TokenStore`] maps a [`Token`](sendgmail_oauth::Token) onto one vault
//! entry.

pub mod credentials;
mod memory;
mod token_store;

pub use credentials::{KeyringStore, Secret, SecretStore, VaultError};
pub use memory::MemoryStore;
pub use token_store::TokenStore;
