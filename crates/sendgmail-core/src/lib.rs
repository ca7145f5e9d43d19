//! # sendgmail-core
//!
//! Credential lifecycle and send pipeline for relaying mail through the
//! Gmail API.
//!
//! This crate provides:
//! - Token persistence in the OS credential vault
//! - `OAuth2` token lifecycle: first-run enrollment, authorization-code
//!   exchange, refresh, forced expiry
//! - The send call, with one automatic refresh on a rejected token and
//!   interactive retries on other failures
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use sendgmail_core::{KeyringStore, Relay, RelayConfig, terminal::Detached};
//! use sendgmail_mime::RawMessage;
//!
//! let config = RelayConfig::gmail()?;
//! let mut relay = Relay::from_config(&config, Arc::new(KeyringStore::default()), Arc::new(Detached));
//! let message = RawMessage::from_reader(std::io::stdin().lock())?;
//! relay.send(&message).await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod account;
pub mod auth;
pub mod config;
mod error;
pub mod service;
pub mod terminal;

pub use account::{KeyringStore, MemoryStore, Secret, SecretStore, TokenStore, VaultError};
pub use auth::{TokenManager, TokenState};
pub use config::RelayConfig;
pub use error::{Error, Result};
pub use service::{Relay, RetryBudget};
pub use terminal::Terminal;
