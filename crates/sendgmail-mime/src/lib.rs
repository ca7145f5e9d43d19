//! # sendgmail-mime
//!
//! Turns an RFC 2822 message into the request body of the Gmail API
//! `messages.send` call.
//!
//! ## Features
//!
//! - **Streaming base64url**: RFC 4648 §5 encoding over any [`std::io::Write`]
//!   sink, holding at most two input bytes between writes
//! - **Request body**: `{"raw":"..."}` written around the encoder without
//!   building the encoded field separately
//!
//! ## Quick Start
//!
//! ```ignore
//! use sendgmail_mime::RawMessage;
//!
//! let raw = RawMessage::from_reader(std::io::stdin().lock())?;
//! assert!(raw.body().starts_with(b"{\"raw\":\""));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod encoding;
mod error;
pub mod raw;

pub use encoding::{Base64UrlWriter, decode_base64url, encode_base64url, encode_stream};
pub use error::{Error, Result};
pub use raw::{RawMessage, write_raw_body};
