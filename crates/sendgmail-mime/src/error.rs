//! Error types for message encoding.

/// Result type alias for encoding operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Encoding error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Reading the message or writing the encoded output failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Base64url decode error.
    #[error("Base64 decode error: {0}")]
    Base64Decode(#[from] base64::DecodeError),
}
