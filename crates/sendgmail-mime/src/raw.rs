//! The `{"raw": ...}` request body of the Gmail `messages.send` call.
//!
//! The body is written as literal JSON framing around a streamed base64url
//! encoding of the message, so the encoded field is never assembled
//! separately from the body that carries it.

use crate::encoding::Base64UrlWriter;
use crate::error::Result;
use bytes::Bytes;
use std::io::{self, BufReader, Read, Write};

/// JSON framing written before the encoded message.
const RAW_PREFIX: &[u8] = b"{\"raw\":\"";

/// JSON framing written after the encoded message.
const RAW_SUFFIX: &[u8] = b"\"}";

/// Read buffer size used when pulling the message from its source.
const INPUT_BUFFER_SIZE: usize = 0x10000;

/// Writes `{"raw":"<base64url of input>"}` into `output`.
///
/// Returns the number of message bytes read from `input`.
///
/// # Errors
///
/// Returns the first I/O error from either side.
pub fn write_raw_body<R, W>(input: &mut R, output: &mut W) -> io::Result<u64>
where
    R: Read + ?Sized,
    W: Write + ?Sized,
{
    output.write_all(RAW_PREFIX)?;
    let mut encoder = Base64UrlWriter::new(&mut *output);
    let consumed = io::copy(input, &mut encoder)?;
    encoder.finish()?;
    output.write_all(RAW_SUFFIX)?;
    Ok(consumed)
}

/// An encoded message, ready to be sent as a request body.
///
/// The body is cheap to clone, so the same bytes can be resent when a
/// request is retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMessage {
    body: Bytes,
    message_len: u64,
}

impl RawMessage {
    /// Reads a whole message from `reader` and encodes it.
    ///
    /// # Errors
    ///
    /// Returns an error if reading the message fails.
    pub fn from_reader(reader: impl Read) -> Result<Self> {
        let mut input = BufReader::with_capacity(INPUT_BUFFER_SIZE, reader);
        let mut body = Vec::new();
        let message_len = write_raw_body(&mut input, &mut body)?;
        Ok(Self {
            body: body.into(),
            message_len,
        })
    }

    /// Encodes a message that is already in memory.
    #[must_use]
    pub fn from_bytes(message: &[u8]) -> Self {
        let mut body = Vec::with_capacity(message.len() * 4 / 3 + 16);
        // Reading from a slice into a Vec cannot fail.
        let message_len = write_raw_body(&mut &message[..], &mut body).unwrap_or_default();
        Self {
            body: body.into(),
            message_len,
        }
    }

    /// The JSON request body.
    #[must_use]
    pub fn body(&self) -> Bytes {
        self.body.clone()
    }

    /// Size of the unencoded message in bytes.
    #[must_use]
    pub const fn message_len(&self) -> u64 {
        self.message_len
    }

    /// Returns true if the message was empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.message_len == 0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::encoding::decode_base64url;

    #[test]
    fn test_two_byte_message() {
        let raw = RawMessage::from_bytes(b"Hi");
        assert_eq!(&raw.body()[..], br#"{"raw":"SGk="}"#);
        assert_eq!(raw.message_len(), 2);
    }

    #[test]
    fn test_empty_message() {
        let raw = RawMessage::from_reader(io::empty()).unwrap();
        assert_eq!(&raw.body()[..], br#"{"raw":""}"#);
        assert!(raw.is_empty());
    }

    #[test]
    fn test_body_is_valid_json_and_decodes() {
        let message = b"From: a@example.com\r\nTo: b@example.com\r\nSubject: ?>>\r\n\r\n\xff\xfe body\r\n";
        let raw = RawMessage::from_reader(&message[..]).unwrap();

        let body = raw.body();
        let text = std::str::from_utf8(&body).unwrap();
        let field = text
            .strip_prefix(r#"{"raw":""#)
            .and_then(|rest| rest.strip_suffix(r#""}"#))
            .unwrap();

        assert!(!field.contains(['+', '/', '\n', '"']));
        assert_eq!(decode_base64url(field).unwrap(), message);
    }

    #[test]
    fn test_large_message_streams_through_buffer() {
        let message = vec![b'x'; INPUT_BUFFER_SIZE * 3 + 1];
        let raw = RawMessage::from_reader(message.as_slice()).unwrap();
        assert_eq!(raw.message_len(), message.len() as u64);
        assert!(raw.body().ends_with(b"==\"}"));
    }
}
