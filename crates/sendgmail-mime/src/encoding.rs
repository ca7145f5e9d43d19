//! Base64url encoding (RFC 4648 §5).
//!
//! [`Base64UrlWriter`] encodes a byte stream of any length while holding at
//! most one incomplete quantum between writes, so a message never has to be
//! loaded into memory before it is encoded. Output uses the `-`/`_` alphabet,
//! carries no line breaks and ends with standard `=` padding.

use crate::error::Result;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE;
use std::io::{self, Read, Write};

/// Base64url alphabet, indexed by 6-bit group value.
const ALPHABET: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";

/// Padding character.
const PAD: u8 = b'=';

/// Number of quanta encoded into one write on the inner sink.
const QUANTA_PER_CHUNK: usize = 256;

/// Packs up to three bytes into the high end of a 24-bit quantum.
fn pack(bytes: &[u8]) -> u32 {
    bytes
        .iter()
        .take(3)
        .enumerate()
        .fold(0, |quantum, (i, &b)| quantum | (u32::from(b) << (16 - 8 * i)))
}

/// Splits a 24-bit quantum into four alphabet characters.
fn encode_quantum(quantum: u32) -> [u8; 4] {
    [
        ALPHABET[((quantum >> 18) & 0x3F) as usize],
        ALPHABET[((quantum >> 12) & 0x3F) as usize],
        ALPHABET[((quantum >> 6) & 0x3F) as usize],
        ALPHABET[(quantum & 0x3F) as usize],
    ]
}

/// Returns the encoded length of `input_len` bytes, padding included.
#[must_use]
pub const fn encoded_len(input_len: u64) -> u64 {
    input_len.div_ceil(3) * 4
}

/// A [`Write`] adapter that base64url-encodes everything written to it.
///
/// Bytes that do not yet form a full 3-byte quantum are kept until the next
/// write. Call [`finish`](Self::finish) once the input is exhausted to emit
/// the final partial quantum with its padding; dropping the writer without
/// finishing loses up to two trailing input bytes.
///
/// The writer does not own the sink's framing: callers may write literal
/// bytes to the sink before creating the writer and after finishing it.
#[derive(Debug)]
pub struct Base64UrlWriter<W: Write> {
    inner: W,
    pending: [u8; 2],
    pending_len: usize,
    consumed: u64,
}

impl<W: Write> Base64UrlWriter<W> {
    /// Creates an encoder writing into `inner`.
    pub const fn new(inner: W) -> Self {
        Self {
            inner,
            pending: [0; 2],
            pending_len: 0,
            consumed: 0,
        }
    }

    /// Number of input bytes accepted so far.
    #[must_use]
    pub const fn bytes_consumed(&self) -> u64 {
        self.consumed
    }

    /// Emits the trailing partial quantum and returns the inner sink.
    ///
    /// One leftover byte becomes two characters and `==`; two leftover
    /// bytes become three characters and `=`.
    ///
    /// # Errors
    ///
    /// Returns any error raised by the inner sink.
    pub fn finish(mut self) -> io::Result<W> {
        if self.pending_len > 0 {
            let mut out = encode_quantum(pack(&self.pending[..self.pending_len]));
            for slot in &mut out[self.pending_len + 1..] {
                *slot = PAD;
            }
            self.inner.write_all(&out)?;
        }
        Ok(self.inner)
    }

    fn write_quanta(&mut self, input: &[u8]) -> io::Result<()> {
        let mut out = [0u8; QUANTA_PER_CHUNK * 4];
        let mut filled = 0;

        for quantum in input.chunks_exact(3) {
            out[filled..filled + 4].copy_from_slice(&encode_quantum(pack(quantum)));
            filled += 4;
            if filled == out.len() {
                self.inner.write_all(&out)?;
                filled = 0;
            }
        }

        if filled > 0 {
            self.inner.write_all(&out[..filled])?;
        }
        Ok(())
    }
}

impl<W: Write> Write for Base64UrlWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut input = buf;

        if self.pending_len > 0 {
            let missing = 3 - self.pending_len;
            if input.len() < missing {
                let end = self.pending_len + input.len();
                self.pending[self.pending_len..end].copy_from_slice(input);
                self.pending_len = end;
                self.consumed += buf.len() as u64;
                return Ok(buf.len());
            }

            let mut quantum = [0u8; 3];
            quantum[..self.pending_len].copy_from_slice(&self.pending[..self.pending_len]);
            quantum[self.pending_len..].copy_from_slice(&input[..missing]);
            self.inner.write_all(&encode_quantum(pack(&quantum)))?;
            self.pending_len = 0;
            input = &input[missing..];
        }

        let whole = input.len() - input.len() % 3;
        self.write_quanta(&input[..whole])?;

        let rest = &input[whole..];
        self.pending[..rest.len()].copy_from_slice(rest);
        self.pending_len = rest.len();
        self.consumed += buf.len() as u64;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Encodes all of `input` into `output`, padding included.
///
/// The input is read front to back exactly once through a fixed-size
/// buffer. Returns the number of input bytes consumed.
///
/// # Errors
///
/// Returns the first I/O error from either side.
pub fn encode_stream<R, W>(input: &mut R, output: &mut W) -> io::Result<u64>
where
    R: Read + ?Sized,
    W: Write + ?Sized,
{
    let mut writer = Base64UrlWriter::new(output);
    let consumed = io::copy(input, &mut writer)?;
    writer.finish()?;
    Ok(consumed)
}

/// Encodes data as base64url.
#[must_use]
pub fn encode_base64url(data: &[u8]) -> String {
    let mut writer = Base64UrlWriter::new(Vec::with_capacity(
        usize::try_from(encoded_len(data.len() as u64)).unwrap_or_default(),
    ));
    // Writing into a Vec cannot fail.
    let out = writer
        .write_all(data)
        .and_then(|()| writer.finish())
        .unwrap_or_default();
    out.into_iter().map(char::from).collect()
}

/// Decodes padded base64url data.
///
/// # Errors
///
/// Returns an error if the input is not valid base64url.
pub fn decode_base64url(data: &str) -> Result<Vec<u8>> {
    URL_SAFE.decode(data).map_err(Into::into)
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::needless_collect,
    clippy::cast_possible_truncation
)]
mod tests {
    use super::*;
    use proptest::collection::vec;
    use proptest::prelude::*;

    fn encode_in_chunks(data: &[u8], cuts: &[usize]) -> Vec<u8> {
        let mut cuts: Vec<usize> = cuts.iter().map(|c| c % (data.len() + 1)).collect();
        cuts.sort_unstable();

        let mut writer = Base64UrlWriter::new(Vec::new());
        let mut start = 0;
        for cut in cuts {
            writer.write_all(&data[start..cut]).unwrap();
            start = cut;
        }
        writer.write_all(&data[start..]).unwrap();
        writer.finish().unwrap()
    }

    #[test]
    fn test_rfc4648_vectors() {
        let vectors = [
            ("", ""),
            ("f", "Zg=="),
            ("fo", "Zm8="),
            ("foo", "Zm9v"),
            ("foob", "Zm9vYg=="),
            ("fooba", "Zm9vYmE="),
            ("foobar", "Zm9vYmFy"),
        ];
        for (input, expected) in vectors {
            assert_eq!(encode_base64url(input.as_bytes()), expected, "input {input:?}");
        }
    }

    #[test]
    fn test_url_safe_alphabet() {
        // Standard base64 would produce "+/8=".
        assert_eq!(encode_base64url(&[0xfb, 0xff]), "-_8=");
        assert_eq!(encode_base64url(&[0xff, 0xff, 0xff]), "____");
        assert_eq!(encode_base64url(&[0xf8, 0x00, 0x00]), "-AAA");
    }

    #[test]
    fn test_single_byte_writes_keep_pending_quantum() {
        let mut writer = Base64UrlWriter::new(Vec::new());
        for b in b"Hello" {
            writer.write_all(&[*b]).unwrap();
        }
        assert_eq!(writer.bytes_consumed(), 5);
        let out = writer.finish().unwrap();
        assert_eq!(out, b"SGVsbG8=");
    }

    #[test]
    fn test_literal_framing_around_encoder() {
        let mut sink = b"<".to_vec();
        let mut writer = Base64UrlWriter::new(&mut sink);
        writer.write_all(b"Hi").unwrap();
        writer.finish().unwrap();
        sink.push(b'>');
        assert_eq!(sink, b"<SGk=>");
    }

    #[test]
    fn test_encode_stream_reports_consumed_bytes() {
        let data = vec![7u8; 100_000];
        let mut out = Vec::new();
        let consumed = encode_stream(&mut data.as_slice(), &mut out).unwrap();
        assert_eq!(consumed, 100_000);
        assert_eq!(out.len() as u64, encoded_len(100_000));
    }

    #[test]
    fn test_sink_error_propagates() {
        struct Broken;
        impl Write for Broken {
            fn write(&mut self, _: &[u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
            }
            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let err = encode_stream(&mut &b"abcdef"[..], &mut Broken).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }

    #[test]
    fn test_decode_rejects_standard_alphabet() {
        assert!(decode_base64url("+/8=").is_err());
        assert_eq!(decode_base64url("-_8=").unwrap(), vec![0xfb, 0xff]);
    }

    proptest! {
        #[test]
        fn prop_round_trip(data in vec(any::<u8>(), 0..2048)) {
            let encoded = encode_base64url(&data);
            prop_assert_eq!(decode_base64url(&encoded).unwrap(), data);
        }

        #[test]
        fn prop_length_and_padding(data in vec(any::<u8>(), 0..512)) {
            let encoded = encode_base64url(&data);
            prop_assert_eq!(encoded.len() as u64, encoded_len(data.len() as u64));

            let padding = encoded.bytes().rev().take_while(|&b| b == PAD).count();
            let expected = [0, 2, 1][data.len() % 3];
            prop_assert_eq!(padding, expected);
            prop_assert!(!encoded.trim_end_matches('=').contains('='));
            prop_assert!(!encoded.contains('\n'));
        }

        #[test]
        fn prop_chunking_is_invisible(
            data in vec(any::<u8>(), 0..1024),
            cuts in vec(any::<usize>(), 0..16),
        ) {
            let whole = encode_base64url(&data);
            let chunked = encode_in_chunks(&data, &cuts);
            prop_assert_eq!(whole.as_bytes(), chunked.as_slice());
        }

        #[test]
        fn prop_matches_base64_crate(data in vec(any::<u8>(), 0..1024)) {
            prop_assert_eq!(encode_base64url(&data), URL_SAFE.encode(&data));
        }
    }
}
