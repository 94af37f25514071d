//! Newline-delimited codec for TCP framing
//!
//! All messages are framed as a single line of ASCII text:
//! ```text
//! [ N bytes: token ][ '\n' ]
//! ```
//!
//! A `\r` immediately before the newline is stripped, so controllers that
//! write CR LF are understood as well.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use thiserror::Error;

/// Maximum line length (1 KiB) before the decoder gives up on a line
pub const MAX_LINE_LEN: usize = 1024;

/// Errors that can occur during encoding/decoding
#[derive(Error, Debug, PartialEq, Eq)]
pub enum CodecError {
    #[error("Line too long: {0} bytes without a newline (max: {MAX_LINE_LEN})")]
    LineTooLong(usize),

    #[error("Line contains an embedded newline")]
    EmbeddedNewline,
}

/// Encode a line of text, appending the newline terminator
pub fn encode_line(line: &str) -> Result<Bytes, CodecError> {
    let mut buf = BytesMut::with_capacity(line.len() + 1);
    encode_into(line, &mut buf)?;
    Ok(buf.freeze())
}

/// Encode a line directly into a provided buffer
pub fn encode_into(line: &str, buf: &mut BytesMut) -> Result<(), CodecError> {
    if line.contains('\n') {
        return Err(CodecError::EmbeddedNewline);
    }
    if line.len() > MAX_LINE_LEN {
        return Err(CodecError::LineTooLong(line.len()));
    }

    buf.reserve(line.len() + 1);
    buf.put_slice(line.as_bytes());
    buf.put_u8(b'\n');

    Ok(())
}

/// Try to decode one newline-terminated line from a buffer
///
/// Returns:
/// - `Ok(Some(line))` if a complete line was decoded (terminator removed)
/// - `Ok(None)` if more data is needed
/// - `Err(...)` if a terminated line is too long; it is discarded through
///   its newline so decoding can resume afterwards
///
/// Unterminated data is left in place whatever its length. [`LineDecoder`]
/// bounds it and skips the rest of an overflowing line.
pub fn decode(buf: &mut BytesMut) -> Result<Option<String>, CodecError> {
    let Some(pos) = buf.iter().position(|b| *b == b'\n') else {
        return Ok(None);
    };

    if pos > MAX_LINE_LEN {
        buf.advance(pos + 1);
        return Err(CodecError::LineTooLong(pos));
    }

    let mut line = buf.split_to(pos);
    buf.advance(1);

    if line.last() == Some(&b'\r') {
        line.truncate(line.len() - 1);
    }

    // Non-ASCII input never matches a token, lossy conversion is enough
    Ok(Some(String::from_utf8_lossy(&line).into_owned()))
}

/// Decoder state machine for streaming decoding
#[derive(Debug, Default)]
pub struct LineDecoder {
    /// Partial line data being accumulated
    buffer: BytesMut,
    /// Set after an overflow; input is dropped through the next newline
    discarding: bool,
}

impl LineDecoder {
    /// Create a new line decoder
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::with_capacity(4096),
            discarding: false,
        }
    }

    /// Add data to the decoder buffer
    pub fn extend(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Try to decode the next line from the buffer
    ///
    /// Call this repeatedly until it returns `Ok(None)` to drain all complete lines
    pub fn decode_next(&mut self) -> Result<Option<String>, CodecError> {
        if self.discarding {
            match self.buffer.iter().position(|b| *b == b'\n') {
                Some(pos) => {
                    self.buffer.advance(pos + 1);
                    self.discarding = false;
                }
                None => {
                    self.buffer.clear();
                    return Ok(None);
                }
            }
        }

        match decode(&mut self.buffer)? {
            None if self.buffer.len() > MAX_LINE_LEN => {
                let len = self.buffer.len();
                self.buffer.clear();
                self.discarding = true;
                Err(CodecError::LineTooLong(len))
            }
            line => Ok(line),
        }
    }

    /// Get the current buffer length (bytes of an unterminated line)
    pub fn buffer_len(&self) -> usize {
        self.buffer.len()
    }
}
