//! Line framing over a byte stream.
//!
//! [`LineFramer`] splits arbitrary-sized transport chunks into complete
//! newline-terminated lines, buffering any trailing partial line until more
//! data arrives. A bounded buffer protects against peers that never send a
//! terminator: when the limit is exceeded the partial data is discarded, a
//! [`ProtocolError::LineTooLong`] is reported, and the framer resynchronizes
//! at the next line terminator.

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};

use crate::error::{self, ProtocolError};

/// Maximum length of one protocol line, including CRLF (RFC 1459).
pub const MAX_LINE_LEN: usize = 512;

/// Codec that frames newline-terminated protocol lines.
pub struct LineFramer {
    /// Index of next byte to check for a newline.
    next_index: usize,
    /// Maximum buffered line length.
    max_len: usize,
    /// Set after an overflow; input is dropped until the next terminator.
    discarding: bool,
}

impl LineFramer {
    /// Create a framer with the standard 512-byte limit.
    pub fn new() -> Self {
        Self::with_max_len(MAX_LINE_LEN)
    }

    /// Create a framer with a custom line length limit.
    pub fn with_max_len(max_len: usize) -> Self {
        Self {
            next_index: 0,
            max_len,
            discarding: false,
        }
    }

    /// The configured line length limit.
    pub fn max_len(&self) -> usize {
        self.max_len
    }
}

impl Default for LineFramer {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for LineFramer {
    type Item = String;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> error::Result<Option<String>> {
        loop {
            let Some(offset) = src[self.next_index..].iter().position(|b| *b == b'\n') else {
                self.next_index = src.len();

                // Partial line already over the limit: discard it now rather
                // than letting the buffer grow, and resync at the next '\n'.
                if src.len() > self.max_len {
                    let actual = src.len();
                    src.clear();
                    self.next_index = 0;
                    self.discarding = true;
                    return Err(ProtocolError::LineTooLong {
                        actual,
                        limit: self.max_len,
                    });
                }

                return Ok(None);
            };

            let line = src.split_to(self.next_index + offset + 1);
            self.next_index = 0;

            // Tail of a previously discarded overlong line.
            if self.discarding {
                self.discarding = false;
                continue;
            }

            if line.len() > self.max_len {
                return Err(ProtocolError::LineTooLong {
                    actual: line.len(),
                    limit: self.max_len,
                });
            }

            let line_vec = line.to_vec();
            let data =
                String::from_utf8(line_vec).map_err(|e| ProtocolError::InvalidUtf8 {
                    byte_pos: e.utf8_error().valid_up_to(),
                })?;

            return Ok(Some(data));
        }
    }
}

impl Encoder<String> for LineFramer {
    type Error = ProtocolError;

    fn encode(&mut self, msg: String, dst: &mut BytesMut) -> error::Result<()> {
        dst.extend(msg.into_bytes());
        Ok(())
    }
}
