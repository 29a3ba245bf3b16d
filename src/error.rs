//! Error types for the session engine.
//!
//! Three layers: [`ProtocolError`] for framing/resource conditions,
//! [`MessageParseError`] for per-line decode failures (always soft; the
//! connection keeps processing subsequent lines), and [`EncodeError`] for
//! outbound command validation.

use thiserror::Error;

/// Convenience type alias for Results using [`ProtocolError`].
pub type Result<T, E = ProtocolError> = std::result::Result<T, E>;

/// Framing and resource errors.
///
/// `LineTooLong` is deliberately distinct from parse failures: it signals a
/// framing/resource concern (a peer that never terminates a line), not a
/// malformed message.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProtocolError {
    /// I/O error during reading or writing.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A buffered line exceeded the maximum length without a terminator.
    ///
    /// The framer discards the partial data and resynchronizes at the next
    /// line terminator.
    #[error("line too long: {actual} bytes buffered (limit: {limit})")]
    LineTooLong {
        /// Bytes buffered when the limit was hit.
        actual: usize,
        /// Maximum allowed line length.
        limit: usize,
    },

    /// Invalid UTF-8 bytes in a framed line.
    #[error("invalid UTF-8 in line at byte {byte_pos}")]
    InvalidUtf8 {
        /// Byte position where UTF-8 validation failed.
        byte_pos: usize,
    },

    /// Failed to parse an IRC message.
    #[error("invalid message: {string}")]
    InvalidMessage {
        /// The invalid message string.
        string: String,
        /// The underlying parse error.
        #[source]
        cause: MessageParseError,
    },
}

/// Errors encountered when decoding one protocol line.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum MessageParseError {
    /// Line was empty (or whitespace only).
    #[error("empty message")]
    EmptyMessage,

    /// Command token was missing or not `1*letter / 3digit`.
    #[error("invalid command")]
    InvalidCommand,

    /// Message prefix could not be split into sender components.
    #[error("invalid prefix: {0}")]
    InvalidPrefix(String),

    /// Parsing failed at a specific position.
    #[error("parsing failed at position {position}: {context}")]
    ParseContext {
        /// Character position where parsing failed.
        position: usize,
        /// Description of what was being parsed.
        context: String,
    },
}

/// Errors produced by the outbound command encoder.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum EncodeError {
    /// A required target/channel field was empty.
    #[error("empty {0} is not a valid command target")]
    EmptyTarget(&'static str),

    /// Encoded line would exceed the protocol maximum.
    ///
    /// The encoder never truncates silently; truncation policy belongs to
    /// the caller.
    #[error("encoded line is {actual} bytes (limit: {limit})")]
    LineTooLong {
        /// Encoded length including CRLF.
        actual: usize,
        /// Maximum allowed length.
        limit: usize,
    },

    /// A field contained CR, LF, or NUL, which would break line framing.
    #[error("illegal line break or NUL in {0}")]
    IllegalCharacter(&'static str),
}
