//! CTCP message handling.
//!
//! CTCP requests and replies travel inside PRIVMSG/NOTICE bodies between
//! `\x01` delimiters. The dispatcher uses [`Ctcp::parse`] to pull ACTION
//! text out of inbound messages and classify the rest; the encoder uses
//! the constructors to wrap outbound requests.
//!
//! # Reference
//! - CTCP specification: <https://modern.ircdocs.horse/ctcp.html>

use std::fmt;

/// The CTCP delimiter character (`\x01`).
pub(crate) const CTCP_DELIM: char = '\x01';

/// CTCP command types the engine gives names to.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum CtcpKind {
    /// ACTION, the `/me` message.
    Action,
    /// VERSION request/reply.
    Version,
    /// PING latency probe.
    Ping,
    /// TIME request/reply.
    Time,
    /// CLIENTINFO request/reply.
    Clientinfo,
    /// Anything else, name preserved as received.
    Unknown(String),
}

impl CtcpKind {
    /// Classify a CTCP command name.
    pub fn parse(name: &str) -> Self {
        match name.to_ascii_uppercase().as_str() {
            "ACTION" => Self::Action,
            "VERSION" => Self::Version,
            "PING" => Self::Ping,
            "TIME" => Self::Time,
            "CLIENTINFO" => Self::Clientinfo,
            _ => Self::Unknown(name.to_owned()),
        }
    }

    /// Canonical uppercase name.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Action => "ACTION",
            Self::Version => "VERSION",
            Self::Ping => "PING",
            Self::Time => "TIME",
            Self::Clientinfo => "CLIENTINFO",
            Self::Unknown(s) => s,
        }
    }
}

impl fmt::Display for CtcpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A CTCP message borrowed from a PRIVMSG/NOTICE body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ctcp<'a> {
    /// Command type.
    pub kind: CtcpKind,
    /// Text after the command, if any.
    pub params: Option<&'a str>,
}

impl<'a> Ctcp<'a> {
    /// Parse a message body as CTCP.
    ///
    /// Returns `None` when the body is not CTCP-delimited. A missing
    /// trailing delimiter is tolerated; some clients omit it.
    pub fn parse(text: &'a str) -> Option<Self> {
        let text = text.strip_prefix(CTCP_DELIM)?;
        let text = text.strip_suffix(CTCP_DELIM).unwrap_or(text);

        if text.is_empty() {
            return None;
        }

        let (command, params) = match text.find(' ') {
            Some(pos) => {
                let rest = &text[pos + 1..];
                (&text[..pos], (!rest.is_empty()).then_some(rest))
            }
            None => (text, None),
        };

        Some(Self {
            kind: CtcpKind::parse(command),
            params,
        })
    }

    /// Whether a message body starts a CTCP message.
    #[inline]
    pub fn is_ctcp(text: &str) -> bool {
        text.starts_with(CTCP_DELIM)
    }

    /// An ACTION message.
    pub fn action(text: &'a str) -> Self {
        Self {
            kind: CtcpKind::Action,
            params: Some(text),
        }
    }

    /// A VERSION request.
    pub fn version() -> Self {
        Self {
            kind: CtcpKind::Version,
            params: None,
        }
    }

    /// A PING request carrying a timestamp token.
    pub fn ping(token: &'a str) -> Self {
        Self {
            kind: CtcpKind::Ping,
            params: Some(token),
        }
    }
}

impl fmt::Display for Ctcp<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\x01{}", self.kind)?;
        if let Some(params) = self.params {
            write!(f, " {}", params)?;
        }
        write!(f, "\x01")
    }
}
