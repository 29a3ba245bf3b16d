//! Engine output: typed message records, lifecycle events, and actions.
//!
//! Every processing step ends by handing zero or more [`Action`] values to
//! the caller, in emission order. A [`MessageRecord`] is immutable once
//! emitted; the consuming collaborator owns it thereafter.

use chrono::{DateTime, Utc};

use crate::whois::WhoisResult;

/// Discriminant of a [`MessageRecord`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MessageKind {
    /// Ordinary channel/user message.
    Privmsg,
    /// CTCP ACTION ("/me").
    Action,
    /// NOTICE.
    Notice,
    /// Named protocol event rendered as text (join, part, topic change).
    Event,
    /// Error condition (ERR_* numerics, parse failures, ERROR command).
    Error,
    /// Unclassified server data, tagged with a [`RawCategory`].
    Raw,
    /// Non-ACTION CTCP request or reply.
    Ctcp,
    /// Engine-internal notification.
    System,
}

/// Display-filtering tag for raw-category records.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RawCategory {
    /// Server banners, stats, MOTD, links, version.
    Server,
    /// Channel listings, list-mode entries.
    Channel,
    /// WHOIS/WHOWAS, away, user modes, monitor/watch.
    User,
    /// SASL and account progress.
    Auth,
}

/// One emitted message record.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MessageRecord {
    /// Record discriminant.
    pub kind: MessageKind,
    /// Free-form text.
    pub text: String,
    /// Channel or nick this record belongs to, when attributable.
    pub target: Option<String>,
    /// Nickname or server the record originated from, when known.
    pub sender: Option<String>,
    /// Emission time (or the `server-time` tag value when present).
    pub timestamp: DateTime<Utc>,
    /// Display-filtering tag; always set for `Raw` records.
    pub category: Option<RawCategory>,
}

impl MessageRecord {
    /// New record stamped with the current time.
    pub fn new(kind: MessageKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
            target: None,
            sender: None,
            timestamp: Utc::now(),
            category: None,
        }
    }

    /// Raw-category record.
    pub fn raw(category: RawCategory, text: impl Into<String>) -> Self {
        let mut rec = Self::new(MessageKind::Raw, text);
        rec.category = Some(category);
        rec
    }

    /// Error record.
    pub fn error(text: impl Into<String>) -> Self {
        Self::new(MessageKind::Error, text)
    }

    /// Set the target channel/nick.
    #[must_use]
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    /// Set the sender.
    #[must_use]
    pub fn with_sender(mut self, sender: impl Into<String>) -> Self {
        self.sender = Some(sender.into());
        self
    }

    /// Override the timestamp (used for `server-time` tagged lines).
    #[must_use]
    pub fn with_timestamp(mut self, ts: DateTime<Utc>) -> Self {
        self.timestamp = ts;
        self
    }
}

/// Named lifecycle events delivered alongside records.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Event {
    /// Registration completed (001 received). Emitted exactly once.
    Registered,
    /// Capability negotiation finished; enabled set is final.
    CapsNegotiated,
    /// Membership map for a channel was replaced (end of NAMES).
    UsersUpdated(String),
    /// Our nickname changed (includes collision retries once registered).
    NickChanged(String),
    /// A WHOIS/WHOWAS aggregation completed.
    WhoisComplete(Box<WhoisResult>),
    /// Registration failed terminally (nick retries exhausted, fatal ERROR,
    /// or SASL failure with `require_sasl`).
    RegistrationFailed(String),
    /// Server terminated the connection (ERROR command).
    Disconnected(String),
}

/// Output unit of one engine processing step.
///
/// The caller sends `Send` lines to the transport and forwards `Record`/
/// `Event` values to its listeners, preserving order.
#[derive(Clone, Debug, PartialEq)]
pub enum Action {
    /// Write this line (CRLF included) to the connection.
    Send(String),
    /// Publish this record.
    Record(Box<MessageRecord>),
    /// Publish this lifecycle event.
    Event(Event),
}

impl Action {
    /// The record carried by this action, if any.
    pub fn as_record(&self) -> Option<&MessageRecord> {
        match self {
            Action::Record(r) => Some(r),
            _ => None,
        }
    }

    /// The outbound line carried by this action, if any.
    pub fn as_send(&self) -> Option<&str> {
        match self {
            Action::Send(s) => Some(s),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_record_carries_category() {
        let rec = MessageRecord::raw(RawCategory::Server, "[250] Highest count");
        assert_eq!(rec.kind, MessageKind::Raw);
        assert_eq!(rec.category, Some(RawCategory::Server));
    }

    #[test]
    fn test_builder_chain() {
        let rec = MessageRecord::new(MessageKind::Privmsg, "hi")
            .with_target("#chan")
            .with_sender("nick");
        assert_eq!(rec.target.as_deref(), Some("#chan"));
        assert_eq!(rec.sender.as_deref(), Some("nick"));
    }

    #[test]
    fn test_action_accessors() {
        let send = Action::Send("NICK x\r\n".to_string());
        assert_eq!(send.as_send(), Some("NICK x\r\n"));
        assert!(send.as_record().is_none());

        let rec = Action::Record(Box::new(MessageRecord::error("bad")));
        assert!(rec.as_record().is_some());
        assert!(rec.as_send().is_none());
    }
}
