//! Sans-IO IRC client session engine.
//!
//! This crate turns a raw IRC connection byte stream into structured state
//! and display records, and user intentions into validated protocol lines.
//! It owns everything between the transport and the UI: line framing,
//! message parsing, registration (capabilities, SASL, nick retries), channel
//! and WHOIS state tracking, and total dispatch over the numeric space.
//!
//! The engine performs no I/O and holds no timers. Every operation on
//! [`Engine`] returns the [`Action`]s the caller must carry out, in order:
//! lines to send, records to display, lifecycle events to react to.
//!
//! ```
//! use irc_engine::{Action, Engine, EngineConfig};
//!
//! let mut engine = Engine::new(EngineConfig::with_nick("ferris"));
//! for action in engine.start() {
//!     if let Action::Send(line) = action {
//!         // write `line` to the socket
//!         assert!(line.ends_with("\r\n"));
//!     }
//! }
//! let actions = engine.feed(b":server 001 ferris :Welcome\r\n");
//! assert!(!actions.is_empty());
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod casemap;
pub mod channel;
pub mod ctcp;
mod dispatch;
pub mod encode;
pub mod engine;
pub mod error;
pub mod isupport;
pub mod line;
pub mod message;
pub mod prefix;
pub mod record;
pub mod response;
pub mod sasl;
pub mod session;
pub mod whois;

pub use channel::{ChannelState, ChannelStatus, ChannelTracker, ListEntry, ListKind, Membership};
pub use ctcp::{Ctcp, CtcpKind};
pub use engine::{Engine, EngineConfig};
pub use error::{EncodeError, MessageParseError, ProtocolError};
pub use isupport::{Isupport, PrefixSpec};
pub use line::{LineFramer, MAX_LINE_LEN};
pub use message::{Line, Tag};
pub use prefix::Prefix;
pub use record::{Action, Event, MessageKind, MessageRecord, RawCategory};
pub use response::Response;
pub use session::{
    QueryKind, SaslCredentials, Session, SessionConfig, SessionState, MAX_NICK_RETRIES,
};
pub use whois::{WhoisResult, WhoisTracker};
