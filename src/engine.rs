//! The session engine façade.
//!
//! One [`Engine`] per connection. The driver feeds it transport bytes (or
//! pre-framed lines) and performs the returned [`Action`]s in order; user
//! commands go through the outbound API, which validates, encodes, updates
//! local state, and echoes where appropriate. All processing is strictly
//! sequential under `&mut self`; the engine holds no sockets, timers, or
//! locks.

use bytes::BytesMut;
use chrono::{Duration, Utc};
use tokio_util::codec::Decoder;
use tracing::debug;

use crate::channel::{ChannelState, ChannelTracker};
use crate::ctcp::Ctcp;
use crate::dispatch::{dispatch, DispatchCtx};
use crate::encode;
use crate::error::EncodeError;
use crate::isupport::Isupport;
use crate::line::LineFramer;
use crate::message::Line;
use crate::record::{Action, MessageKind, MessageRecord};
use crate::session::{QueryKind, Session, SessionConfig, SessionState};
use crate::whois::WhoisTracker;

/// Full starting description of an engine, so tests and drivers can begin
/// from any session shape.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Identity and registration options.
    pub session: SessionConfig,
    /// Age after which an unterminated WHOIS aggregation is swept.
    pub whois_ttl_secs: i64,
}

impl EngineConfig {
    /// Config with defaults around a nickname.
    pub fn with_nick(nick: impl Into<String>) -> Self {
        Self {
            session: SessionConfig::with_nick(nick),
            whois_ttl_secs: 30,
        }
    }
}

/// Protocol session engine for one connection.
pub struct Engine {
    framer: LineFramer,
    buffer: BytesMut,
    session: Session,
    channels: ChannelTracker,
    whois: WhoisTracker,
    whois_ttl: Duration,
}

impl Engine {
    /// New engine in the connecting state.
    pub fn new(config: EngineConfig) -> Self {
        Self {
            framer: LineFramer::new(),
            buffer: BytesMut::new(),
            session: Session::new(config.session),
            channels: ChannelTracker::new(),
            whois: WhoisTracker::new(),
            whois_ttl: Duration::seconds(config.whois_ttl_secs.max(1)),
        }
    }

    // ------------------------------------------------------------- inbound

    /// The transport is up: produce the opening volley.
    pub fn start(&mut self) -> Vec<Action> {
        self.session.start()
    }

    /// Feed a chunk of transport bytes and process every complete line in it.
    ///
    /// Framing errors (overlong or non-UTF-8 lines) become error records and
    /// processing continues with the next line.
    pub fn feed(&mut self, data: &[u8]) -> Vec<Action> {
        self.buffer.extend_from_slice(data);
        let mut actions = Vec::new();
        loop {
            match self.framer.decode(&mut self.buffer) {
                Ok(Some(line)) => actions.extend(self.feed_line(&line)),
                Ok(None) => break,
                Err(err) => {
                    debug!(error = %err, "framing error");
                    actions.push(Action::Record(Box::new(MessageRecord::error(format!(
                        "dropped line: {}",
                        err
                    )))));
                }
            }
        }
        actions
    }

    /// Process one complete line (terminator optional).
    ///
    /// A malformed line yields a single error record; it never aborts the
    /// session.
    pub fn feed_line(&mut self, raw: &str) -> Vec<Action> {
        let line: Line = match raw.parse() {
            Ok(line) => line,
            Err(err) => {
                return vec![Action::Record(Box::new(MessageRecord::error(format!(
                    "unparseable line: {}",
                    err
                ))))];
            }
        };
        let mut ctx = DispatchCtx {
            session: &mut self.session,
            channels: &mut self.channels,
            whois: &mut self.whois,
        };
        dispatch(&mut ctx, &line)
    }

    /// The driver's capability-negotiation deadline fired.
    pub fn on_negotiation_timeout(&mut self) -> Vec<Action> {
        self.session.on_negotiation_timeout()
    }

    /// Sweep WHOIS aggregations older than the configured TTL. Returns how
    /// many were dropped. The driver calls this on its own clock.
    pub fn sweep_whois(&mut self) -> usize {
        self.whois.expire(Utc::now(), self.whois_ttl)
    }

    /// Drop all transient state and mark the session disconnected.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.framer = LineFramer::new();
        self.session.reset();
        self.channels.clear();
        self.whois.clear();
    }

    // ------------------------------------------------------------ outbound

    /// Join a channel.
    pub fn join(&mut self, channel: &str, key: Option<&str>) -> Result<Vec<Action>, EncodeError> {
        Ok(vec![Action::Send(encode::join(channel, key)?)])
    }

    /// Leave a channel.
    pub fn part(&mut self, channel: &str, reason: Option<&str>) -> Result<Vec<Action>, EncodeError> {
        Ok(vec![Action::Send(encode::part(channel, reason)?)])
    }

    /// Send a message, echoing it as a record for the local display.
    pub fn privmsg(&mut self, target: &str, text: &str) -> Result<Vec<Action>, EncodeError> {
        let line = encode::privmsg(target, text)?;
        Ok(vec![
            Action::Send(line),
            self.echo(MessageKind::Privmsg, target, text),
        ])
    }

    /// Send a `/me` action, echoed locally.
    pub fn action(&mut self, target: &str, text: &str) -> Result<Vec<Action>, EncodeError> {
        let line = encode::action(target, text)?;
        Ok(vec![
            Action::Send(line),
            self.echo(MessageKind::Action, target, text),
        ])
    }

    /// Send a notice, echoed locally.
    pub fn notice(&mut self, target: &str, text: &str) -> Result<Vec<Action>, EncodeError> {
        let line = encode::notice(target, text)?;
        Ok(vec![
            Action::Send(line),
            self.echo(MessageKind::Notice, target, text),
        ])
    }

    /// Send a CTCP request (VERSION, PING, ...) inside a PRIVMSG.
    pub fn ctcp_request(
        &mut self,
        target: &str,
        ctcp: &Ctcp<'_>,
    ) -> Result<Vec<Action>, EncodeError> {
        Ok(vec![Action::Send(encode::ctcp(target, ctcp)?)])
    }

    /// Answer a CTCP query with a NOTICE-carried reply.
    pub fn ctcp_reply(
        &mut self,
        target: &str,
        ctcp: &Ctcp<'_>,
    ) -> Result<Vec<Action>, EncodeError> {
        Ok(vec![Action::Send(encode::ctcp_reply(target, ctcp)?)])
    }

    /// Set or query a topic.
    pub fn topic(&mut self, channel: &str, topic: Option<&str>) -> Result<Vec<Action>, EncodeError> {
        Ok(vec![Action::Send(encode::topic(channel, topic)?)])
    }

    /// Change modes on a target.
    pub fn mode(&mut self, target: &str, modes: &str) -> Result<Vec<Action>, EncodeError> {
        Ok(vec![Action::Send(encode::mode(target, Some(modes))?)])
    }

    /// Query a channel's modes. With `silent` the reply refreshes tracker
    /// state without producing a display record.
    pub fn mode_query(&mut self, target: &str, silent: bool) -> Result<Vec<Action>, EncodeError> {
        let line = encode::mode(target, None)?;
        self.session
            .register_query(QueryKind::ModeQuery, target, silent);
        Ok(vec![Action::Send(line)])
    }

    /// Issue WHO. With `silent` the replies are suppressed from display.
    pub fn who(&mut self, mask: &str, silent: bool) -> Result<Vec<Action>, EncodeError> {
        let line = encode::who(mask)?;
        self.session.register_query(QueryKind::Who, mask, silent);
        Ok(vec![Action::Send(line)])
    }

    /// Issue WHOIS; the aggregated result arrives as an event.
    pub fn whois(&mut self, nick: &str) -> Result<Vec<Action>, EncodeError> {
        Ok(vec![Action::Send(encode::whois(nick)?)])
    }

    /// Issue WHOWAS; the aggregated result arrives as an event.
    pub fn whowas(&mut self, nick: &str) -> Result<Vec<Action>, EncodeError> {
        Ok(vec![Action::Send(encode::whowas(nick)?)])
    }

    /// Kick a user from a channel.
    pub fn kick(
        &mut self,
        channel: &str,
        nick: &str,
        reason: Option<&str>,
    ) -> Result<Vec<Action>, EncodeError> {
        Ok(vec![Action::Send(encode::kick(channel, nick, reason)?)])
    }

    /// Invite a user to a channel.
    pub fn invite(&mut self, nick: &str, channel: &str) -> Result<Vec<Action>, EncodeError> {
        Ok(vec![Action::Send(encode::invite(nick, channel)?)])
    }

    /// Request a nickname change. State updates when the server confirms.
    pub fn change_nick(&mut self, nick: &str) -> Result<Vec<Action>, EncodeError> {
        Ok(vec![Action::Send(encode::nick(nick)?)])
    }

    /// Set or clear away status.
    pub fn away(&mut self, message: Option<&str>) -> Result<Vec<Action>, EncodeError> {
        Ok(vec![Action::Send(encode::away(message)?)])
    }

    /// Quit the connection.
    pub fn quit(&mut self, reason: Option<&str>) -> Result<Vec<Action>, EncodeError> {
        Ok(vec![Action::Send(encode::quit(reason)?)])
    }

    /// Send a raw line (validated for framing safety only).
    pub fn raw(&mut self, line: &str) -> Result<Vec<Action>, EncodeError> {
        Ok(vec![Action::Send(encode::raw(line)?)])
    }

    fn echo(&self, kind: MessageKind, target: &str, text: &str) -> Action {
        Action::Record(Box::new(
            MessageRecord::new(kind, text)
                .with_target(target)
                .with_sender(self.session.nick()),
        ))
    }

    // ------------------------------------------------------- state queries

    /// Current session lifecycle state.
    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    /// Our current nickname.
    pub fn nick(&self) -> &str {
        self.session.nick()
    }

    /// User modes as last reported.
    pub fn user_modes(&self) -> &str {
        self.session.user_modes()
    }

    /// The server feature table.
    pub fn isupport(&self) -> &Isupport {
        self.session.isupport()
    }

    /// Whether a capability was negotiated.
    pub fn cap_enabled(&self, cap: &str) -> bool {
        self.session.cap_enabled(cap)
    }

    /// One channel's tracked state, case-insensitively.
    pub fn channel(&self, name: &str) -> Option<&ChannelState> {
        self.channels.get(name)
    }

    /// All tracked channels.
    pub fn channels(&self) -> impl Iterator<Item = &ChannelState> {
        self.channels.iter()
    }
}
