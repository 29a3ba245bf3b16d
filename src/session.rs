//! Connection session state machine.
//!
//! [`Session`] drives one connection from the opening volley through
//! capability negotiation, optional SASL, and registration, and owns the
//! connection-scoped state afterwards: current nick, user modes, the 005
//! feature table, and the pending-query table used for silent display
//! suppression.
//!
//! The machine is sans-IO: every operation returns the [`Action`]s the
//! caller must perform, it never blocks and holds no timers. Deadlines are
//! the driver's job; it reports them via [`Session::on_negotiation_timeout`].

use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

use crate::casemap::{irc_eq, irc_to_lower};
use crate::error::EncodeError;
use crate::isupport::Isupport;
use crate::record::{Action, Event, MessageRecord, RawCategory};
use crate::{encode, sasl};

/// Bound on automatic nick collision retries before registration.
pub const MAX_NICK_RETRIES: u32 = 9;

/// Capabilities the engine asks for when the server offers them.
const WANTED_CAPS: &[&str] = &["multi-prefix", "server-time", "account-notify"];

/// Registration lifecycle states.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SessionState {
    /// Transport is up, nothing sent yet.
    Connecting,
    /// CAP LS sent, collecting/negotiating capabilities.
    CapNegotiating,
    /// SASL exchange in progress.
    Authenticating,
    /// CAP END sent, waiting for 001.
    Registering,
    /// 001 received; the session is live.
    Registered,
    /// Connection is over (ERROR, fatal failure, or driver teardown).
    Disconnected,
}

/// SASL PLAIN credentials.
#[derive(Clone, Debug)]
pub struct SaslCredentials {
    /// Account name.
    pub username: String,
    /// Account password.
    pub password: String,
}

/// Everything needed to open and identify a session.
#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// Primary nickname.
    pub nick: String,
    /// Fallback nickname tried first on collision.
    pub alt_nick: Option<String>,
    /// Username (ident).
    pub username: String,
    /// Realname (gecos).
    pub realname: String,
    /// Server password (PASS), if the network requires one.
    pub server_password: Option<String>,
    /// SASL credentials; presence requests the `sasl` capability.
    pub sasl: Option<SaslCredentials>,
    /// Treat SASL failure as fatal instead of continuing unauthenticated.
    pub require_sasl: bool,
}

impl SessionConfig {
    /// Minimal config: one nick, username and realname defaulted from it.
    pub fn with_nick(nick: impl Into<String>) -> Self {
        let nick = nick.into();
        Self {
            username: nick.clone(),
            realname: nick.clone(),
            nick,
            alt_nick: None,
            server_password: None,
            sasl: None,
            require_sasl: false,
        }
    }
}

/// Queries that can be issued silently (state refresh without display).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum QueryKind {
    /// WHO <mask>.
    Who,
    /// MODE <channel> query.
    ModeQuery,
}

/// One connection's registration machine and session-scoped state.
pub struct Session {
    config: SessionConfig,
    state: SessionState,
    /// Nick the server currently knows us by (or the one just attempted).
    current_nick: String,
    nick_retries: u32,
    registered_emitted: bool,
    /// Capability negotiation bookkeeping.
    available_caps: HashMap<String, Option<String>>,
    requested_caps: HashSet<String>,
    enabled_caps: HashSet<String>,
    caps_finished: bool,
    /// User modes as last reported (221 / MODE on self).
    user_modes: String,
    /// Server feature table (005 accumulation).
    isupport: Isupport,
    /// Queries issued with display suppression, keyed by kind + lowered
    /// target. Registered at issue time, consumed by the reply terminator.
    pending_queries: HashMap<(QueryKind, String), bool>,
}

impl Session {
    /// New session in [`SessionState::Connecting`].
    pub fn new(config: SessionConfig) -> Self {
        let current_nick = config.nick.clone();
        Self {
            config,
            state: SessionState::Connecting,
            current_nick,
            nick_retries: 0,
            registered_emitted: false,
            available_caps: HashMap::new(),
            requested_caps: HashSet::new(),
            enabled_caps: HashSet::new(),
            caps_finished: false,
            user_modes: String::new(),
            isupport: Isupport::new(),
            pending_queries: HashMap::new(),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Our current nickname.
    pub fn nick(&self) -> &str {
        &self.current_nick
    }

    /// User modes as last reported by the server.
    pub fn user_modes(&self) -> &str {
        &self.user_modes
    }

    /// The accumulated 005 feature table.
    pub fn isupport(&self) -> &Isupport {
        &self.isupport
    }

    /// Mutable feature table, for the 005 handler.
    pub(crate) fn isupport_mut(&mut self) -> &mut Isupport {
        &mut self.isupport
    }

    pub(crate) fn set_user_modes(&mut self, modes: &str) {
        self.user_modes = modes.to_string();
    }

    /// Capabilities the server acked.
    pub fn enabled_caps(&self) -> impl Iterator<Item = &str> {
        self.enabled_caps.iter().map(String::as_str)
    }

    /// Whether a capability was acked.
    pub fn cap_enabled(&self, cap: &str) -> bool {
        self.enabled_caps.contains(cap)
    }

    /// Open the connection: PASS (if configured), CAP LS 302, NICK, USER.
    ///
    /// Idempotent only in the sense that calling it twice is a driver bug;
    /// from any state but `Connecting` it does nothing.
    pub fn start(&mut self) -> Vec<Action> {
        if self.state != SessionState::Connecting {
            warn!(state = ?self.state, "start() called on an already-started session");
            return Vec::new();
        }

        let mut actions = Vec::new();
        if let Some(ref password) = self.config.server_password {
            self.push_send(&mut actions, encode::pass(password));
        }
        self.push_send(&mut actions, encode::cap("LS", Some("302")));
        self.push_send(&mut actions, encode::nick(&self.current_nick));
        self.push_send(
            &mut actions,
            encode::user(&self.config.username, &self.config.realname),
        );

        self.state = SessionState::CapNegotiating;
        debug!(nick = %self.current_nick, "opening volley sent");
        actions
    }

    /// Handle a CAP subcommand from the server.
    ///
    /// `more` is true for the `*` continuation marker on multiline LS.
    pub fn on_cap(&mut self, subcommand: &str, caps: &str, more: bool) -> Vec<Action> {
        let mut actions = Vec::new();
        match subcommand.to_ascii_uppercase().as_str() {
            "LS" | "NEW" => {
                for token in caps.split_ascii_whitespace() {
                    let (name, value) = match token.split_once('=') {
                        Some((n, v)) => (n.to_string(), Some(v.to_string())),
                        None => (token.to_string(), None),
                    };
                    self.available_caps.insert(name, value);
                }
                if !more && self.state == SessionState::CapNegotiating {
                    self.request_caps(&mut actions);
                }
            }
            "ACK" => {
                for token in caps.split_ascii_whitespace() {
                    let name = token.trim_start_matches('-');
                    if token.starts_with('-') {
                        self.enabled_caps.remove(name);
                    } else {
                        self.enabled_caps.insert(name.to_string());
                    }
                    self.requested_caps.remove(name);
                }
                if self.enabled_caps.contains("sasl") && self.sasl_wanted() {
                    self.state = SessionState::Authenticating;
                    self.push_send(&mut actions, encode::authenticate("PLAIN"));
                    debug!("sasl capability acked, authenticating");
                } else {
                    actions.extend(self.maybe_end_caps());
                }
            }
            "NAK" => {
                // Rejection is non-fatal; we just do without.
                for token in caps.split_ascii_whitespace() {
                    self.requested_caps.remove(token);
                }
                warn!(caps = %caps, "capability request rejected");
                actions.extend(self.maybe_end_caps());
            }
            "DEL" => {
                for token in caps.split_ascii_whitespace() {
                    self.enabled_caps.remove(token);
                }
            }
            other => {
                debug!(subcommand = %other, "unhandled CAP subcommand");
            }
        }
        actions
    }

    /// Handle an AUTHENTICATE challenge from the server.
    pub fn on_authenticate_challenge(&mut self, challenge: &str) -> Vec<Action> {
        let mut actions = Vec::new();
        if self.state != SessionState::Authenticating {
            return actions;
        }
        // Only the empty challenge of PLAIN is meaningful here.
        if challenge == "+" {
            if let Some(ref creds) = self.config.sasl {
                let payload = sasl::encode_plain(&creds.username, &creds.password);
                for chunk in sasl::chunk_payload(&payload) {
                    self.push_send(&mut actions, encode::authenticate(&chunk));
                }
            }
        }
        actions
    }

    /// Handle the SASL outcome numerics (903 success, 902/904..907 failure).
    pub fn on_sasl_result(&mut self, success: bool, text: &str) -> Vec<Action> {
        let mut actions = Vec::new();
        if self.state != SessionState::Authenticating {
            return actions;
        }
        if success {
            actions.push(Action::Record(Box::new(
                MessageRecord::raw(RawCategory::Auth, text.to_string()),
            )));
            actions.extend(self.finish_caps());
        } else if self.config.require_sasl {
            actions.push(Action::Record(Box::new(MessageRecord::error(format!(
                "SASL authentication failed: {}",
                text
            )))));
            actions.push(Action::Event(Event::RegistrationFailed(
                "SASL authentication failed".to_string(),
            )));
            self.state = SessionState::Disconnected;
            self.push_send(&mut actions, encode::quit(Some("SASL failed")));
        } else {
            actions.push(Action::Record(Box::new(MessageRecord::error(format!(
                "SASL authentication failed, continuing unauthenticated: {}",
                text
            )))));
            actions.extend(self.finish_caps());
        }
        actions
    }

    /// 001 arrived: registration is complete.
    ///
    /// Emits [`Event::Registered`] exactly once per session, even if the
    /// server repeats the numeric.
    pub fn on_welcome(&mut self, nick: &str) -> Vec<Action> {
        let mut actions = Vec::new();
        self.current_nick = nick.to_string();
        self.state = SessionState::Registered;
        if !self.registered_emitted {
            self.registered_emitted = true;
            actions.push(Action::Event(Event::Registered));
            debug!(nick = %nick, "registered");
        }
        actions
    }

    /// A nick collision numeric (432/433/436/437) arrived.
    ///
    /// Before registration this retries deterministically: the alternate
    /// nick first, then the primary nick with an incrementing suffix, bounded
    /// by [`MAX_NICK_RETRIES`]. After registration the nick simply stays.
    pub fn on_nick_collision(&mut self) -> Vec<Action> {
        let mut actions = Vec::new();
        if self.state == SessionState::Registered || self.state == SessionState::Disconnected {
            return actions;
        }

        if self.nick_retries >= MAX_NICK_RETRIES {
            actions.push(Action::Event(Event::RegistrationFailed(
                "no usable nickname".to_string(),
            )));
            self.state = SessionState::Disconnected;
            self.push_send(&mut actions, encode::quit(None));
            return actions;
        }

        self.nick_retries += 1;
        let candidate = match (&self.config.alt_nick, self.nick_retries) {
            (Some(alt), 1) => alt.clone(),
            (Some(_), n) => format!("{}{}", self.config.nick, n - 1),
            (None, n) => format!("{}{}", self.config.nick, n),
        };
        debug!(candidate = %candidate, attempt = self.nick_retries, "nick collision, retrying");
        self.current_nick = candidate.clone();
        self.push_send(&mut actions, encode::nick(&candidate));
        actions
    }

    /// A NICK command changed `old` to `new`; track our own rename.
    pub fn on_nick_change(&mut self, old: &str, new: &str) -> Vec<Action> {
        let mut actions = Vec::new();
        if irc_eq(old, &self.current_nick) {
            self.current_nick = new.to_string();
            actions.push(Action::Event(Event::NickChanged(new.to_string())));
        }
        actions
    }

    /// The server sent ERROR: the connection is over.
    pub fn on_server_error(&mut self, reason: &str) -> Vec<Action> {
        let mut actions = vec![Action::Record(Box::new(
            MessageRecord::error(format!("ERROR: {}", reason)),
        ))];
        if self.state != SessionState::Registered {
            actions.push(Action::Event(Event::RegistrationFailed(
                reason.to_string(),
            )));
        }
        actions.push(Action::Event(Event::Disconnected(reason.to_string())));
        self.state = SessionState::Disconnected;
        actions
    }

    /// The driver's negotiation deadline fired.
    ///
    /// Gives up on outstanding capability/SASL work and proceeds to
    /// registration; a slow CAP exchange must not hold the connection
    /// hostage.
    pub fn on_negotiation_timeout(&mut self) -> Vec<Action> {
        match self.state {
            SessionState::CapNegotiating | SessionState::Authenticating => {
                warn!(state = ?self.state, "negotiation timed out, forcing CAP END");
                self.requested_caps.clear();
                self.finish_caps()
            }
            _ => Vec::new(),
        }
    }

    /// Register an outgoing query so its replies can be suppressed.
    pub fn register_query(&mut self, kind: QueryKind, target: &str, silent: bool) {
        self.pending_queries
            .insert((kind, irc_to_lower(target)), silent);
    }

    /// Whether a query for `target` is pending silently (non-consuming).
    pub fn query_is_silent(&self, kind: QueryKind, target: &str) -> bool {
        self.pending_queries
            .get(&(kind, irc_to_lower(target)))
            .copied()
            .unwrap_or(false)
    }

    /// Consume a pending query at its reply terminator. Returns its silent
    /// flag; an unsolicited reply was not silent.
    pub fn take_query(&mut self, kind: QueryKind, target: &str) -> bool {
        self.pending_queries
            .remove(&(kind, irc_to_lower(target)))
            .unwrap_or(false)
    }

    /// Drop all transient state (driver-initiated teardown).
    pub fn reset(&mut self) {
        self.state = SessionState::Disconnected;
        self.pending_queries.clear();
        self.available_caps.clear();
        self.requested_caps.clear();
    }

    fn sasl_wanted(&self) -> bool {
        self.config.sasl.is_some()
    }

    fn request_caps(&mut self, actions: &mut Vec<Action>) {
        let mut wanted: Vec<&str> = WANTED_CAPS
            .iter()
            .copied()
            .filter(|c| self.available_caps.contains_key(*c))
            .collect();
        if self.sasl_wanted() && self.available_caps.contains_key("sasl") {
            wanted.push("sasl");
        }

        if wanted.is_empty() {
            actions.extend(self.finish_caps());
            return;
        }

        self.requested_caps = wanted.iter().map(|s| s.to_string()).collect();
        let req = wanted.join(" ");
        self.push_send(actions, encode::cap("REQ", Some(&req)));
    }

    /// End negotiation once every requested cap has been acked or rejected.
    fn maybe_end_caps(&mut self) -> Vec<Action> {
        if self.requested_caps.is_empty() {
            self.finish_caps()
        } else {
            Vec::new()
        }
    }

    fn finish_caps(&mut self) -> Vec<Action> {
        let mut actions = Vec::new();
        if self.caps_finished {
            self.state = SessionState::Registering;
            return actions;
        }
        self.caps_finished = true;
        self.state = SessionState::Registering;
        self.push_send(&mut actions, encode::cap("END", None));
        actions.push(Action::Event(Event::CapsNegotiated));
        actions
    }

    fn push_send(&self, actions: &mut Vec<Action>, line: Result<String, EncodeError>) {
        match line {
            Ok(line) => actions.push(Action::Send(line)),
            // Config-derived lines only fail on hostile config values.
            Err(err) => {
                actions.push(Action::Record(Box::new(MessageRecord::error(format!(
                    "could not encode command: {}",
                    err
                )))));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sends(actions: &[Action]) -> Vec<&str> {
        actions.iter().filter_map(Action::as_send).collect()
    }

    fn has_event(actions: &[Action], wanted: &Event) -> bool {
        actions
            .iter()
            .any(|a| matches!(a, Action::Event(e) if e == wanted))
    }

    fn config() -> SessionConfig {
        SessionConfig::with_nick("rusty")
    }

    #[test]
    fn test_start_volley() {
        let mut session = Session::new(config());
        let actions = session.start();
        assert_eq!(
            sends(&actions),
            vec!["CAP LS :302\r\n", "NICK rusty\r\n", "USER rusty 0 * :rusty\r\n"]
        );
        assert_eq!(session.state(), SessionState::CapNegotiating);

        // A second start is a no-op.
        assert!(session.start().is_empty());
    }

    #[test]
    fn test_start_with_password() {
        let mut cfg = config();
        cfg.server_password = Some("hunter2".to_string());
        let mut session = Session::new(cfg);
        let actions = session.start();
        assert_eq!(sends(&actions)[0], "PASS :hunter2\r\n");
    }

    #[test]
    fn test_cap_negotiation_roundtrip() {
        let mut session = Session::new(config());
        session.start();

        let actions = session.on_cap("LS", "multi-prefix server-time sasl", false);
        assert_eq!(
            sends(&actions),
            vec!["CAP REQ :multi-prefix server-time\r\n"]
        );

        let actions = session.on_cap("ACK", "multi-prefix server-time", false);
        assert_eq!(sends(&actions), vec!["CAP END\r\n"]);
        assert!(has_event(&actions, &Event::CapsNegotiated));
        assert_eq!(session.state(), SessionState::Registering);
        assert!(session.cap_enabled("multi-prefix"));
    }

    #[test]
    fn test_cap_ls_multiline_defers_request() {
        let mut session = Session::new(config());
        session.start();

        let actions = session.on_cap("LS", "multi-prefix", true);
        assert!(sends(&actions).is_empty());

        let actions = session.on_cap("LS", "server-time", false);
        assert_eq!(
            sends(&actions),
            vec!["CAP REQ :multi-prefix server-time\r\n"]
        );
    }

    #[test]
    fn test_cap_nak_is_non_fatal() {
        let mut session = Session::new(config());
        session.start();
        session.on_cap("LS", "multi-prefix server-time", false);

        let actions = session.on_cap("ACK", "multi-prefix", false);
        assert!(sends(&actions).is_empty(), "one cap still outstanding");

        let actions = session.on_cap("NAK", "server-time", false);
        assert_eq!(sends(&actions), vec!["CAP END\r\n"]);
        assert!(!session.cap_enabled("server-time"));
    }

    #[test]
    fn test_no_offered_caps_ends_immediately() {
        let mut session = Session::new(config());
        session.start();
        let actions = session.on_cap("LS", "away-notify", false);
        assert_eq!(sends(&actions), vec!["CAP END\r\n"]);
    }

    #[test]
    fn test_sasl_flow_success() {
        let mut cfg = config();
        cfg.sasl = Some(SaslCredentials {
            username: "rusty".to_string(),
            password: "secret".to_string(),
        });
        let mut session = Session::new(cfg);
        session.start();
        session.on_cap("LS", "sasl=PLAIN multi-prefix", false);

        let actions = session.on_cap("ACK", "multi-prefix sasl", false);
        assert_eq!(sends(&actions), vec!["AUTHENTICATE PLAIN\r\n"]);
        assert_eq!(session.state(), SessionState::Authenticating);

        let actions = session.on_authenticate_challenge("+");
        let payload = sasl::encode_plain("rusty", "secret");
        assert_eq!(
            sends(&actions),
            vec![format!("AUTHENTICATE {}\r\n", payload).as_str()]
        );

        let actions = session.on_sasl_result(true, "SASL authentication successful");
        assert_eq!(sends(&actions), vec!["CAP END\r\n"]);
        assert_eq!(session.state(), SessionState::Registering);
    }

    #[test]
    fn test_sasl_failure_continues_when_optional() {
        let mut cfg = config();
        cfg.sasl = Some(SaslCredentials {
            username: "rusty".to_string(),
            password: "wrong".to_string(),
        });
        let mut session = Session::new(cfg);
        session.start();
        session.on_cap("LS", "sasl", false);
        session.on_cap("ACK", "sasl", false);

        let actions = session.on_sasl_result(false, "SASL authentication failed");
        assert_eq!(sends(&actions), vec!["CAP END\r\n"]);
        assert_eq!(session.state(), SessionState::Registering);
    }

    #[test]
    fn test_sasl_failure_fatal_when_required() {
        let mut cfg = config();
        cfg.sasl = Some(SaslCredentials {
            username: "rusty".to_string(),
            password: "wrong".to_string(),
        });
        cfg.require_sasl = true;
        let mut session = Session::new(cfg);
        session.start();
        session.on_cap("LS", "sasl", false);
        session.on_cap("ACK", "sasl", false);

        let actions = session.on_sasl_result(false, "SASL authentication failed");
        assert!(has_event(
            &actions,
            &Event::RegistrationFailed("SASL authentication failed".to_string())
        ));
        assert_eq!(session.state(), SessionState::Disconnected);
    }

    #[test]
    fn test_registered_event_emitted_once() {
        let mut session = Session::new(config());
        session.start();

        let actions = session.on_welcome("rusty");
        assert!(has_event(&actions, &Event::Registered));
        assert_eq!(session.state(), SessionState::Registered);

        let actions = session.on_welcome("rusty");
        assert!(!has_event(&actions, &Event::Registered));
    }

    #[test]
    fn test_nick_retry_alt_then_suffix() {
        let mut cfg = config();
        cfg.alt_nick = Some("rusty_".to_string());
        let mut session = Session::new(cfg);
        session.start();

        let actions = session.on_nick_collision();
        assert_eq!(sends(&actions), vec!["NICK rusty_\r\n"]);

        let actions = session.on_nick_collision();
        assert_eq!(sends(&actions), vec!["NICK rusty1\r\n"]);

        let actions = session.on_nick_collision();
        assert_eq!(sends(&actions), vec!["NICK rusty2\r\n"]);
    }

    #[test]
    fn test_nick_retry_bounded() {
        let mut session = Session::new(config());
        session.start();

        for _ in 0..MAX_NICK_RETRIES {
            let actions = session.on_nick_collision();
            assert_eq!(sends(&actions).len(), 1);
        }

        let actions = session.on_nick_collision();
        assert!(has_event(
            &actions,
            &Event::RegistrationFailed("no usable nickname".to_string())
        ));
        assert_eq!(session.state(), SessionState::Disconnected);
    }

    #[test]
    fn test_collision_after_registration_is_ignored() {
        let mut session = Session::new(config());
        session.start();
        session.on_welcome("rusty");
        assert!(session.on_nick_collision().is_empty());
    }

    #[test]
    fn test_own_nick_change_tracked() {
        let mut session = Session::new(config());
        session.start();
        session.on_welcome("rusty");

        let actions = session.on_nick_change("RUSTY", "ferris");
        assert!(has_event(&actions, &Event::NickChanged("ferris".to_string())));
        assert_eq!(session.nick(), "ferris");

        assert!(session.on_nick_change("someone", "else").is_empty());
    }

    #[test]
    fn test_negotiation_timeout_forces_end() {
        let mut session = Session::new(config());
        session.start();

        let actions = session.on_negotiation_timeout();
        assert_eq!(sends(&actions), vec!["CAP END\r\n"]);
        assert_eq!(session.state(), SessionState::Registering);

        // Once registered the timeout hook is inert.
        session.on_welcome("rusty");
        assert!(session.on_negotiation_timeout().is_empty());
    }

    #[test]
    fn test_server_error_disconnects() {
        let mut session = Session::new(config());
        session.start();
        session.on_welcome("rusty");

        let actions = session.on_server_error("Closing Link: flood");
        assert!(has_event(
            &actions,
            &Event::Disconnected("Closing Link: flood".to_string())
        ));
        assert_eq!(session.state(), SessionState::Disconnected);
    }

    #[test]
    fn test_pending_query_lifecycle() {
        let mut session = Session::new(config());
        session.register_query(QueryKind::Who, "#Rust", true);

        assert!(session.query_is_silent(QueryKind::Who, "#rust"));
        assert!(!session.query_is_silent(QueryKind::ModeQuery, "#rust"));

        assert!(session.take_query(QueryKind::Who, "#RUST"));
        // Consumed: a second terminator is unsolicited.
        assert!(!session.take_query(QueryKind::Who, "#rust"));
    }
}
