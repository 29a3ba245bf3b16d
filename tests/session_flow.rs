//! Registration flows driven through the public engine surface.

use irc_engine::{
    Action, Engine, EngineConfig, Event, SaslCredentials, SessionConfig, SessionState,
    MAX_NICK_RETRIES,
};

fn sends(actions: &[Action]) -> Vec<&str> {
    actions.iter().filter_map(Action::as_send).collect()
}

fn count_event(actions: &[Action], f: impl Fn(&Event) -> bool) -> usize {
    actions
        .iter()
        .filter(|a| matches!(a, Action::Event(e) if f(e)))
        .count()
}

#[test]
fn full_registration_happy_path() {
    let mut engine = Engine::new(EngineConfig::with_nick("ferris"));

    let actions = engine.start();
    assert_eq!(
        sends(&actions),
        vec![
            "CAP LS :302\r\n",
            "NICK ferris\r\n",
            "USER ferris 0 * :ferris\r\n"
        ]
    );
    assert_eq!(engine.state(), SessionState::CapNegotiating);

    let actions = engine.feed_line(":server CAP * LS :multi-prefix server-time away-notify");
    assert_eq!(
        sends(&actions),
        vec!["CAP REQ :multi-prefix server-time\r\n"]
    );

    let actions = engine.feed_line(":server CAP ferris ACK :multi-prefix server-time");
    assert_eq!(sends(&actions), vec!["CAP END\r\n"]);
    assert_eq!(engine.state(), SessionState::Registering);

    let actions = engine.feed_line(":server 001 ferris :Welcome to TestNet, ferris");
    assert_eq!(count_event(&actions, |e| *e == Event::Registered), 1);
    assert_eq!(engine.state(), SessionState::Registered);
    assert_eq!(engine.nick(), "ferris");
}

#[test]
fn registered_event_fires_exactly_once() {
    let mut engine = Engine::new(EngineConfig::with_nick("ferris"));
    engine.start();

    let first = engine.feed_line(":server 001 ferris :Welcome");
    let second = engine.feed_line(":server 001 ferris :Welcome");
    assert_eq!(count_event(&first, |e| *e == Event::Registered), 1);
    assert_eq!(count_event(&second, |e| *e == Event::Registered), 0);
}

#[test]
fn cap_ls_multiline_is_collected_before_req() {
    let mut engine = Engine::new(EngineConfig::with_nick("ferris"));
    engine.start();

    let actions = engine.feed_line(":server CAP * LS * :multi-prefix");
    assert!(sends(&actions).is_empty());
    let actions = engine.feed_line(":server CAP * LS :server-time sasl");
    assert_eq!(
        sends(&actions),
        vec!["CAP REQ :multi-prefix server-time\r\n"]
    );
}

#[test]
fn nick_collision_retry_sequence_is_bounded() {
    let mut config = EngineConfig::with_nick("popular");
    config.session.alt_nick = Some("popular_".to_string());
    let mut engine = Engine::new(config);
    engine.start();

    // First retry goes to the alternate nick.
    let actions = engine.feed_line(":server 433 * popular :Nickname is already in use.");
    assert!(sends(&actions).contains(&"NICK popular_\r\n"));

    // Then base + suffix, bounded.
    let mut last_sends = Vec::new();
    for _ in 1..MAX_NICK_RETRIES {
        let actions = engine.feed_line(":server 433 * x :Nickname is already in use.");
        last_sends = sends(&actions).iter().map(|s| s.to_string()).collect();
    }
    assert_eq!(last_sends, vec![format!("NICK popular{}\r\n", MAX_NICK_RETRIES - 1)]);

    // Exhaustion surfaces a terminal failure event.
    let actions = engine.feed_line(":server 433 * x :Nickname is already in use.");
    assert_eq!(
        count_event(&actions, |e| matches!(e, Event::RegistrationFailed(_))),
        1
    );
    assert_eq!(engine.state(), SessionState::Disconnected);
}

#[test]
fn collision_after_registration_does_not_retry() {
    let mut engine = Engine::new(EngineConfig::with_nick("ferris"));
    engine.start();
    engine.feed_line(":server 001 ferris :Welcome");

    let actions = engine.feed_line(":server 433 ferris taken :Nickname is already in use.");
    assert!(sends(&actions).is_empty());
    assert_eq!(engine.nick(), "ferris");
}

#[test]
fn sasl_success_flow() {
    let mut config = EngineConfig::with_nick("ferris");
    config.session.sasl = Some(SaslCredentials {
        username: "ferris".to_string(),
        password: "crabby".to_string(),
    });
    let mut engine = Engine::new(config);
    engine.start();

    engine.feed_line(":server CAP * LS :sasl=PLAIN,EXTERNAL multi-prefix");
    let actions = engine.feed_line(":server CAP ferris ACK :multi-prefix sasl");
    assert_eq!(sends(&actions), vec!["AUTHENTICATE PLAIN\r\n"]);
    assert_eq!(engine.state(), SessionState::Authenticating);

    let actions = engine.feed_line("AUTHENTICATE +");
    let auth = sends(&actions);
    assert_eq!(auth.len(), 1);
    assert!(auth[0].starts_with("AUTHENTICATE "));

    let actions = engine.feed_line(":server 903 ferris :SASL authentication successful");
    assert_eq!(sends(&actions), vec!["CAP END\r\n"]);

    let actions = engine.feed_line(":server 001 ferris :Welcome");
    assert_eq!(count_event(&actions, |e| *e == Event::Registered), 1);
}

#[test]
fn sasl_failure_fatal_only_when_required() {
    let creds = SaslCredentials {
        username: "ferris".to_string(),
        password: "wrong".to_string(),
    };

    // Optional: continue unregistered.
    let mut config = EngineConfig::with_nick("ferris");
    config.session.sasl = Some(creds.clone());
    let mut engine = Engine::new(config);
    engine.start();
    engine.feed_line(":server CAP * LS :sasl");
    engine.feed_line(":server CAP ferris ACK :sasl");
    let actions = engine.feed_line(":server 904 ferris :SASL authentication failed");
    assert!(sends(&actions).contains(&"CAP END\r\n"));
    assert_eq!(engine.state(), SessionState::Registering);

    // Required: terminal.
    let mut config = EngineConfig::with_nick("ferris");
    config.session.sasl = Some(creds);
    config.session.require_sasl = true;
    let mut engine = Engine::new(config);
    engine.start();
    engine.feed_line(":server CAP * LS :sasl");
    engine.feed_line(":server CAP ferris ACK :sasl");
    let actions = engine.feed_line(":server 904 ferris :SASL authentication failed");
    assert_eq!(
        count_event(&actions, |e| matches!(e, Event::RegistrationFailed(_))),
        1
    );
    assert_eq!(engine.state(), SessionState::Disconnected);
}

#[test]
fn negotiation_timeout_unblocks_registration() {
    let mut engine = Engine::new(EngineConfig::with_nick("ferris"));
    engine.start();

    // Server never answers CAP LS; the driver's deadline fires.
    let actions = engine.on_negotiation_timeout();
    assert_eq!(sends(&actions), vec!["CAP END\r\n"]);
    assert_eq!(engine.state(), SessionState::Registering);

    let actions = engine.feed_line(":server 001 ferris :Welcome");
    assert_eq!(count_event(&actions, |e| *e == Event::Registered), 1);
}

#[test]
fn server_error_terminates_session() {
    let mut engine = Engine::new(EngineConfig::with_nick("ferris"));
    engine.start();
    engine.feed_line(":server 001 ferris :Welcome");

    let actions = engine.feed_line("ERROR :Closing Link: ferris (K-lined)");
    assert_eq!(
        count_event(&actions, |e| matches!(e, Event::Disconnected(_))),
        1
    );
    assert_eq!(engine.state(), SessionState::Disconnected);
}

#[test]
fn own_nick_change_confirmed_by_server() {
    let mut engine = Engine::new(EngineConfig::with_nick("ferris"));
    engine.start();
    engine.feed_line(":server 001 ferris :Welcome");

    // The request alone changes nothing.
    let actions = engine.change_nick("crab").unwrap();
    assert_eq!(sends(&actions), vec!["NICK crab\r\n"]);
    assert_eq!(engine.nick(), "ferris");

    // Server confirmation does.
    let actions = engine.feed_line(":ferris!f@h NICK crab");
    assert_eq!(
        count_event(&actions, |e| *e == Event::NickChanged("crab".to_string())),
        1
    );
    assert_eq!(engine.nick(), "crab");
}

#[test]
fn silent_user_mode_query_updates_modes_without_display() {
    let mut engine = Engine::new(EngineConfig::with_nick("ferris"));
    engine.start();
    engine.feed_line(":server 001 ferris :Welcome");

    let actions = engine.mode_query("ferris", true).unwrap();
    assert_eq!(sends(&actions), vec!["MODE ferris\r\n"]);

    let actions = engine.feed_line(":server 221 ferris +iw");
    assert!(actions.iter().all(|a| a.as_record().is_none()));
    assert_eq!(engine.user_modes(), "+iw");

    // The pending entry is consumed: an unsolicited 221 displays.
    let actions = engine.feed_line(":server 221 ferris +iwx");
    assert_eq!(actions.iter().filter_map(Action::as_record).count(), 1);
    assert_eq!(engine.user_modes(), "+iwx");
}

#[test]
fn server_password_sent_first() {
    let mut config = EngineConfig::with_nick("ferris");
    config.session = SessionConfig {
        server_password: Some("sekrit".to_string()),
        ..SessionConfig::with_nick("ferris")
    };
    let mut engine = Engine::new(config);
    let actions = engine.start();
    assert_eq!(sends(&actions)[0], "PASS :sekrit\r\n");
}
