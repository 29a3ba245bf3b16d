//! JSON round-trips of the public data types under the `serde` feature.
#![cfg(feature = "serde")]

use irc_engine::{MessageRecord, RawCategory, WhoisResult};

#[test]
fn message_record_round_trips_through_json() {
    let rec = MessageRecord::raw(RawCategory::User, "alice is away: brb")
        .with_target("#rust")
        .with_sender("server");
    let json = serde_json::to_string(&rec).unwrap();
    let back: MessageRecord = serde_json::from_str(&json).unwrap();
    assert_eq!(back, rec);
}

#[test]
fn whois_result_round_trips_through_json() {
    let mut result = WhoisResult::empty("alice");
    result.username = Some("a".to_string());
    result.hostname = Some("host.example".to_string());
    result.channels = vec!["#rust".to_string(), "@#ops".to_string()];
    result.is_secure = true;

    let json = serde_json::to_string(&result).unwrap();
    let back: WhoisResult = serde_json::from_str(&json).unwrap();
    assert_eq!(back, result);
    assert_eq!(back.userhost().as_deref(), Some("a@host.example"));
}
