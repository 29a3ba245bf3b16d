//! Outbound command construction.
//!
//! One constructor per user action. Every constructor validates its fields
//! (no empty targets, no embedded line breaks) and enforces the 512-byte
//! line limit including CRLF. Over-length input is an error, never a silent
//! truncation; a caller that wants to split a long message does the
//! splitting itself.

use crate::ctcp::Ctcp;
use crate::error::EncodeError;
use crate::line::MAX_LINE_LEN;

fn check_field(name: &'static str, value: &str) -> Result<(), EncodeError> {
    if value.contains(['\r', '\n', '\0']) {
        return Err(EncodeError::IllegalCharacter(name));
    }
    Ok(())
}

fn check_target(name: &'static str, value: &str) -> Result<(), EncodeError> {
    if value.is_empty() {
        return Err(EncodeError::EmptyTarget(name));
    }
    check_field(name, value)?;
    if value.contains(' ') {
        return Err(EncodeError::IllegalCharacter(name));
    }
    Ok(())
}

fn finish(line: String) -> Result<String, EncodeError> {
    let line = line + "\r\n";
    if line.len() > MAX_LINE_LEN {
        return Err(EncodeError::LineTooLong {
            actual: line.len(),
            limit: MAX_LINE_LEN,
        });
    }
    Ok(line)
}

/// `PASS <password>`
pub fn pass(password: &str) -> Result<String, EncodeError> {
    check_field("password", password)?;
    finish(format!("PASS :{}", password))
}

/// `NICK <nick>`
pub fn nick(nick: &str) -> Result<String, EncodeError> {
    check_target("nick", nick)?;
    finish(format!("NICK {}", nick))
}

/// `USER <username> 0 * :<realname>`
pub fn user(username: &str, realname: &str) -> Result<String, EncodeError> {
    check_target("username", username)?;
    check_field("realname", realname)?;
    finish(format!("USER {} 0 * :{}", username, realname))
}

/// `CAP <subcommand> [args]`
pub fn cap(subcommand: &str, args: Option<&str>) -> Result<String, EncodeError> {
    check_target("subcommand", subcommand)?;
    match args {
        Some(args) => {
            check_field("args", args)?;
            finish(format!("CAP {} :{}", subcommand, args))
        }
        None => finish(format!("CAP {}", subcommand)),
    }
}

/// `AUTHENTICATE <data>`
pub fn authenticate(data: &str) -> Result<String, EncodeError> {
    check_target("data", data)?;
    finish(format!("AUTHENTICATE {}", data))
}

/// `JOIN <channel> [key]`
pub fn join(channel: &str, key: Option<&str>) -> Result<String, EncodeError> {
    check_target("channel", channel)?;
    match key {
        Some(key) => {
            check_target("key", key)?;
            finish(format!("JOIN {} {}", channel, key))
        }
        None => finish(format!("JOIN {}", channel)),
    }
}

/// `PART <channel> [:reason]`
pub fn part(channel: &str, reason: Option<&str>) -> Result<String, EncodeError> {
    check_target("channel", channel)?;
    match reason {
        Some(reason) => {
            check_field("reason", reason)?;
            finish(format!("PART {} :{}", channel, reason))
        }
        None => finish(format!("PART {}", channel)),
    }
}

/// `PRIVMSG <target> :<text>`
pub fn privmsg(target: &str, text: &str) -> Result<String, EncodeError> {
    check_target("target", target)?;
    check_field("text", text)?;
    finish(format!("PRIVMSG {} :{}", target, text))
}

/// `PRIVMSG <target> :\x01ACTION <text>\x01`
pub fn action(target: &str, text: &str) -> Result<String, EncodeError> {
    check_target("target", target)?;
    check_field("text", text)?;
    finish(format!("PRIVMSG {} :{}", target, Ctcp::action(text)))
}

/// `NOTICE <target> :<text>`
pub fn notice(target: &str, text: &str) -> Result<String, EncodeError> {
    check_target("target", target)?;
    check_field("text", text)?;
    finish(format!("NOTICE {} :{}", target, text))
}

/// `PRIVMSG <target> :\x01<command> <args>\x01` — a CTCP request.
pub fn ctcp(target: &str, ctcp: &Ctcp<'_>) -> Result<String, EncodeError> {
    check_target("target", target)?;
    finish(format!("PRIVMSG {} :{}", target, ctcp))
}

/// `NOTICE <target> :\x01<command> <args>\x01` — a CTCP reply.
pub fn ctcp_reply(target: &str, ctcp: &Ctcp<'_>) -> Result<String, EncodeError> {
    check_target("target", target)?;
    finish(format!("NOTICE {} :{}", target, ctcp))
}

/// `TOPIC <channel>` (query) or `TOPIC <channel> :<topic>` (set).
pub fn topic(channel: &str, topic: Option<&str>) -> Result<String, EncodeError> {
    check_target("channel", channel)?;
    match topic {
        Some(topic) => {
            check_field("topic", topic)?;
            finish(format!("TOPIC {} :{}", channel, topic))
        }
        None => finish(format!("TOPIC {}", channel)),
    }
}

/// `MODE <target> [modes and args]`
pub fn mode(target: &str, modes: Option<&str>) -> Result<String, EncodeError> {
    check_target("target", target)?;
    match modes {
        Some(modes) => {
            check_field("modes", modes)?;
            finish(format!("MODE {} {}", target, modes))
        }
        None => finish(format!("MODE {}", target)),
    }
}

/// `KICK <channel> <nick> [:reason]`
pub fn kick(channel: &str, nick: &str, reason: Option<&str>) -> Result<String, EncodeError> {
    check_target("channel", channel)?;
    check_target("nick", nick)?;
    match reason {
        Some(reason) => {
            check_field("reason", reason)?;
            finish(format!("KICK {} {} :{}", channel, nick, reason))
        }
        None => finish(format!("KICK {} {}", channel, nick)),
    }
}

/// `INVITE <nick> <channel>`
pub fn invite(nick: &str, channel: &str) -> Result<String, EncodeError> {
    check_target("nick", nick)?;
    check_target("channel", channel)?;
    finish(format!("INVITE {} {}", nick, channel))
}

/// `WHOIS <nick>`
pub fn whois(nick: &str) -> Result<String, EncodeError> {
    check_target("nick", nick)?;
    finish(format!("WHOIS {}", nick))
}

/// `WHOWAS <nick>`
pub fn whowas(nick: &str) -> Result<String, EncodeError> {
    check_target("nick", nick)?;
    finish(format!("WHOWAS {}", nick))
}

/// `WHO <mask>`
pub fn who(mask: &str) -> Result<String, EncodeError> {
    check_target("mask", mask)?;
    finish(format!("WHO {}", mask))
}

/// `AWAY [:message]` — no message clears away status.
pub fn away(message: Option<&str>) -> Result<String, EncodeError> {
    match message {
        Some(message) => {
            check_field("message", message)?;
            finish(format!("AWAY :{}", message))
        }
        None => finish("AWAY".to_string()),
    }
}

/// `QUIT [:reason]`
pub fn quit(reason: Option<&str>) -> Result<String, EncodeError> {
    match reason {
        Some(reason) => {
            check_field("reason", reason)?;
            finish(format!("QUIT :{}", reason))
        }
        None => finish("QUIT".to_string()),
    }
}

/// `PONG :<token>`
pub fn pong(token: &str) -> Result<String, EncodeError> {
    check_field("token", token)?;
    finish(format!("PONG :{}", token))
}

/// A raw line, validated for framing safety and length only.
pub fn raw(line: &str) -> Result<String, EncodeError> {
    if line.is_empty() {
        return Err(EncodeError::EmptyTarget("line"));
    }
    check_field("line", line)?;
    finish(line.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_privmsg() {
        assert_eq!(
            privmsg("#rust", "hello").unwrap(),
            "PRIVMSG #rust :hello\r\n"
        );
    }

    #[test]
    fn test_action_wraps_ctcp() {
        assert_eq!(
            action("#rust", "waves").unwrap(),
            "PRIVMSG #rust :\x01ACTION waves\x01\r\n"
        );
    }

    #[test]
    fn test_ctcp_request_and_reply() {
        assert_eq!(
            ctcp("alice", &Ctcp::ping("987")).unwrap(),
            "PRIVMSG alice :\x01PING 987\x01\r\n"
        );
        assert_eq!(
            ctcp_reply("alice", &Ctcp::version()).unwrap(),
            "NOTICE alice :\x01VERSION\x01\r\n"
        );
    }

    #[test]
    fn test_empty_target_rejected() {
        assert_eq!(
            privmsg("", "hello").unwrap_err(),
            EncodeError::EmptyTarget("target")
        );
        assert_eq!(join("", None).unwrap_err(), EncodeError::EmptyTarget("channel"));
    }

    #[test]
    fn test_line_break_injection_rejected() {
        assert_eq!(
            privmsg("#rust", "hi\r\nQUIT").unwrap_err(),
            EncodeError::IllegalCharacter("text")
        );
        assert_eq!(
            nick("bad\nnick").unwrap_err(),
            EncodeError::IllegalCharacter("nick")
        );
        assert_eq!(
            privmsg("#a b", "hi").unwrap_err(),
            EncodeError::IllegalCharacter("target")
        );
    }

    #[test]
    fn test_length_limit_includes_crlf() {
        // "PRIVMSG #c :" is 12 bytes; 498 + 12 + 2 = 512 exactly.
        let text = "x".repeat(498);
        assert!(privmsg("#c", &text).is_ok());

        let text = "x".repeat(499);
        let err = privmsg("#c", &text).unwrap_err();
        assert_eq!(
            err,
            EncodeError::LineTooLong {
                actual: 513,
                limit: 512
            }
        );
    }

    #[test]
    fn test_optional_arguments() {
        assert_eq!(part("#a", None).unwrap(), "PART #a\r\n");
        assert_eq!(part("#a", Some("bye")).unwrap(), "PART #a :bye\r\n");
        assert_eq!(topic("#a", None).unwrap(), "TOPIC #a\r\n");
        assert_eq!(mode("#a", Some("+o nick")).unwrap(), "MODE #a +o nick\r\n");
        assert_eq!(away(None).unwrap(), "AWAY\r\n");
        assert_eq!(quit(Some("bye")).unwrap(), "QUIT :bye\r\n");
    }

    #[test]
    fn test_registration_commands() {
        assert_eq!(pass("secret").unwrap(), "PASS :secret\r\n");
        assert_eq!(nick("rustacean").unwrap(), "NICK rustacean\r\n");
        assert_eq!(
            user("rusty", "A Rust Client").unwrap(),
            "USER rusty 0 * :A Rust Client\r\n"
        );
        assert_eq!(cap("LS", Some("302")).unwrap(), "CAP LS :302\r\n");
        assert_eq!(cap("END", None).unwrap(), "CAP END\r\n");
    }

    #[test]
    fn test_raw_passthrough() {
        assert_eq!(raw("STATS u").unwrap(), "STATS u\r\n");
        assert!(raw("").is_err());
        assert!(raw("a\nb").is_err());
    }
}
