//! Inbound line dispatch.
//!
//! [`dispatch`] is the single entry point for every decoded [`Line`]: it
//! routes textual commands and the entire numeric space 001–999, mutating
//! session/channel/whois state and emitting [`Action`]s. The function is
//! total over numerics: a code without a specific handler still produces a
//! `[NNN]`-prefixed raw record via the default arm, so nothing the server
//! says is silently swallowed.
//!
//! Display policy:
//! - Aggregation-protocol numerics (NAMES 353/366, WHOIS bursts, list-mode
//!   entries) feed their aggregators and emit nothing per line.
//! - Topic state numerics (331/332/333) and 329 mutate only; displaying the
//!   topic on join is the consumer's choice, made from tracker state.
//! - Replies to queries issued silently are suppressed via the session's
//!   pending-query table.

use chrono::{DateTime, TimeZone, Utc};
use tracing::trace;

use crate::casemap::irc_eq;
use crate::channel::{ChannelStatus, ChannelTracker, ListEntry, ListKind};
use crate::ctcp::{Ctcp, CtcpKind};
use crate::encode;
use crate::message::Line;
use crate::record::{Action, Event, MessageKind, MessageRecord, RawCategory};
use crate::response::Response;
use crate::session::{QueryKind, Session};
use crate::whois::WhoisTracker;

/// Mutable state the dispatcher operates on, borrowed from the engine.
pub(crate) struct DispatchCtx<'a> {
    pub session: &'a mut Session,
    pub channels: &'a mut ChannelTracker,
    pub whois: &'a mut WhoisTracker,
}

/// Route one decoded line. Never fails; malformed input never reaches here.
pub(crate) fn dispatch(ctx: &mut DispatchCtx<'_>, line: &Line) -> Vec<Action> {
    trace!(command = %line.command, "dispatching");
    if let Some(code) = line.numeric() {
        dispatch_numeric(ctx, line, code)
    } else {
        dispatch_command(ctx, line)
    }
}

/// Timestamp a record from the `server-time` tag when present.
fn stamp(line: &Line, rec: MessageRecord) -> MessageRecord {
    match line
        .server_time()
        .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
    {
        Some(ts) => rec.with_timestamp(ts.with_timezone(&Utc)),
        None => rec,
    }
}

fn record(actions: &mut Vec<Action>, line: &Line, rec: MessageRecord) {
    actions.push(Action::Record(Box::new(stamp(line, rec))));
}

/// Parameters from `from` onward joined for display (skips the leading
/// "our nick" parameter of numerics).
fn rest(line: &Line, from: usize) -> String {
    line.params[from.min(line.params.len())..].join(" ")
}

fn parse_unix(s: &str) -> Option<DateTime<Utc>> {
    s.parse::<i64>()
        .ok()
        .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
}

// ---------------------------------------------------------------- textual

fn dispatch_command(ctx: &mut DispatchCtx<'_>, line: &Line) -> Vec<Action> {
    let mut actions = Vec::new();
    match line.command.as_str() {
        "PING" => {
            let token = line.trailing().unwrap_or("");
            if let Ok(pong) = encode::pong(token) {
                actions.push(Action::Send(pong));
            }
        }
        "PONG" => {}
        "PRIVMSG" => handle_privmsg(ctx, line, &mut actions),
        "NOTICE" => handle_notice(ctx, line, &mut actions),
        "JOIN" => handle_join(ctx, line, &mut actions),
        "PART" => handle_part(ctx, line, &mut actions),
        "QUIT" => handle_quit(ctx, line, &mut actions),
        "NICK" => handle_nick(ctx, line, &mut actions),
        "MODE" => handle_mode(ctx, line, &mut actions),
        "TOPIC" => handle_topic(ctx, line, &mut actions),
        "KICK" => handle_kick(ctx, line, &mut actions),
        "INVITE" => {
            let channel = line.trailing().unwrap_or("");
            let sender = line.source_nick().unwrap_or("?");
            record(
                &mut actions,
                line,
                MessageRecord::new(
                    MessageKind::Event,
                    format!("{} invites you to {}", sender, channel),
                )
                .with_sender(sender),
            );
        }
        "CAP" => {
            // CAP <nick|*> <sub> [*] [:caps]
            let sub = line.arg_or_empty(1).to_string();
            let more = line.arg(2) == Some("*");
            let caps = line.trailing().filter(|t| *t != sub).unwrap_or("");
            actions.extend(ctx.session.on_cap(&sub, caps, more));
        }
        "AUTHENTICATE" => {
            let challenge = line.arg_or_empty(0);
            actions.extend(ctx.session.on_authenticate_challenge(challenge));
        }
        "ERROR" => {
            let reason = line.trailing().unwrap_or("connection terminated");
            actions.extend(ctx.session.on_server_error(reason));
        }
        "WALLOPS" => {
            let sender = line.source_nick().unwrap_or("server");
            record(
                &mut actions,
                line,
                MessageRecord::new(
                    MessageKind::Notice,
                    format!("WALLOPS: {}", line.trailing().unwrap_or("")),
                )
                .with_sender(sender),
            );
        }
        "AWAY" => {
            // Delivered under away-notify; state change, not conversation.
            if let Some(nick) = line.source_nick() {
                let text = match line.trailing().filter(|t| !t.is_empty()) {
                    Some(msg) => format!("{} is away: {}", nick, msg),
                    None => format!("{} is back", nick),
                };
                record(&mut actions, line, MessageRecord::raw(RawCategory::User, text));
            }
        }
        "ACCOUNT" => {
            // account-notify: login/logout of a visible user.
            if let Some(nick) = line.source_nick() {
                let text = match line.arg(0) {
                    Some("*") | None => format!("{} logged out", nick),
                    Some(account) => format!("{} logged in as {}", nick, account),
                };
                record(&mut actions, line, MessageRecord::raw(RawCategory::User, text));
            }
        }
        other => {
            record(
                &mut actions,
                line,
                MessageRecord::raw(
                    RawCategory::Server,
                    format!("{} {}", other, line.params.join(" ")),
                ),
            );
        }
    }
    actions
}

/// Conversation target for a PRIVMSG/NOTICE: the channel when addressed to
/// one, otherwise the sender (a private message lands in their window).
fn conversation_target<'a>(ctx: &DispatchCtx<'_>, line: &'a Line) -> &'a str {
    let target = line.arg_or_empty(0);
    if ctx.session.isupport().is_channel(target) {
        target
    } else {
        line.source_nick().unwrap_or(target)
    }
}

fn handle_privmsg(ctx: &mut DispatchCtx<'_>, line: &Line, actions: &mut Vec<Action>) {
    let sender = line.source_nick().unwrap_or("?").to_string();
    let target = conversation_target(ctx, line).to_string();
    let body = line.arg_or_empty(1);

    let rec = match Ctcp::parse(body) {
        Some(ctcp) if ctcp.kind == CtcpKind::Action => {
            MessageRecord::new(MessageKind::Action, ctcp.params.unwrap_or("").to_string())
        }
        Some(ctcp) => MessageRecord::new(
            MessageKind::Ctcp,
            match ctcp.params {
                Some(p) => format!("{} {}", ctcp.kind, p),
                None => ctcp.kind.to_string(),
            },
        ),
        None => MessageRecord::new(MessageKind::Privmsg, body.to_string()),
    };
    record(actions, line, rec.with_target(target).with_sender(sender));
}

fn handle_notice(ctx: &mut DispatchCtx<'_>, line: &Line, actions: &mut Vec<Action>) {
    let sender = line
        .prefix
        .as_ref()
        .map(|p| p.name().to_string())
        .unwrap_or_else(|| "server".to_string());
    let target = conversation_target(ctx, line).to_string();
    let body = line.arg_or_empty(1);

    let rec = match Ctcp::parse(body) {
        Some(ctcp) => MessageRecord::new(
            MessageKind::Ctcp,
            match ctcp.params {
                Some(p) => format!("{} reply: {}", ctcp.kind, p),
                None => format!("{} reply", ctcp.kind),
            },
        ),
        None => MessageRecord::new(MessageKind::Notice, body.to_string()),
    };
    record(actions, line, rec.with_target(target).with_sender(sender));
}

fn handle_join(ctx: &mut DispatchCtx<'_>, line: &Line, actions: &mut Vec<Action>) {
    let Some(nick) = line.source_nick().map(str::to_string) else {
        return;
    };
    // extended-join adds account/realname params after the channel.
    let channel = line.arg_or_empty(0).to_string();
    ctx.channels.join(&channel, &nick);
    record(
        actions,
        line,
        MessageRecord::new(MessageKind::Event, format!("{} has joined {}", nick, channel))
            .with_target(channel)
            .with_sender(nick),
    );
}

fn handle_part(ctx: &mut DispatchCtx<'_>, line: &Line, actions: &mut Vec<Action>) {
    let Some(nick) = line.source_nick().map(str::to_string) else {
        return;
    };
    let channel = line.arg_or_empty(0).to_string();

    if irc_eq(&nick, ctx.session.nick()) {
        ctx.channels.remove(&channel);
    } else {
        ctx.channels.part(&channel, &nick);
    }

    let text = match line.arg(1).filter(|r| !r.is_empty()) {
        Some(reason) => format!("{} has left {} ({})", nick, channel, reason),
        None => format!("{} has left {}", nick, channel),
    };
    record(
        actions,
        line,
        MessageRecord::new(MessageKind::Event, text)
            .with_target(channel)
            .with_sender(nick),
    );
}

fn handle_quit(ctx: &mut DispatchCtx<'_>, line: &Line, actions: &mut Vec<Action>) {
    let Some(nick) = line.source_nick().map(str::to_string) else {
        return;
    };
    let reason = line.trailing().unwrap_or("");
    let text = if reason.is_empty() {
        format!("{} has quit", nick)
    } else {
        format!("{} has quit ({})", nick, reason)
    };

    for channel in ctx.channels.quit(&nick) {
        record(
            actions,
            line,
            MessageRecord::new(MessageKind::Event, text.clone())
                .with_target(channel)
                .with_sender(nick.clone()),
        );
    }
}

fn handle_nick(ctx: &mut DispatchCtx<'_>, line: &Line, actions: &mut Vec<Action>) {
    let Some(old) = line.source_nick().map(str::to_string) else {
        return;
    };
    let new = line.arg_or_empty(0).to_string();

    actions.extend(ctx.session.on_nick_change(&old, &new));
    let text = format!("{} is now known as {}", old, new);
    for channel in ctx.channels.rename(&old, &new) {
        record(
            actions,
            line,
            MessageRecord::new(MessageKind::Event, text.clone())
                .with_target(channel)
                .with_sender(new.clone()),
        );
    }
}

fn handle_mode(ctx: &mut DispatchCtx<'_>, line: &Line, actions: &mut Vec<Action>) {
    let target = line.arg_or_empty(0).to_string();
    let sender = line.source_nick().unwrap_or("server").to_string();
    let mode_str = rest(line, 1);

    if ctx.session.isupport().is_channel(&target) {
        apply_channel_modes(ctx, &target, line);
        record(
            actions,
            line,
            MessageRecord::new(
                MessageKind::Event,
                format!("{} sets mode {} on {}", sender, mode_str, target),
            )
            .with_target(target)
            .with_sender(sender),
        );
    } else if irc_eq(&target, ctx.session.nick()) {
        ctx.session.set_user_modes(line.arg_or_empty(1));
        record(
            actions,
            line,
            MessageRecord::new(MessageKind::Event, format!("user mode {}", mode_str)),
        );
    }
}

/// Apply the membership-status portion of a channel MODE change.
///
/// Status modes (`qaohv`) consume one nick argument each; other modes are
/// left to the 324 snapshot.
fn apply_channel_modes(ctx: &mut DispatchCtx<'_>, channel: &str, line: &Line) {
    let modes = line.arg_or_empty(1);
    let mut arg_idx = 2;
    let mut adding = true;

    for c in modes.chars() {
        match c {
            '+' => adding = true,
            '-' => adding = false,
            _ => {
                if let Some(status) = ChannelStatus::from_mode(c) {
                    if let Some(nick) = line.arg(arg_idx) {
                        ctx.channels.apply_status_mode(channel, adding, status, nick);
                    }
                    arg_idx += 1;
                } else if mode_takes_arg(c, adding) {
                    arg_idx += 1;
                }
            }
        }
    }
}

/// Whether a non-status channel mode consumes an argument, per the common
/// type A/B/C split (list modes and keys do, simple flags do not).
fn mode_takes_arg(mode: char, adding: bool) -> bool {
    match mode {
        'b' | 'q' | 'e' | 'I' | 'k' => true,
        'l' | 'f' | 'j' => adding,
        _ => false,
    }
}

fn handle_topic(ctx: &mut DispatchCtx<'_>, line: &Line, actions: &mut Vec<Action>) {
    let channel = line.arg_or_empty(0).to_string();
    let topic = line.arg_or_empty(1).to_string();
    let sender = line.source_nick().unwrap_or("server").to_string();

    ctx.channels.set_topic(&channel, &topic);
    ctx.channels
        .set_topic_whotime(&channel, &sender, Some(Utc::now()));

    let text = if topic.is_empty() {
        format!("{} cleared the topic", sender)
    } else {
        format!("{} changed the topic to: {}", sender, topic)
    };
    record(
        actions,
        line,
        MessageRecord::new(MessageKind::Event, text)
            .with_target(channel)
            .with_sender(sender),
    );
}

fn handle_kick(ctx: &mut DispatchCtx<'_>, line: &Line, actions: &mut Vec<Action>) {
    let channel = line.arg_or_empty(0).to_string();
    let victim = line.arg_or_empty(1).to_string();
    let kicker = line.source_nick().unwrap_or("?").to_string();

    if irc_eq(&victim, ctx.session.nick()) {
        ctx.channels.remove(&channel);
    } else {
        ctx.channels.part(&channel, &victim);
    }

    let text = match line.arg(2).filter(|r| !r.is_empty()) {
        Some(reason) => format!("{} kicked {} from {} ({})", kicker, victim, channel, reason),
        None => format!("{} kicked {} from {}", kicker, victim, channel),
    };
    record(
        actions,
        line,
        MessageRecord::new(MessageKind::Event, text)
            .with_target(channel)
            .with_sender(kicker),
    );
}

// ---------------------------------------------------------------- numeric

fn dispatch_numeric(ctx: &mut DispatchCtx<'_>, line: &Line, code: u16) -> Vec<Action> {
    let mut actions = Vec::new();
    match code {
        // -- registration
        1 => {
            actions.extend(ctx.session.on_welcome(line.arg_or_empty(0)));
            record(
                &mut actions,
                line,
                MessageRecord::raw(RawCategory::Server, rest(line, 1)),
            );
        }
        5 => {
            // Last param is the "are supported by this server" text.
            let end = line.params.len().saturating_sub(1);
            let features = line.params.get(1..end).unwrap_or(&[]);
            ctx.session
                .isupport_mut()
                .apply(features.iter().map(String::as_str));
            record(
                &mut actions,
                line,
                MessageRecord::raw(RawCategory::Server, rest(line, 1)),
            );
        }

        // -- user modes (silent-suppressible, keyed on our own nick)
        221 => {
            ctx.session.set_user_modes(line.arg_or_empty(1));
            let nick = match line.arg(0) {
                Some(n) if !n.is_empty() => n.to_string(),
                _ => ctx.session.nick().to_string(),
            };
            if !ctx.session.take_query(QueryKind::ModeQuery, &nick) {
                record(
                    &mut actions,
                    line,
                    MessageRecord::raw(RawCategory::User, format!("user modes: {}", rest(line, 1))),
                );
            }
        }

        // -- away, inside or outside a WHOIS burst
        301 => {
            let nick = line.arg_or_empty(1).to_string();
            let msg = line.trailing().unwrap_or("").to_string();
            if ctx.whois.is_pending(&nick) {
                ctx.whois.entry(&nick).away = Some(msg);
            } else {
                record(
                    &mut actions,
                    line,
                    MessageRecord::raw(RawCategory::User, format!("{} is away: {}", nick, msg)),
                );
            }
        }

        // -- WHOIS/WHOWAS aggregation
        311 | 314 => {
            let nick = line.arg_or_empty(1).to_string();
            let entry = ctx.whois.entry(&nick);
            entry.username = line.arg(2).map(str::to_string);
            entry.hostname = line.arg(3).map(str::to_string);
            entry.realname = line.trailing().map(str::to_string);
            entry.historical = code == 314;
        }
        312 => {
            let entry = ctx.whois.entry(line.arg_or_empty(1));
            entry.server = line.arg(2).map(str::to_string);
            entry.server_info = line.trailing().map(str::to_string);
        }
        313 => {
            let entry = ctx.whois.entry(line.arg_or_empty(1));
            entry.is_oper = true;
            if let Some(note) = line.trailing() {
                entry.notes.push(note.to_string());
            }
        }
        317 => {
            let entry = ctx.whois.entry(line.arg_or_empty(1));
            entry.idle_secs = line.arg(2).and_then(|s| s.parse().ok());
            entry.signon = line.arg(3).and_then(parse_unix);
        }
        319 => {
            let entry = ctx.whois.entry(line.arg_or_empty(1));
            if let Some(channels) = line.trailing() {
                entry
                    .channels
                    .extend(channels.split_ascii_whitespace().map(str::to_string));
            }
        }
        330 => {
            let account = line.arg_or_empty(2).to_string();
            let entry = ctx.whois.entry(line.arg_or_empty(1));
            entry.notes.push(format!("is logged in as {}", account));
            entry.account = Some(account);
        }
        335 => {
            let entry = ctx.whois.entry(line.arg_or_empty(1));
            entry.is_bot = true;
            if let Some(note) = line.trailing() {
                entry.notes.push(note.to_string());
            }
        }
        338 => {
            let entry = ctx.whois.entry(line.arg_or_empty(1));
            entry.actual_host = line.arg(2).map(str::to_string);
        }
        671 => {
            let entry = ctx.whois.entry(line.arg_or_empty(1));
            entry.is_secure = true;
            if let Some(note) = line.trailing() {
                entry.notes.push(note.to_string());
            }
        }
        276 | 307 | 320 | 378 | 379 => {
            let entry = ctx.whois.entry(line.arg_or_empty(1));
            if let Some(note) = line.trailing() {
                entry.notes.push(note.to_string());
            }
        }
        318 | 369 => {
            let nick = line.arg_or_empty(1);
            let result = ctx.whois.finalize(nick);
            let label = if result.historical || code == 369 {
                "WHOWAS"
            } else {
                "WHOIS"
            };
            let summary = match result.userhost() {
                Some(uh) => format!(
                    "{} {}: {} ({})",
                    label,
                    result.nick,
                    uh,
                    result.realname.as_deref().unwrap_or("")
                ),
                None => format!("{} {}: no information", label, result.nick),
            };
            record(
                &mut actions,
                line,
                MessageRecord::raw(RawCategory::User, summary),
            );
            actions.push(Action::Event(Event::WhoisComplete(Box::new(result))));
        }

        // -- channel topic state (mutate only, never display)
        331 => ctx.channels.set_topic(line.arg_or_empty(1), ""),
        332 => ctx
            .channels
            .set_topic(line.arg_or_empty(1), line.arg_or_empty(2)),
        333 => {
            let set_at = line.arg(3).and_then(parse_unix);
            ctx.channels
                .set_topic_whotime(line.arg_or_empty(1), line.arg_or_empty(2), set_at);
        }

        // -- channel mode/creation state
        324 => {
            let channel = line.arg_or_empty(1).to_string();
            let modes = rest(line, 2);
            ctx.channels.set_modes(&channel, &modes);
            if !ctx.session.take_query(QueryKind::ModeQuery, &channel) {
                record(
                    &mut actions,
                    line,
                    MessageRecord::raw(
                        RawCategory::Channel,
                        format!("mode for {}: {}", channel, modes),
                    )
                    .with_target(channel),
                );
            }
        }
        329 => {
            if let Some(created) = line.arg(2).and_then(parse_unix) {
                ctx.channels.set_created_at(line.arg_or_empty(1), created);
            }
        }

        // -- NAMES aggregation
        353 => {
            // 353 <me> <kind> <channel> :names
            let channel = line.arg_or_empty(2).to_string();
            let prefix = ctx.session.isupport().prefix_spec();
            ctx.channels
                .append_names(&channel, line.trailing().unwrap_or(""), &prefix);
        }
        366 => {
            let channel = line.arg_or_empty(1).to_string();
            ctx.channels.finalize_names(&channel);
            actions.push(Action::Event(Event::UsersUpdated(channel)));
        }

        // -- list-mode aggregation
        367 | 728 | 346 | 348 => {
            let channel = line.arg_or_empty(1).to_string();
            // 728 carries the mode letter before the mask.
            let base = if code == 728 { 3 } else { 2 };
            let entry = ListEntry {
                mask: line.arg_or_empty(base).to_string(),
                set_by: line.arg(base + 1).map(str::to_string),
                set_at: line.arg(base + 2).and_then(parse_unix),
            };
            ctx.channels
                .push_list_entry(&channel, list_kind_for(code), entry);
        }
        368 | 729 | 347 | 349 => {
            let channel = line.arg_or_empty(1).to_string();
            let kind = list_kind_for(code);
            ctx.channels.finalize_list(&channel, kind);
            record(
                &mut actions,
                line,
                MessageRecord::raw(RawCategory::Channel, rest(line, 1)).with_target(channel),
            );
        }

        // -- WHO replies (silent-suppressible)
        352 => {
            // 352 <me> <channel> <user> <host> <server> <nick> ... — a WHO
            // on a channel echoes in the channel column, a WHO on a nick in
            // the nick column; check both against the pending mask.
            let silent = ctx.session.query_is_silent(QueryKind::Who, line.arg_or_empty(1))
                || ctx.session.query_is_silent(QueryKind::Who, line.arg_or_empty(5));
            if !silent {
                record(
                    &mut actions,
                    line,
                    MessageRecord::raw(RawCategory::User, rest(line, 1)),
                );
            }
        }
        315 => {
            let mask = line.arg_or_empty(1).to_string();
            if !ctx.session.take_query(QueryKind::Who, &mask) {
                record(
                    &mut actions,
                    line,
                    MessageRecord::raw(RawCategory::User, rest(line, 1)),
                );
            }
        }

        // -- nick collisions (retry before registration, error either way)
        432 | 433 | 436 | 437 => {
            record(
                &mut actions,
                line,
                MessageRecord::error(format!("[{:03}] {}", code, rest(line, 1))),
            );
            actions.extend(ctx.session.on_nick_collision());
        }

        // -- SASL outcome
        903 => {
            let text = line.trailing().unwrap_or("SASL authentication successful");
            let sasl_actions = ctx.session.on_sasl_result(true, text);
            if sasl_actions.is_empty() {
                record(
                    &mut actions,
                    line,
                    MessageRecord::raw(RawCategory::Auth, text.to_string()),
                );
            }
            actions.extend(sasl_actions);
        }
        902 | 904 | 905 | 906 | 907 => {
            let text = line.trailing().unwrap_or("SASL authentication failed");
            let sasl_actions = ctx.session.on_sasl_result(false, text);
            if sasl_actions.is_empty() {
                record(&mut actions, line, MessageRecord::error(text.to_string()));
            }
            actions.extend(sasl_actions);
        }

        // -- everything else: total by construction
        _ => {
            let named = Response::from_code(code);
            let text = format!("[{:03}] {}", code, rest(line, 1));
            let rec = match named {
                Some(resp) if resp.is_error() => MessageRecord::error(text),
                Some(resp) => MessageRecord::raw(resp.raw_category(), text),
                None if (400..600).contains(&code) => MessageRecord::error(text),
                None => MessageRecord::raw(RawCategory::Server, text),
            };
            record(&mut actions, line, rec);
        }
    }
    actions
}

fn list_kind_for(code: u16) -> ListKind {
    match code {
        367 | 368 => ListKind::Ban,
        728 | 729 => ListKind::Quiet,
        346 | 347 => ListKind::Invite,
        _ => ListKind::Except,
    }
}
