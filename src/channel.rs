//! Channel state tracking.
//!
//! [`ChannelTracker`] mirrors the server's view of every joined channel:
//! membership (with status prefixes), topic plus setter/time, simple modes,
//! creation time, and the ban/quiet/invite/exception list-mode entries.
//! Mutations are idempotent and create the channel implicitly; the tracker
//! is a cache of server truth, so "update a channel we never saw JOIN for"
//! is an ordinary event, not an error.
//!
//! Channel and nick keys are case-normalized with RFC 1459 rules; display
//! casing is preserved separately.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::casemap::irc_to_lower;
use crate::isupport::PrefixSpec;

/// Membership rank in a channel, lowest to highest.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ChannelStatus {
    /// Voiced (`+`).
    Voice,
    /// Half-operator (`%`).
    HalfOp,
    /// Operator (`@`).
    Op,
    /// Admin/protected (`&`).
    Admin,
    /// Owner/founder (`~`).
    Owner,
}

impl ChannelStatus {
    /// Rank for a conventional status sigil.
    pub fn from_sigil(sigil: char) -> Option<Self> {
        Some(match sigil {
            '~' => Self::Owner,
            '&' => Self::Admin,
            '@' => Self::Op,
            '%' => Self::HalfOp,
            '+' => Self::Voice,
            _ => return None,
        })
    }

    /// Rank for a channel membership mode letter (`qaohv`).
    pub fn from_mode(mode: char) -> Option<Self> {
        Some(match mode {
            'q' => Self::Owner,
            'a' => Self::Admin,
            'o' => Self::Op,
            'h' => Self::HalfOp,
            'v' => Self::Voice,
            _ => return None,
        })
    }

    /// Conventional display sigil.
    pub fn sigil(&self) -> char {
        match self {
            Self::Owner => '~',
            Self::Admin => '&',
            Self::Op => '@',
            Self::HalfOp => '%',
            Self::Voice => '+',
        }
    }
}

/// One member's full status set. With `multi-prefix` a member can hold
/// several ranks at once; the highest drives display, the rest are kept.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Membership {
    /// Nickname with original casing.
    pub nick: String,
    /// All held ranks, unordered.
    pub statuses: Vec<ChannelStatus>,
}

impl Membership {
    /// Plain member with no status.
    pub fn new(nick: impl Into<String>) -> Self {
        Self {
            nick: nick.into(),
            statuses: Vec::new(),
        }
    }

    /// Highest held rank, if any.
    pub fn highest(&self) -> Option<ChannelStatus> {
        self.statuses.iter().copied().max()
    }

    /// Display sigil for the highest rank, or empty.
    pub fn sigil(&self) -> String {
        self.highest().map(|s| s.sigil().to_string()).unwrap_or_default()
    }

    fn grant(&mut self, status: ChannelStatus) {
        if !self.statuses.contains(&status) {
            self.statuses.push(status);
        }
    }

    fn revoke(&mut self, status: ChannelStatus) {
        self.statuses.retain(|s| *s != status);
    }
}

/// Which list-mode a ban-style entry belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ListKind {
    /// `+b` bans (367/368).
    Ban,
    /// `+q` quiets (728/729).
    Quiet,
    /// `+I` invite exemptions (346/347).
    Invite,
    /// `+e` ban exceptions (348/349).
    Except,
}

/// One ban/quiet/invite/exception entry.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ListEntry {
    /// The hostmask.
    pub mask: String,
    /// Who set it, when the server says.
    pub set_by: Option<String>,
    /// When it was set, when the server says.
    pub set_at: Option<DateTime<Utc>>,
}

/// State of one channel as last reported by the server.
#[derive(Clone, Debug, Default)]
pub struct ChannelState {
    /// Channel name with original casing.
    pub name: String,
    /// Current topic text, if known. `Some("")` means explicitly unset.
    pub topic: Option<String>,
    /// Who set the topic (333).
    pub topic_set_by: Option<String>,
    /// When the topic was set (333).
    pub topic_set_at: Option<DateTime<Utc>>,
    /// Simple channel modes as last reported (324), e.g. `+nt`.
    pub modes: Option<String>,
    /// Channel creation time (329).
    pub created_at: Option<DateTime<Utc>>,
    /// Members, keyed by case-normalized nick.
    pub members: HashMap<String, Membership>,
    /// List-mode entries, replaced wholesale on each finalized aggregation.
    lists: HashMap<ListKind, Vec<ListEntry>>,
    /// In-flight NAMES replacement set; present only between the first 353
    /// and its 366.
    names_buffer: Option<HashMap<String, Membership>>,
    /// In-flight list-mode aggregations.
    list_buffers: HashMap<ListKind, Vec<ListEntry>>,
}

impl ChannelState {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    /// Finalized entries for one list-mode, empty if never aggregated.
    pub fn list(&self, kind: ListKind) -> &[ListEntry] {
        self.lists.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Look up a member by nick, case-insensitively.
    pub fn member(&self, nick: &str) -> Option<&Membership> {
        self.members.get(&irc_to_lower(nick))
    }

    /// Member nicks sorted by rank (highest first), then name.
    pub fn sorted_members(&self) -> Vec<&Membership> {
        let mut out: Vec<&Membership> = self.members.values().collect();
        out.sort_by(|a, b| {
            b.highest()
                .cmp(&a.highest())
                .then_with(|| irc_to_lower(&a.nick).cmp(&irc_to_lower(&b.nick)))
        });
        out
    }
}

/// All channel state for one connection.
#[derive(Clone, Debug, Default)]
pub struct ChannelTracker {
    channels: HashMap<String, ChannelState>,
}

impl ChannelTracker {
    /// Empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a channel, case-insensitively.
    pub fn get(&self, name: &str) -> Option<&ChannelState> {
        self.channels.get(&irc_to_lower(name))
    }

    /// Iterate all tracked channels.
    pub fn iter(&self) -> impl Iterator<Item = &ChannelState> {
        self.channels.values()
    }

    /// Number of tracked channels.
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    /// Whether no channels are tracked.
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Channel entry, created on first touch.
    pub fn ensure(&mut self, name: &str) -> &mut ChannelState {
        self.channels
            .entry(irc_to_lower(name))
            .or_insert_with(|| ChannelState::new(name))
    }

    /// Forget a channel entirely (we parted or were kicked).
    pub fn remove(&mut self, name: &str) -> Option<ChannelState> {
        self.channels.remove(&irc_to_lower(name))
    }

    /// Drop all state.
    pub fn clear(&mut self) {
        self.channels.clear();
    }

    /// Record a user joining a channel.
    pub fn join(&mut self, channel: &str, nick: &str) {
        self.ensure(channel)
            .members
            .insert(irc_to_lower(nick), Membership::new(nick));
    }

    /// Record a user leaving a channel.
    pub fn part(&mut self, channel: &str, nick: &str) {
        if let Some(chan) = self.channels.get_mut(&irc_to_lower(channel)) {
            chan.members.remove(&irc_to_lower(nick));
        }
    }

    /// Record a user quitting the network. Returns the display names of the
    /// channels they were on, for per-channel quit records.
    pub fn quit(&mut self, nick: &str) -> Vec<String> {
        let key = irc_to_lower(nick);
        let mut affected = Vec::new();
        for chan in self.channels.values_mut() {
            if chan.members.remove(&key).is_some() {
                affected.push(chan.name.clone());
            }
        }
        affected
    }

    /// Record a nick change across all channels. Returns the affected
    /// channels' display names.
    pub fn rename(&mut self, old: &str, new: &str) -> Vec<String> {
        let old_key = irc_to_lower(old);
        let new_key = irc_to_lower(new);
        let mut affected = Vec::new();
        for chan in self.channels.values_mut() {
            if let Some(mut member) = chan.members.remove(&old_key) {
                member.nick = new.to_string();
                chan.members.insert(new_key.clone(), member);
                affected.push(chan.name.clone());
            }
        }
        affected
    }

    /// Set the topic text (332, or TOPIC command).
    pub fn set_topic(&mut self, channel: &str, topic: &str) {
        self.ensure(channel).topic = Some(topic.to_string());
    }

    /// Set topic attribution (333).
    pub fn set_topic_whotime(
        &mut self,
        channel: &str,
        set_by: &str,
        set_at: Option<DateTime<Utc>>,
    ) {
        let chan = self.ensure(channel);
        chan.topic_set_by = Some(set_by.to_string());
        chan.topic_set_at = set_at;
    }

    /// Set the simple mode string (324).
    pub fn set_modes(&mut self, channel: &str, modes: &str) {
        self.ensure(channel).modes = Some(modes.to_string());
    }

    /// Set the creation time (329).
    pub fn set_created_at(&mut self, channel: &str, created: DateTime<Utc>) {
        self.ensure(channel).created_at = Some(created);
    }

    /// Grant or revoke a membership rank (MODE +o/-v and friends).
    pub fn apply_status_mode(
        &mut self,
        channel: &str,
        add: bool,
        status: ChannelStatus,
        nick: &str,
    ) {
        let chan = self.ensure(channel);
        let member = chan
            .members
            .entry(irc_to_lower(nick))
            .or_insert_with(|| Membership::new(nick));
        if add {
            member.grant(status);
        } else {
            member.revoke(status);
        }
    }

    /// Fold one 353 name list into the in-flight NAMES buffer, creating the
    /// buffer on the first line of a burst.
    ///
    /// Each token is `[sigils]nick`; with `multi-prefix` several sigils may
    /// stack. Sigil meaning follows the server's PREFIX mapping.
    pub fn append_names(&mut self, channel: &str, names: &str, prefix: &PrefixSpec) {
        let chan = self.ensure(channel);
        let buffer = chan.names_buffer.get_or_insert_with(HashMap::new);

        for token in names.split_ascii_whitespace() {
            let stripped = token.trim_start_matches(|c| prefix.is_sigil(c));
            if stripped.is_empty() {
                continue;
            }
            let mut member = Membership::new(stripped);
            for sigil in token[..token.len() - stripped.len()].chars() {
                if let Some(status) = prefix.status_for_sigil(sigil) {
                    member.grant(status);
                }
            }
            buffer.insert(irc_to_lower(stripped), member);
        }
    }

    /// Replace the membership map with the aggregated NAMES buffer (366).
    ///
    /// With no buffer (end without a begin) the membership map becomes
    /// empty, which is what the server just told us.
    pub fn finalize_names(&mut self, channel: &str) {
        let chan = self.ensure(channel);
        chan.members = chan.names_buffer.take().unwrap_or_default();
    }

    /// Buffer one list-mode entry (367/728/346/348).
    pub fn push_list_entry(&mut self, channel: &str, kind: ListKind, entry: ListEntry) {
        self.ensure(channel)
            .list_buffers
            .entry(kind)
            .or_default()
            .push(entry);
    }

    /// Replace the stored list with the aggregated entries (368/729/347/349).
    pub fn finalize_list(&mut self, channel: &str, kind: ListKind) {
        let chan = self.ensure(channel);
        let entries = chan.list_buffers.remove(&kind).unwrap_or_default();
        chan.lists.insert(kind, entries);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec() -> PrefixSpec {
        PrefixSpec::default()
    }

    #[test]
    fn test_implicit_creation_and_casemap() {
        let mut tracker = ChannelTracker::new();
        tracker.set_topic("#Rust", "systems programming");
        let chan = tracker.get("#rust").unwrap();
        assert_eq!(chan.name, "#Rust");
        assert_eq!(chan.topic.as_deref(), Some("systems programming"));
    }

    #[test]
    fn test_join_part_quit() {
        let mut tracker = ChannelTracker::new();
        tracker.join("#a", "Alice");
        tracker.join("#a", "bob");
        tracker.join("#b", "Alice");

        tracker.part("#a", "BOB");
        assert!(tracker.get("#a").unwrap().member("bob").is_none());

        let mut affected = tracker.quit("alice");
        affected.sort();
        assert_eq!(affected, vec!["#a".to_string(), "#b".to_string()]);
        assert!(tracker.get("#a").unwrap().members.is_empty());
    }

    #[test]
    fn test_rename_preserves_status() {
        let mut tracker = ChannelTracker::new();
        tracker.join("#a", "old");
        tracker.apply_status_mode("#a", true, ChannelStatus::Op, "old");

        let affected = tracker.rename("OLD", "new");
        assert_eq!(affected, vec!["#a".to_string()]);
        let member = tracker.get("#a").unwrap().member("new").unwrap();
        assert_eq!(member.nick, "new");
        assert_eq!(member.highest(), Some(ChannelStatus::Op));
    }

    #[test]
    fn test_names_aggregation_replaces() {
        let mut tracker = ChannelTracker::new();
        tracker.join("#a", "stale");

        tracker.append_names("#a", "@alice +bob", &spec());
        // Replacement is not visible until the terminator.
        assert!(tracker.get("#a").unwrap().member("alice").is_none());

        tracker.append_names("#a", "carol", &spec());
        tracker.finalize_names("#a");

        let chan = tracker.get("#a").unwrap();
        assert!(chan.member("stale").is_none());
        assert_eq!(chan.members.len(), 3);
        assert_eq!(
            chan.member("alice").unwrap().highest(),
            Some(ChannelStatus::Op)
        );
        assert_eq!(
            chan.member("bob").unwrap().highest(),
            Some(ChannelStatus::Voice)
        );
        assert_eq!(chan.member("carol").unwrap().highest(), None);
    }

    #[test]
    fn test_finalize_without_begin_empties() {
        let mut tracker = ChannelTracker::new();
        tracker.join("#a", "alice");
        tracker.finalize_names("#a");
        assert!(tracker.get("#a").unwrap().members.is_empty());
    }

    #[test]
    fn test_multi_prefix_highest_wins() {
        let mut tracker = ChannelTracker::new();
        let spec = PrefixSpec::parse("(qaohv)~&@%+").unwrap();
        tracker.append_names("#a", "~@+founder", &spec);
        tracker.finalize_names("#a");

        let member = tracker.get("#a").unwrap().member("founder").unwrap();
        assert_eq!(member.highest(), Some(ChannelStatus::Owner));
        assert_eq!(member.statuses.len(), 3);
        assert_eq!(member.sigil(), "~");
    }

    #[test]
    fn test_status_mode_grant_revoke() {
        let mut tracker = ChannelTracker::new();
        tracker.join("#a", "alice");
        tracker.apply_status_mode("#a", true, ChannelStatus::Op, "alice");
        tracker.apply_status_mode("#a", true, ChannelStatus::Voice, "alice");
        assert_eq!(
            tracker.get("#a").unwrap().member("alice").unwrap().highest(),
            Some(ChannelStatus::Op)
        );

        tracker.apply_status_mode("#a", false, ChannelStatus::Op, "alice");
        assert_eq!(
            tracker.get("#a").unwrap().member("alice").unwrap().highest(),
            Some(ChannelStatus::Voice)
        );
    }

    #[test]
    fn test_list_aggregation() {
        let mut tracker = ChannelTracker::new();
        let entry = |mask: &str| ListEntry {
            mask: mask.to_string(),
            set_by: Some("oper".to_string()),
            set_at: None,
        };

        tracker.push_list_entry("#a", ListKind::Ban, entry("*!*@bad.example"));
        tracker.push_list_entry("#a", ListKind::Ban, entry("*!*@worse.example"));
        assert!(tracker.get("#a").unwrap().list(ListKind::Ban).is_empty());

        tracker.finalize_list("#a", ListKind::Ban);
        assert_eq!(tracker.get("#a").unwrap().list(ListKind::Ban).len(), 2);

        // A later aggregation replaces, never appends.
        tracker.finalize_list("#a", ListKind::Ban);
        assert!(tracker.get("#a").unwrap().list(ListKind::Ban).is_empty());
    }

    #[test]
    fn test_sorted_members() {
        let mut tracker = ChannelTracker::new();
        tracker.append_names("#a", "bob @alice +zoe carol", &spec());
        tracker.finalize_names("#a");

        let order: Vec<&str> = tracker
            .get("#a")
            .unwrap()
            .sorted_members()
            .iter()
            .map(|m| m.nick.as_str())
            .collect();
        assert_eq!(order, vec!["alice", "zoe", "bob", "carol"]);
    }
}
