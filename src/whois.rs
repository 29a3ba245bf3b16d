//! WHOIS/WHOWAS reply aggregation.
//!
//! A WHOIS answer arrives as a burst of numerics (311, 312, 317, 319, 330,
//! ...) closed by 318; WHOWAS uses 314 closed by 369. [`WhoisTracker`]
//! accumulates the burst per target nick and hands back one structured
//! [`WhoisResult`] at the terminator. Entries that never see a terminator
//! are swept by [`WhoisTracker::expire`], which the driver calls on its own
//! clock.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};

use crate::casemap::irc_to_lower;

/// Aggregated WHOIS (or WHOWAS) answer for one nick.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WhoisResult {
    /// Target nick, display casing from the first reply.
    pub nick: String,
    /// Username (ident) from 311/314.
    pub username: Option<String>,
    /// Hostname from 311/314.
    pub hostname: Option<String>,
    /// Realname (gecos) from 311/314.
    pub realname: Option<String>,
    /// Server the user is (was) on, from 312.
    pub server: Option<String>,
    /// Server description from 312.
    pub server_info: Option<String>,
    /// Seconds idle, from 317.
    pub idle_secs: Option<u64>,
    /// Sign-on time, from 317.
    pub signon: Option<DateTime<Utc>>,
    /// Channels with status prefixes, from 319 (may span lines).
    pub channels: Vec<String>,
    /// Services account, from 330.
    pub account: Option<String>,
    /// Actual host/IP, from 338.
    pub actual_host: Option<String>,
    /// Away message, from 301 inside the burst.
    pub away: Option<String>,
    /// Free-text lines (313 oper, 320 special, 378 host, 379 modes, 671
    /// secure, 335 bot, 307 registered) in arrival order.
    pub notes: Vec<String>,
    /// Operator flag, from 313.
    pub is_oper: bool,
    /// TLS flag, from 671.
    pub is_secure: bool,
    /// Bot flag, from 335.
    pub is_bot: bool,
    /// True when this came from WHOWAS (314/369).
    pub historical: bool,
}

impl WhoisResult {
    /// Empty result for a nick, as produced by a terminator with no burst.
    pub fn empty(nick: impl Into<String>) -> Self {
        Self {
            nick: nick.into(),
            ..Self::default()
        }
    }

    /// `user@host`, when both are known.
    pub fn userhost(&self) -> Option<String> {
        match (&self.username, &self.hostname) {
            (Some(u), Some(h)) => Some(format!("{}@{}", u, h)),
            _ => None,
        }
    }
}

struct PendingWhois {
    result: WhoisResult,
    started_at: DateTime<Utc>,
}

/// In-flight WHOIS/WHOWAS aggregations, keyed by case-normalized nick.
#[derive(Default)]
pub struct WhoisTracker {
    pending: HashMap<String, PendingWhois>,
}

impl WhoisTracker {
    /// Empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of in-flight aggregations.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Whether an aggregation is in flight for `nick`.
    ///
    /// Used to route numerics that occur both inside and outside a WHOIS
    /// burst (301 away) to the right consumer.
    pub fn is_pending(&self, nick: &str) -> bool {
        self.pending.contains_key(&irc_to_lower(nick))
    }

    /// Mutable access to the aggregation for `nick`, created on first touch.
    pub fn entry(&mut self, nick: &str) -> &mut WhoisResult {
        let pending = self
            .pending
            .entry(irc_to_lower(nick))
            .or_insert_with(|| PendingWhois {
                result: WhoisResult::empty(nick),
                started_at: Utc::now(),
            });
        &mut pending.result
    }

    /// Close the aggregation for `nick` and hand back the result.
    ///
    /// A terminator with no preceding burst yields an empty result; the
    /// consumer still learns the query completed.
    pub fn finalize(&mut self, nick: &str) -> WhoisResult {
        self.pending
            .remove(&irc_to_lower(nick))
            .map(|p| p.result)
            .unwrap_or_else(|| WhoisResult::empty(nick))
    }

    /// Drop aggregations older than `ttl`. Returns how many were dropped.
    ///
    /// Guards against servers that never send the terminator.
    pub fn expire(&mut self, now: DateTime<Utc>, ttl: Duration) -> usize {
        let before = self.pending.len();
        self.pending.retain(|_, p| now - p.started_at < ttl);
        before - self.pending.len()
    }

    /// Drop everything in flight.
    pub fn clear(&mut self) {
        self.pending.clear();
    }
}
