//! Server feature table (RPL_ISUPPORT, numeric 005).
//!
//! Servers advertise their dialect as `TOKEN` / `TOKEN=value` /
//! `-TOKEN` (negation) parameters across one or more 005 lines. The table
//! accumulates them verbatim and exposes typed accessors for the tokens the
//! engine acts on: `PREFIX`, `CHANTYPES`, `NETWORK`, `CASEMAPPING`.
//!
//! # Reference
//! - <https://modern.ircdocs.horse/#rplisupport-005>

use std::collections::HashMap;

use crate::channel::ChannelStatus;

/// Parsed `PREFIX` token: parallel mode letters and status sigils.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PrefixSpec {
    /// Mode letters, highest rank first (e.g. `ov`).
    pub modes: Vec<char>,
    /// Status sigils in the same order (e.g. `@+`).
    pub sigils: Vec<char>,
}

impl PrefixSpec {
    /// Parse a `(modes)sigils` value. Returns `None` on malformed input.
    pub fn parse(value: &str) -> Option<Self> {
        let rest = value.strip_prefix('(')?;
        let (modes, sigils) = rest.split_once(')')?;
        if modes.chars().count() != sigils.chars().count() {
            return None;
        }
        Some(Self {
            modes: modes.chars().collect(),
            sigils: sigils.chars().collect(),
        })
    }

    /// Whether `c` is a status sigil under this mapping.
    pub fn is_sigil(&self, c: char) -> bool {
        self.sigils.contains(&c)
    }

    /// Map a status sigil to a membership rank under this mapping.
    ///
    /// Resolves through the sigil's mode letter first, falling back to the
    /// conventional sigil meaning when the letter names no known rank.
    pub fn status_for_sigil(&self, sigil: char) -> Option<ChannelStatus> {
        let idx = self.sigils.iter().position(|&s| s == sigil)?;
        self.modes
            .get(idx)
            .copied()
            .and_then(ChannelStatus::from_mode)
            .or_else(|| ChannelStatus::from_sigil(sigil))
    }
}

impl Default for PrefixSpec {
    /// The conventional `(ov)@+` mapping.
    fn default() -> Self {
        Self {
            modes: vec!['o', 'v'],
            sigils: vec!['@', '+'],
        }
    }
}

/// Accumulated 005 feature table for one connection.
#[derive(Clone, Debug, Default)]
pub struct Isupport {
    entries: HashMap<String, Option<String>>,
    prefix: Option<PrefixSpec>,
}

impl Isupport {
    /// Empty table with default assumptions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one 005 line's feature parameters into the table.
    ///
    /// `params` excludes the leading nick and the trailing "are supported by
    /// this server" text.
    pub fn apply<'a, I: IntoIterator<Item = &'a str>>(&mut self, params: I) {
        for token in params {
            if let Some(negated) = token.strip_prefix('-') {
                self.entries.remove(&negated.to_ascii_uppercase());
                if negated.eq_ignore_ascii_case("PREFIX") {
                    self.prefix = None;
                }
                continue;
            }

            let (key, value) = match token.split_once('=') {
                Some((k, v)) => (k.to_ascii_uppercase(), Some(v.to_string())),
                None => (token.to_ascii_uppercase(), None),
            };

            if key == "PREFIX" {
                self.prefix = value.as_deref().and_then(PrefixSpec::parse);
            }
            self.entries.insert(key, value);
        }
    }

    /// Raw value of a token, if advertised.
    pub fn get(&self, key: &str) -> Option<Option<&str>> {
        self.entries
            .get(&key.to_ascii_uppercase())
            .map(|v| v.as_deref())
    }

    /// Network name from `NETWORK=`, if advertised.
    pub fn network(&self) -> Option<&str> {
        self.get("NETWORK").flatten()
    }

    /// Channel type sigils; defaults to `#&`.
    pub fn chantypes(&self) -> &str {
        self.get("CHANTYPES").flatten().unwrap_or("#&")
    }

    /// Advertised casemapping name; defaults to `rfc1459`.
    pub fn casemapping(&self) -> &str {
        self.get("CASEMAPPING").flatten().unwrap_or("rfc1459")
    }

    /// The membership prefix mapping in effect.
    pub fn prefix_spec(&self) -> PrefixSpec {
        self.prefix.clone().unwrap_or_default()
    }

    /// Whether a target names a channel under the advertised CHANTYPES.
    pub fn is_channel(&self, target: &str) -> bool {
        target
            .chars()
            .next()
            .is_some_and(|c| self.chantypes().contains(c))
    }

    /// Map a status sigil to a membership rank under the current mapping.
    pub fn status_for_sigil(&self, sigil: char) -> Option<ChannelStatus> {
        self.prefix_spec().status_for_sigil(sigil)
    }

    /// Drop everything accumulated so far.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.prefix = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_and_get() {
        let mut table = Isupport::new();
        table.apply(["NETWORK=Libera.Chat", "CHANTYPES=#", "EXCEPTS"]);
        assert_eq!(table.network(), Some("Libera.Chat"));
        assert_eq!(table.chantypes(), "#");
        assert_eq!(table.get("EXCEPTS"), Some(None));
        assert_eq!(table.get("UNKNOWN"), None);
    }

    #[test]
    fn test_negation_removes() {
        let mut table = Isupport::new();
        table.apply(["EXCEPTS"]);
        table.apply(["-EXCEPTS"]);
        assert_eq!(table.get("EXCEPTS"), None);
    }

    #[test]
    fn test_defaults() {
        let table = Isupport::new();
        assert_eq!(table.chantypes(), "#&");
        assert_eq!(table.casemapping(), "rfc1459");
        assert_eq!(table.prefix_spec(), PrefixSpec::default());
    }

    #[test]
    fn test_prefix_spec_parse() {
        let spec = PrefixSpec::parse("(qaohv)~&@%+").unwrap();
        assert_eq!(spec.modes, vec!['q', 'a', 'o', 'h', 'v']);
        assert_eq!(spec.sigils, vec!['~', '&', '@', '%', '+']);
        assert!(PrefixSpec::parse("(ov)@").is_none());
        assert!(PrefixSpec::parse("ov@+").is_none());
    }

    #[test]
    fn test_prefix_spec_sigil_resolution() {
        // Unknown mode letter falls back to the conventional sigil meaning.
        let spec = PrefixSpec::parse("(zv)@+").unwrap();
        assert_eq!(spec.status_for_sigil('@'), Some(ChannelStatus::Op));
        assert_eq!(spec.status_for_sigil('+'), Some(ChannelStatus::Voice));
        assert_eq!(spec.status_for_sigil('~'), None);
    }

    #[test]
    fn test_status_for_sigil_honors_prefix() {
        let mut table = Isupport::new();
        table.apply(["PREFIX=(qaohv)~&@%+"]);
        assert_eq!(table.status_for_sigil('~'), Some(ChannelStatus::Owner));
        assert_eq!(table.status_for_sigil('%'), Some(ChannelStatus::HalfOp));
        assert_eq!(table.status_for_sigil('+'), Some(ChannelStatus::Voice));
        assert_eq!(table.status_for_sigil('?'), None);
    }

    #[test]
    fn test_is_channel() {
        let mut table = Isupport::new();
        assert!(table.is_channel("#rust"));
        assert!(table.is_channel("&local"));
        assert!(!table.is_channel("nick"));

        table.apply(["CHANTYPES=#"]);
        assert!(!table.is_channel("&local"));
    }
}
