//! Outcome histograms returned by backends.
//!
//! Backends disagree on how they label two-bit outcomes: some report the
//! classical register as an integer (`0..=3`), others as a bitstring
//! (`"00"`, `"01"`, ...). [`OutcomeLabel`] keeps whatever the backend sent and
//! resolves it to a bit pair on demand.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Label of one measured outcome, as reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum OutcomeLabel {
    /// Integer register value; `0..=3` are valid two-bit outcomes.
    Index(u64),
    /// Bitstring register value; the last two characters are the measured pair.
    Bits(String),
}

impl OutcomeLabel {
    /// Classify a textual key.
    ///
    /// Two or more characters that are all `0`/`1` are a bitstring; any other
    /// decimal number is an integer register value. Everything else is kept
    /// as text and fails to resolve.
    pub fn from_key(key: &str) -> Self {
        if key.len() >= 2 && key.chars().all(|c| c == '0' || c == '1') {
            return OutcomeLabel::Bits(key.to_string());
        }
        match key.parse::<u64>() {
            Ok(index) => OutcomeLabel::Index(index),
            Err(_) => OutcomeLabel::Bits(key.to_string()),
        }
    }

    /// Integer value of the two-bit outcome (`0b00..=0b11`), if valid.
    pub fn index(&self) -> Option<u8> {
        match self {
            OutcomeLabel::Index(i) if *i <= 3 => Some(*i as u8),
            OutcomeLabel::Index(_) => None,
            OutcomeLabel::Bits(s) => {
                let tail = s.get(s.len().checked_sub(2)?..)?;
                let mut value = 0u8;
                for c in tail.chars() {
                    value = (value << 1)
                        | match c {
                            '0' => 0,
                            '1' => 1,
                            _ => return None,
                        };
                }
                Some(value)
            }
        }
    }

    /// The measured pair in label order (high bit first), if valid.
    pub fn pair(&self) -> Option<(u8, u8)> {
        self.index().map(|v| (v >> 1, v & 1))
    }
}

impl std::fmt::Display for OutcomeLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutcomeLabel::Index(i) => write!(f, "{i}"),
            OutcomeLabel::Bits(s) => write!(f, "{s}"),
        }
    }
}

impl From<OutcomeLabel> for String {
    fn from(label: OutcomeLabel) -> Self {
        label.to_string()
    }
}

impl From<String> for OutcomeLabel {
    fn from(key: String) -> Self {
        OutcomeLabel::from_key(&key)
    }
}

impl From<&str> for OutcomeLabel {
    fn from(key: &str) -> Self {
        OutcomeLabel::from_key(key)
    }
}

impl From<u64> for OutcomeLabel {
    fn from(index: u64) -> Self {
        OutcomeLabel::Index(index)
    }
}

/// Occurrence counts per outcome for one basis.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Histogram {
    counts: FxHashMap<OutcomeLabel, u64>,
}

impl Histogram {
    /// Create an empty histogram.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a histogram from `(label, count)` pairs.
    pub fn from_pairs<I, L>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (L, u64)>,
        L: Into<OutcomeLabel>,
    {
        let mut histogram = Self::new();
        for (label, count) in pairs {
            histogram.insert(label, count);
        }
        histogram
    }

    /// Add `count` occurrences of `label`.
    pub fn insert(&mut self, label: impl Into<OutcomeLabel>, count: u64) {
        *self.counts.entry(label.into()).or_insert(0) += count;
    }

    /// Occurrences recorded for `label`.
    pub fn get(&self, label: &OutcomeLabel) -> u64 {
        self.counts.get(label).copied().unwrap_or(0)
    }

    /// Iterate over `(label, count)` pairs in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (&OutcomeLabel, u64)> {
        self.counts.iter().map(|(label, count)| (label, *count))
    }

    /// Total number of recorded occurrences.
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    /// Number of distinct labels.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Check if no outcome was recorded.
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

impl<L: Into<OutcomeLabel>> FromIterator<(L, u64)> for Histogram {
    fn from_iter<I: IntoIterator<Item = (L, u64)>>(iter: I) -> Self {
        Self::from_pairs(iter)
    }
}
