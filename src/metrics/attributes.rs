//! Attribute sets: the dimensional keys of measurement streams.
//!
//! An [`AttributeSet`] is immutable once built, order-irrelevant, and
//! content-hashable, so two sets built independently from the same pairs
//! land on the same map entry.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::hash::{Hash, Hasher};

/// One attribute value.
///
/// Doubles hash and compare by bit pattern so the type can serve as a map
/// key (NaN equals itself under this scheme, which is what a key needs).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AttributeValue {
    /// Boolean attribute.
    Bool(bool),
    /// Integer attribute.
    Long(i64),
    /// Floating-point attribute.
    Double(f64),
    /// String attribute.
    String(String),
}

impl PartialEq for AttributeValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Long(a), Self::Long(b)) => a == b,
            (Self::Double(a), Self::Double(b)) => a.to_bits() == b.to_bits(),
            (Self::String(a), Self::String(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for AttributeValue {}

impl Hash for AttributeValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Self::Bool(v) => {
                state.write_u8(0);
                v.hash(state);
            },
            Self::Long(v) => {
                state.write_u8(1);
                v.hash(state);
            },
            Self::Double(v) => {
                state.write_u8(2);
                v.to_bits().hash(state);
            },
            Self::String(v) => {
                state.write_u8(3);
                v.hash(state);
            },
        }
    }
}

impl From<bool> for AttributeValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for AttributeValue {
    fn from(v: i64) -> Self {
        Self::Long(v)
    }
}

impl From<f64> for AttributeValue {
    fn from(v: f64) -> Self {
        Self::Double(v)
    }
}

impl From<&str> for AttributeValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_owned())
    }
}

impl From<String> for AttributeValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

/// An order-irrelevant key→value set identifying one measurement stream.
///
/// Construction sorts pairs by key and deduplicates with last-write-wins,
/// so equality and hashing are purely content-based. Attribute sets are
/// small in practice; storage is inline up to four pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttributeSet(SmallVec<[(String, AttributeValue); 4]>);

impl AttributeSet {
    /// Builds a set from key/value pairs. Duplicate keys keep the last
    /// value supplied.
    pub fn new<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<AttributeValue>,
        I: IntoIterator<Item = (K, V)>,
    {
        let mut raw: SmallVec<[(String, AttributeValue); 4]> = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        // Stable sort keeps insertion order among equal keys, so the last
        // occurrence survives deduplication.
        raw.sort_by(|a, b| a.0.cmp(&b.0));

        let mut out: SmallVec<[(String, AttributeValue); 4]> =
            SmallVec::with_capacity(raw.len());
        for pair in raw {
            match out.last_mut() {
                Some(last) if last.0 == pair.0 => *last = pair,
                _ => out.push(pair),
            }
        }
        Self(out)
    }

    /// The empty attribute set.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Looks up a value by key.
    pub fn get(&self, key: &str) -> Option<&AttributeValue> {
        self.0
            .binary_search_by(|(k, _)| k.as_str().cmp(key))
            .ok()
            .map(|idx| &self.0[idx].1)
    }

    /// Iterates pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttributeValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the set has no attributes.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for AttributeSet
where
    K: Into<String>,
    V: Into<AttributeValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::new(iter)
    }
}
