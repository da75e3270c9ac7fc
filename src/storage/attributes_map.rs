//! Exclusively owned mapping from attribute set to aggregation state.

use crate::metrics::aggregate::Aggregation;
use crate::metrics::attributes::AttributeSet;
use ahash::RandomState;
use std::collections::HashMap;

/// One [`Aggregation`] per attribute set, exclusively owned by its holder.
///
/// The map never merges implicitly; callers decide merge semantics through
/// [`Aggregation::merge`] and [`Aggregation::diff`]. Ownership of the whole
/// mapping transfers on [`swap_out`](Self::swap_out).
#[derive(Debug, Default)]
pub struct AttributesHashMap {
    inner: HashMap<AttributeSet, Aggregation, RandomState>,
}

impl AttributesHashMap {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up the aggregation for an attribute set.
    pub fn get(&self, attributes: &AttributeSet) -> Option<&Aggregation> {
        self.inner.get(attributes)
    }

    /// Mutable lookup, for callers folding new state into an entry.
    pub fn get_mut(&mut self, attributes: &AttributeSet) -> Option<&mut Aggregation> {
        self.inner.get_mut(attributes)
    }

    /// Inserts or replaces the aggregation for an attribute set,
    /// consuming it.
    pub fn set(&mut self, attributes: AttributeSet, aggregation: Aggregation) {
        self.inner.insert(attributes, aggregation);
    }

    /// Visits every entry.
    pub fn for_each(&self, mut f: impl FnMut(&AttributeSet, &Aggregation)) {
        for (attributes, aggregation) in &self.inner {
            f(attributes, aggregation);
        }
    }

    /// Replaces the mapping with an empty one and returns the old mapping.
    pub fn swap_out(&mut self) -> AttributesHashMap {
        std::mem::take(self)
    }

    /// Number of attribute sets present.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Whether the map holds no entries.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl IntoIterator for AttributesHashMap {
    type Item = (AttributeSet, Aggregation);
    type IntoIter = std::collections::hash_map::IntoIter<AttributeSet, Aggregation>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.into_iter()
    }
}
