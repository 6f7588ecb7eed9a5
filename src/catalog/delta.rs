//! (key, context) pairs observed since the last flush.

use std::collections::{
    BTreeMap,
    BTreeSet,
};

use crate::types::MessageContext;

/// Set of new (key, context) pairs, ordered by key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeltaSet {
    /// Contexts per key.
    pairs: BTreeMap<String, BTreeSet<MessageContext>>,
}

impl DeltaSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a pair. Returns true if it was not recorded yet.
    pub fn insert(&mut self, key: &str, context: MessageContext) -> bool {
        self.pairs.entry(key.to_string()).or_default().insert(context)
    }

    /// Returns true if the pair was recorded.
    #[must_use]
    pub fn contains(&self, key: &str, context: &MessageContext) -> bool {
        self.pairs.get(key).is_some_and(|contexts| contexts.contains(context))
    }

    /// Number of (key, context) pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pairs.values().map(BTreeSet::len).sum()
    }

    /// Returns true if no pair was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &MessageContext)> {
        self.pairs
            .iter()
            .flat_map(|(key, contexts)| contexts.iter().map(move |ctx| (key.as_str(), ctx)))
    }

    /// Forgets every recorded pair.
    pub fn clear(&mut self) {
        self.pairs.clear();
    }
}
