//! Key table: every translation key seen during one build run.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use super::delta::DeltaSet;
use super::references::merge_references;
use crate::types::{
    CatalogEntry,
    ContextMap,
    MessageContext,
    TranslationUnit,
};

/// Result of a single [`KeyTable::ingest`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestOutcome {
    /// (key, context) pairs that were not in the table before.
    pub new_pairs: usize,
    /// True if anything in the table changed, including comments and references.
    pub changed: bool,
}

/// In-memory map from message key to its contexts and metadata.
///
/// Contexts, comments and references only ever grow for the lifetime of the
/// table. Pairs added since the last [`KeyTable::clear_delta`] are tracked in
/// the delta set.
#[derive(Debug, Clone, Default)]
pub struct KeyTable {
    /// Key to its units by context.
    entries: BTreeMap<String, ContextMap>,
    /// Pairs added since the last flush.
    delta: DeltaSet,
    /// Bumped on every change, used by snapshot-diff flushing.
    generation: u64,
}

impl KeyTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds the extraction result of one key into the table.
    ///
    /// Ingesting the same input twice leaves the table and the delta set as
    /// they were after the first call.
    pub fn ingest(&mut self, key: &str, incoming: ContextMap) -> IngestOutcome {
        if incoming.is_empty() {
            return IngestOutcome::default();
        }

        let existing = match self.entries.entry(key.to_string()) {
            Entry::Vacant(vacant) => {
                for context in incoming.keys() {
                    self.delta.insert(key, context.clone());
                }
                let new_pairs = incoming.len();
                vacant.insert(incoming);
                self.generation += 1;
                return IngestOutcome { new_pairs, changed: true };
            }
            Entry::Occupied(occupied) => occupied.into_mut(),
        };

        let mut outcome = IngestOutcome::default();
        for (context, unit) in incoming {
            match existing.get_mut(&context) {
                Some(current) => {
                    if merge_unit(current, unit) {
                        outcome.changed = true;
                    }
                }
                None => {
                    self.delta.insert(key, context.clone());
                    existing.insert(context, unit);
                    outcome.new_pairs += 1;
                    outcome.changed = true;
                }
            }
        }

        if outcome.changed {
            self.generation += 1;
        }
        outcome
    }

    /// Units of `key`, by context.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ContextMap> {
        self.entries.get(key)
    }

    /// The unit of one (key, context) pair.
    #[must_use]
    pub fn unit(&self, key: &str, context: &MessageContext) -> Option<&TranslationUnit> {
        self.entries.get(key).and_then(|contexts| contexts.get(context))
    }

    /// Number of keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no key was ingested.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys in lexicographic order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Returns true if the pair is in the table.
    #[must_use]
    pub fn contains(&self, key: &str, context: &MessageContext) -> bool {
        self.unit(key, context).is_some()
    }

    /// Pairs added since the last [`KeyTable::clear_delta`].
    #[must_use]
    pub const fn delta(&self) -> &DeltaSet {
        &self.delta
    }

    /// Empties the delta set. The entries stay.
    pub fn clear_delta(&mut self) {
        self.delta.clear();
    }

    /// Change counter; equal generations mean an unchanged table.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Every (key, context) pair with its unit.
    #[must_use]
    pub fn entries(&self) -> Vec<CatalogEntry> {
        self.entries
            .iter()
            .flat_map(|(key, contexts)| {
                contexts.iter().map(|(context, unit)| CatalogEntry {
                    key: key.clone(),
                    context: context.clone(),
                    unit: unit.clone(),
                })
            })
            .collect()
    }

    /// The pairs of the delta set with their current units.
    #[must_use]
    pub fn delta_entries(&self) -> Vec<CatalogEntry> {
        self.delta
            .iter()
            .filter_map(|(key, context)| {
                self.unit(key, context).map(|unit| CatalogEntry {
                    key: key.to_string(),
                    context: context.clone(),
                    unit: unit.clone(),
                })
            })
            .collect()
    }
}

/// Merges an incoming unit into a stored one. Returns true if the stored unit changed.
///
/// An existing translation is never overwritten by extraction.
fn merge_unit(current: &mut TranslationUnit, incoming: TranslationUnit) -> bool {
    let before = current.clone();
    let incoming_translated = incoming.is_translated();
    let TranslationUnit { comments, references, translation } = incoming;

    current.comments.extend(comments);
    current.references = merge_references(&current.references, &references);
    if !current.is_translated() && incoming_translated {
        current.translation = translation;
    }

    *current != before
}
