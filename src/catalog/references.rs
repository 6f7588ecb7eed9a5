//! Source reference reconciliation.

use std::collections::{
    BTreeSet,
    HashSet,
};

/// Returns the file portion of a `file:line` reference (text before the first `:`).
#[must_use]
pub fn file_portion(reference: &str) -> &str {
    reference.split_once(':').map_or(reference, |(file, _)| file)
}

/// Merges two reference sets for the same key.
///
/// A reference in `existing` is dropped when `incoming` carries any reference
/// to the same file; all of `incoming` is then added. Line numbers drift
/// across edits, so the most recent extraction of a file wins for that file
/// while references from other files are preserved.
#[must_use]
pub fn merge_references(
    existing: &BTreeSet<String>,
    incoming: &BTreeSet<String>,
) -> BTreeSet<String> {
    let incoming_files: HashSet<&str> = incoming.iter().map(|r| file_portion(r)).collect();

    existing
        .iter()
        .filter(|r| !incoming_files.contains(file_portion(r)))
        .chain(incoming)
        .cloned()
        .collect()
}
