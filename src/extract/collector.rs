//! Accumulates the strings of one file.

use crate::types::{
    ExtractedStrings,
    MessageContext,
};

/// Accumulates the strings found in one file.
#[derive(Debug, Default)]
pub(super) struct StringsCollector {
    /// Collected strings by key and context.
    strings: ExtractedStrings,
}

impl StringsCollector {
    /// Creates an empty collector.
    pub(super) fn new() -> Self {
        Self::default()
    }

    /// Records one occurrence. Empty message ids are ignored.
    pub(super) fn add(
        &mut self,
        msgid: &str,
        context: MessageContext,
        comments: impl IntoIterator<Item = String>,
        reference: String,
    ) {
        if msgid.is_empty() {
            return;
        }

        let unit = self.strings.entry(msgid.to_string()).or_default().entry(context).or_default();
        unit.comments.extend(comments.into_iter().filter(|c| !c.is_empty()));
        unit.references.insert(reference);
    }

    /// Consumes the collector.
    pub(super) fn into_strings(self) -> ExtractedStrings {
        self.strings
    }
}
