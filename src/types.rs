//! Core types used throughout the project.

use std::collections::{
    BTreeMap,
    BTreeSet,
};
use std::fmt;

use serde::{
    Deserialize,
    Serialize,
};

/// Reserved marker for a unit extracted without an explicit context.
///
/// Raw extractor output uses this string as the context key; it never collides
/// with a real context because [`MessageContext`] keeps the two apart.
pub const NO_CONTEXT: &str = "$$noContext";

/// Disambiguating context of a message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MessageContext {
    /// No explicit context was given.
    None,
    /// A named context (e.g. `"button"`).
    Named(String),
}

impl MessageContext {
    /// Creates a context from a PO `msgctxt` value. An empty value means no context.
    #[must_use]
    pub fn from_msgctxt(msgctxt: Option<&str>) -> Self {
        match msgctxt {
            Some(ctx) if !ctx.is_empty() => Self::Named(ctx.to_string()),
            _ => Self::None,
        }
    }

    /// Returns the PO `msgctxt` value for this context.
    #[must_use]
    pub fn as_msgctxt(&self) -> Option<&str> {
        match self {
            Self::None => None,
            Self::Named(ctx) => Some(ctx),
        }
    }

    /// Returns true for a message without context.
    #[must_use]
    pub const fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

impl From<&str> for MessageContext {
    fn from(raw: &str) -> Self {
        if raw == NO_CONTEXT { Self::None } else { Self::from_msgctxt(Some(raw)) }
    }
}

impl fmt::Display for MessageContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str(NO_CONTEXT),
            Self::Named(ctx) => f.write_str(ctx),
        }
    }
}

/// One extracted occurrence of a message under a single context.
///
/// `comments` and `references` are sets, so they are deduplicated and sorted
/// lexicographically by construction.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TranslationUnit {
    /// Developer-facing annotations.
    pub comments: BTreeSet<String>,
    /// Source locations in `file:line` form.
    pub references: BTreeSet<String>,
    /// Human translation; empty for freshly extracted units.
    pub translation: Vec<String>,
}

impl TranslationUnit {
    /// Creates an empty unit.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a developer comment.
    #[must_use]
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comments.insert(comment.into());
        self
    }

    /// Adds a `file:line` reference.
    #[must_use]
    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.references.insert(reference.into());
        self
    }

    /// Sets the translation.
    #[must_use]
    pub fn with_translation(mut self, translation: Vec<String>) -> Self {
        self.translation = translation;
        self
    }

    /// Returns true if a human translation is present.
    #[must_use]
    pub fn is_translated(&self) -> bool {
        self.translation.iter().any(|s| !s.is_empty())
    }
}

/// Units of one key, by context.
pub type ContextMap = BTreeMap<MessageContext, TranslationUnit>;

/// Extraction result of one file: key -> context -> unit.
pub type ExtractedStrings = BTreeMap<String, ContextMap>;

/// Record shape emitted by external extractors.
///
/// Every field is optional; [`TranslationUnit::from`] normalizes it.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawUnit {
    /// Developer comments; empty strings are dropped.
    pub comments: Vec<String>,
    /// `file:line` references; empty strings are dropped.
    pub references: Vec<String>,
    /// Translation forms.
    #[serde(alias = "translation")]
    pub msgstr: Vec<String>,
}

impl From<RawUnit> for TranslationUnit {
    fn from(raw: RawUnit) -> Self {
        Self {
            comments: raw.comments.into_iter().filter(|c| !c.is_empty()).collect(),
            references: raw.references.into_iter().filter(|r| !r.is_empty()).collect(),
            translation: raw.msgstr,
        }
    }
}

/// Parses raw extractor output (`{key: {context: record}}`) into typed strings.
///
/// # Errors
/// Returns an error if `json` is not shaped like extractor output.
pub fn parse_raw_strings(json: &str) -> Result<ExtractedStrings, serde_json::Error> {
    let raw: BTreeMap<String, BTreeMap<String, RawUnit>> = serde_json::from_str(json)?;

    Ok(raw
        .into_iter()
        .map(|(key, contexts)| {
            let contexts = contexts
                .into_iter()
                .map(|(ctx, unit)| {
                    (MessageContext::from(ctx.as_str()), TranslationUnit::from(unit))
                })
                .collect();
            (key, contexts)
        })
        .collect())
}

/// A (key, context) pair together with its unit, as handed to catalog writers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    /// Message id.
    pub key: String,
    /// Message context.
    pub context: MessageContext,
    /// Unit of the pair.
    pub unit: TranslationUnit,
}
