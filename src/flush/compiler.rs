//! Compilers turning per-language catalogs into loadable artifacts.

use std::collections::BTreeMap;
use std::fmt::{
    Debug,
    Write,
};
use std::sync::Arc;

use serde_json::{
    Map,
    Value,
};

use super::error::CompileError;
use crate::config::{
    OutputFormat,
    ResultFileConfig,
};
use crate::types::MessageContext;

/// A translated message of one language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledEntry {
    /// Message id.
    pub msgid: String,
    /// Message context.
    pub context: MessageContext,
    /// First translated form.
    pub translation: String,
}

/// Translated messages of one language, as handed to compilers and the save callback.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LocaleStrings {
    /// Language code.
    pub locale: String,
    /// Translated entries only.
    pub entries: Vec<CompiledEntry>,
}

/// Formats the catalogs of one or more languages into an artifact.
pub trait CatalogCompiler: Send + Sync + Debug {
    /// # Errors
    /// Returns `CompileError` if the artifact cannot be produced.
    fn format(&self, locales: &[LocaleStrings]) -> Result<Vec<u8>, CompileError>;
}

/// Builds the compiler for a configured result file.
#[must_use]
pub fn compiler_for(config: &ResultFileConfig) -> Arc<dyn CatalogCompiler> {
    match config.format {
        OutputFormat::Json => Arc::new(JsonCompiler),
        OutputFormat::Javascript => Arc::new(JavascriptCompiler::new(config.module_name.clone())),
    }
}

/// Builds the `{msgid: translation | {context: translation}}` object of one language.
///
/// A message with named contexts becomes an object keyed by context, with
/// [`crate::types::NO_CONTEXT`] standing for the context-free translation.
fn strings_object(locale: &LocaleStrings) -> Value {
    let mut by_msgid: BTreeMap<&str, Vec<&CompiledEntry>> = BTreeMap::new();
    for entry in &locale.entries {
        by_msgid.entry(&entry.msgid).or_default().push(entry);
    }

    let strings: Map<String, Value> = by_msgid
        .into_iter()
        .map(|(msgid, entries)| {
            let value = match entries.as_slice() {
                [only] if only.context.is_none() => Value::String(only.translation.clone()),
                _ => Value::Object(
                    entries
                        .iter()
                        .map(|e| (e.context.to_string(), Value::String(e.translation.clone())))
                        .collect(),
                ),
            };
            (msgid.to_string(), value)
        })
        .collect();

    Value::Object(strings)
}

/// `{"de": {"Hello": "Hallo"}}`
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCompiler;

impl CatalogCompiler for JsonCompiler {
    fn format(&self, locales: &[LocaleStrings]) -> Result<Vec<u8>, CompileError> {
        let catalogs: Map<String, Value> =
            locales.iter().map(|l| (l.locale.clone(), strings_object(l))).collect();

        Ok(serde_json::to_vec(&Value::Object(catalogs))?)
    }
}

/// Angular module registering the strings with `gettextCatalog.setStrings`.
#[derive(Debug, Clone)]
pub struct JavascriptCompiler {
    /// Angular module the strings are registered in.
    module_name: String,
}

impl JavascriptCompiler {
    /// Creates a compiler registering strings in `module_name`.
    #[must_use]
    pub const fn new(module_name: String) -> Self {
        Self { module_name }
    }
}

impl CatalogCompiler for JavascriptCompiler {
    fn format(&self, locales: &[LocaleStrings]) -> Result<Vec<u8>, CompileError> {
        let module_name = serde_json::to_string(&self.module_name)?;
        let mut out = format!(
            "angular.module({module_name}).run(['gettextCatalog', function (gettextCatalog) {{\n"
        );
        out.push_str("/* jshint -W100 */\n");
        for locale in locales {
            let code = serde_json::to_string(&locale.locale)?;
            let strings = serde_json::to_string(&strings_object(locale))?;
            writeln!(out, "    gettextCatalog.setStrings({code}, {strings});")?;
        }
        out.push_str("/* jshint +W100 */\n}]);\n");

        Ok(out.into_bytes())
    }
}
