//! Glue between the key table and PO catalogs.

use std::collections::BTreeSet;
use std::path::{
    Path,
    PathBuf,
};

use polib::catalog::Catalog;
use polib::message::{
    Message,
    MessageMutView,
};
use polib::metadata::CatalogMetadata;
use polib::po_file;

use super::compiler::{
    CompiledEntry,
    LocaleStrings,
};
use super::error::FlushError;
use crate::types::{
    CatalogEntry,
    MessageContext,
};

/// Builds an untranslated PO message carrying the unit's comments and references.
fn template_message(entry: &CatalogEntry) -> Message {
    let mut builder = Message::build_singular();
    builder
        .with_msgid(entry.key.clone())
        .with_msgstr(String::new())
        .with_source(join_lines(&entry.unit.references))
        .with_comments(join_lines(&entry.unit.comments));
    if let Some(msgctxt) = entry.context.as_msgctxt() {
        builder.with_msgctxt(msgctxt.to_string());
    }
    builder.done()
}

/// Joins a set into the newline-separated form polib stores.
fn join_lines(items: &BTreeSet<String>) -> String {
    items.iter().map(String::as_str).collect::<Vec<_>>().join("\n")
}

/// Empty catalog with the metadata of `language`.
pub(super) fn new_catalog(language: &str) -> Catalog {
    let mut metadata = CatalogMetadata::new();
    metadata.language = language.to_string();
    metadata.content_type = "text/plain; charset=UTF-8".to_string();
    Catalog::new(metadata)
}

/// The template catalog: every entry, no translations.
pub(super) fn template_catalog(entries: &[CatalogEntry]) -> Catalog {
    let mut catalog = new_catalog("");
    for entry in entries {
        catalog.append_or_update(template_message(entry));
    }
    catalog
}

/// Appends the entries `catalog` does not know yet as untranslated messages.
///
/// With `refresh`, comments and references of known messages are replaced by
/// the current ones; their translations are left alone. Returns the number of
/// appended messages.
pub(super) fn append_entries(
    catalog: &mut Catalog,
    entries: &[CatalogEntry],
    refresh: bool,
) -> usize {
    let mut appended = 0;

    for entry in entries {
        let msgctxt = entry.context.as_msgctxt();
        if let Some(mut known) = catalog.find_message_mut(msgctxt, &entry.key, None) {
            if refresh {
                *known.source_mut() = join_lines(&entry.unit.references);
                *known.comments_mut() = join_lines(&entry.unit.comments);
            }
            continue;
        }

        catalog.append_or_update(template_message(entry));
        appended += 1;
    }

    appended
}

/// Translated messages of `catalog`. Untranslated messages are skipped.
pub(super) fn locale_strings(locale: &str, catalog: &Catalog) -> LocaleStrings {
    let entries = catalog
        .messages()
        .filter_map(|message| {
            let translation = message.msgstr().ok().filter(|s| !s.is_empty())?;
            let context = message.msgctxt();
            Some(CompiledEntry {
                msgid: message.msgid().to_string(),
                context: MessageContext::from_msgctxt(Some(context)),
                translation: translation.to_string(),
            })
        })
        .collect();

    LocaleStrings { locale: locale.to_string(), entries }
}

/// Messages of the previous template that are no longer in `current`.
pub(super) fn obsolete_catalog(
    previous: &Catalog,
    current: &BTreeSet<(MessageContext, String)>,
) -> Catalog {
    let mut obsolete = new_catalog("");
    for message in previous.messages() {
        let context = MessageContext::from_msgctxt(Some(message.msgctxt()));
        if current.contains(&(context, message.msgid().to_string())) {
            continue;
        }

        let mut builder = Message::build_singular();
        builder
            .with_msgid(message.msgid().to_string())
            .with_msgstr(String::new())
            .with_source(message.source().to_string())
            .with_comments(message.comments().to_string());
        if !message.msgctxt().is_empty() {
            builder.with_msgctxt(message.msgctxt().to_string());
        }
        obsolete.append_or_update(builder.done());
    }
    obsolete
}

/// Loads the catalog at `path`. A missing file yields `None`.
pub(super) async fn read_catalog(path: &Path) -> Result<Option<Catalog>, FlushError> {
    if !tokio::fs::try_exists(path).await.map_err(|e| FlushError::write(path, e))? {
        return Ok(None);
    }

    let owned = path.to_path_buf();
    let parsed = tokio::task::spawn_blocking(move || po_file::parse(&owned))
        .await
        .map_err(|e| FlushError::write(path, std::io::Error::other(e)))?;

    parsed
        .map(Some)
        .map_err(|e| FlushError::CatalogParse { path: path.to_path_buf(), message: e.to_string() })
}

/// Loads the catalog of `language`, creating an empty one if the file is missing.
pub(super) async fn load_or_create(
    path: Option<&Path>,
    language: &str,
) -> Result<Catalog, FlushError> {
    match path {
        Some(path) => Ok(read_catalog(path).await?.unwrap_or_else(|| {
            tracing::debug!(language, path = %path.display(), "Creating new catalog");
            new_catalog(language)
        })),
        None => Ok(new_catalog(language)),
    }
}

/// Writes `catalog` to `path`, creating missing parent directories.
///
/// The catalog is handed back so it can stay cached as the language snapshot.
pub(super) async fn write_catalog(
    catalog: Catalog,
    path: PathBuf,
) -> (Catalog, Result<(), FlushError>) {
    if let Some(parent) = path.parent()
        && let Err(e) = tokio::fs::create_dir_all(parent).await
    {
        return (catalog, Err(FlushError::write(parent, e)));
    }

    let target = path.clone();
    match tokio::task::spawn_blocking(move || {
        let result = po_file::write(&catalog, &target);
        (catalog, result)
    })
    .await
    {
        Ok((catalog, result)) => (catalog, result.map_err(|e| FlushError::write(path, e))),
        Err(e) => (new_catalog(""), Err(FlushError::write(path, std::io::Error::other(e)))),
    }
}
