//! Catalog flush: template dump, per-language PO catalogs and compiled artifacts.

mod compiler;
mod error;
mod po;
mod result_file;

use std::collections::BTreeMap;
use std::fmt;
use std::path::{
    Path,
    PathBuf,
};
use std::sync::Arc;

pub use compiler::{
    CatalogCompiler,
    CompiledEntry,
    JavascriptCompiler,
    JsonCompiler,
    LocaleStrings,
    compiler_for,
};
pub use error::{
    CompileError,
    FlushError,
};
use futures::future::{
    BoxFuture,
    join_all,
};
use polib::catalog::Catalog;
pub use result_file::{
    OutputFileName,
    PostTransform,
    ResultFile,
};

use crate::catalog::KeyTable;
use crate::config::{
    FlushScope,
    LANG_PLACEHOLDER,
    PluginSettings,
    detect_language_from_path,
};
use crate::host::BuildHost;
use crate::types::CatalogEntry;

/// Receives the translated strings of every language after a flush.
pub type SaveCallback =
    Arc<dyn Fn(Vec<LocaleStrings>) -> BoxFuture<'static, Result<(), String>> + Send + Sync>;

/// Outcome of one flush. Errors are collected, never raised.
#[derive(Debug, Default)]
pub struct FlushReport {
    /// Languages the flush ran for.
    pub languages: Vec<String>,
    /// Messages appended to the language catalogs, summed over languages.
    pub appended: usize,
    /// Artifacts whose write completed before the flush returned.
    pub artifacts_written: usize,
    /// Artifacts handed to a background write.
    pub artifacts_scheduled: usize,
    /// Loaded modules replaced in the host.
    pub modules_replaced: usize,
    /// Every error of the flush, in the order they occurred.
    pub errors: Vec<FlushError>,
}

impl FlushReport {
    /// Returns true if the flush had no error.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Result of flushing a single language.
#[derive(Default)]
struct LanguageFlush {
    /// Snapshot to keep for the next pass; `None` if it could not be loaded.
    catalog: Option<Catalog>,
    /// Translated strings of the catalog after the flush.
    strings: LocaleStrings,
    /// Entries appended to the catalog.
    appended: usize,
    /// Artifacts written and awaited.
    written: usize,
    /// Artifacts written in the background.
    scheduled: usize,
    /// Loaded modules replaced.
    replaced: usize,
    /// Errors of this language.
    errors: Vec<FlushError>,
}

/// Writes the key table to the configured catalogs and artifacts.
///
/// Owns the per-language catalog snapshots: a language catalog is read from
/// disk on its first flush (or created empty) and kept in memory afterwards.
pub struct CatalogFlush {
    /// Workspace root; relative paths are resolved against it.
    root: PathBuf,
    /// Template target.
    potfile: Option<PathBuf>,
    /// Obsolete-entry report target.
    obsolete_file: Option<PathBuf>,
    /// `poFiles` template, relative to `root`.
    po_files: Option<String>,
    /// Delta or whole table.
    scope: FlushScope,
    /// Artifacts compiled per language.
    result_files: Vec<ResultFile>,
    /// Called with every language's strings after a flush.
    save_callback: Option<SaveCallback>,
    /// Catalogs by language, as last written.
    snapshots: BTreeMap<String, Catalog>,
}

impl CatalogFlush {
    /// Creates a flush for `settings`; relative paths are resolved against `root`.
    #[must_use]
    pub fn new(root: PathBuf, settings: &PluginSettings) -> Self {
        Self {
            potfile: settings.potfile.as_ref().map(|p| root.join(p)),
            obsolete_file: settings.obsolete_file.as_ref().map(|p| root.join(p)),
            po_files: settings.po_files.clone(),
            scope: settings.flush_scope,
            result_files: settings.result_files.iter().map(ResultFile::from).collect(),
            save_callback: None,
            snapshots: BTreeMap::new(),
            root,
        }
    }

    /// Adds an artifact compiled on every flush.
    pub fn add_result_file(&mut self, file: ResultFile) {
        self.result_files.push(file);
    }

    /// Replaces the save callback.
    pub fn set_save_callback(&mut self, callback: SaveCallback) {
        self.save_callback = Some(callback);
    }

    /// Configured artifacts.
    #[must_use]
    pub fn result_files(&self) -> &[ResultFile] {
        &self.result_files
    }

    /// Translated strings of the cached snapshot of `language`.
    #[must_use]
    pub fn snapshot_strings(&self, language: &str) -> Option<LocaleStrings> {
        self.snapshots.get(language).map(|catalog| po::locale_strings(language, catalog))
    }

    /// Catalog path of `language`, if `poFiles` is set.
    fn po_path(&self, language: &str) -> Option<PathBuf> {
        self.po_files
            .as_ref()
            .map(|template| self.root.join(template.replace(LANG_PLACEHOLDER, language)))
    }

    /// Languages with an existing catalog next to the `poFiles` template.
    #[must_use]
    pub fn detect_languages(&self) -> Vec<String> {
        let Some(template) = &self.po_files else {
            return Vec::new();
        };
        let template_path = self.root.join(template);
        let (Some(dir), Some(file_template)) =
            (template_path.parent(), template_path.file_name().and_then(|n| n.to_str()))
        else {
            return Vec::new();
        };

        let Ok(entries) = std::fs::read_dir(dir) else {
            tracing::debug!(dir = %dir.display(), "No catalog directory to detect languages from");
            return Vec::new();
        };
        let mut languages: Vec<String> = entries
            .filter_map(Result::ok)
            .filter_map(|entry| detect_language_from_path(&entry.path(), file_template))
            .collect();
        languages.sort();
        languages
    }

    /// Flushes `table` for `languages`.
    ///
    /// Language catalogs receive the delta set, or every entry with
    /// [`FlushScope::FullTable`]. Languages are flushed concurrently.
    pub async fn flush(
        &mut self,
        table: &KeyTable,
        languages: &[String],
        host: &Arc<dyn BuildHost>,
    ) -> FlushReport {
        let mut report = FlushReport { languages: languages.to_vec(), ..FlushReport::default() };

        if let Some(potfile) = &self.potfile {
            report.errors.extend(self.write_template(table, potfile).await);
        }

        let refresh = self.scope == FlushScope::FullTable;
        let entries = if refresh { table.entries() } else { table.delta_entries() };

        let mut snapshots = std::mem::take(&mut self.snapshots);
        let jobs: Vec<_> = languages
            .iter()
            .map(|language| {
                let snapshot = snapshots.remove(language);
                self.flush_language(language, snapshot, &entries, refresh, host)
            })
            .collect();
        let results = join_all(jobs).await;

        let mut strings = Vec::with_capacity(results.len());
        for (language, result) in languages.iter().zip(results) {
            if let Some(catalog) = result.catalog {
                snapshots.insert(language.clone(), catalog);
            }
            report.appended += result.appended;
            report.artifacts_written += result.written;
            report.artifacts_scheduled += result.scheduled;
            report.modules_replaced += result.replaced;
            report.errors.extend(result.errors);
            strings.push(result.strings);
        }
        self.snapshots = snapshots;

        if let Some(callback) = &self.save_callback
            && let Err(message) = callback(strings).await
        {
            report.errors.push(FlushError::SaveCallback(message));
        }

        for error in &report.errors {
            tracing::error!("{error}");
        }
        tracing::info!(
            languages = report.languages.len(),
            appended = report.appended,
            artifacts = report.artifacts_written + report.artifacts_scheduled,
            errors = report.errors.len(),
            "Flushed catalogs"
        );
        report
    }

    /// Writes the template and, if configured, the obsolete-entry report.
    async fn write_template(&self, table: &KeyTable, potfile: &Path) -> Vec<FlushError> {
        let mut errors = Vec::new();
        let entries = table.entries();

        if let Some(obsolete_file) = &self.obsolete_file {
            match po::read_catalog(potfile).await {
                Ok(Some(previous)) => {
                    let current = entries
                        .iter()
                        .map(|entry| (entry.context.clone(), entry.key.clone()))
                        .collect();
                    let obsolete = po::obsolete_catalog(&previous, &current);
                    let (_, result) = po::write_catalog(obsolete, obsolete_file.clone()).await;
                    errors.extend(result.err());
                }
                Ok(None) => {}
                Err(e) => errors.push(e),
            }
        }

        let template = po::template_catalog(&entries);
        let (_, result) = po::write_catalog(template, potfile.to_path_buf()).await;
        errors.extend(result.err());
        errors
    }

    /// Appends `entries` to one language and writes its artifacts.
    async fn flush_language(
        &self,
        language: &str,
        snapshot: Option<Catalog>,
        entries: &[CatalogEntry],
        refresh: bool,
        host: &Arc<dyn BuildHost>,
    ) -> LanguageFlush {
        let mut flushed = LanguageFlush::default();
        let po_path = self.po_path(language);

        let mut catalog = match snapshot {
            Some(catalog) => catalog,
            None => match po::load_or_create(po_path.as_deref(), language).await {
                Ok(catalog) => catalog,
                Err(e) => {
                    flushed.errors.push(e);
                    return flushed;
                }
            },
        };

        flushed.appended = po::append_entries(&mut catalog, entries, refresh);
        if let Some(path) = po_path
            && (flushed.appended > 0 || refresh)
        {
            let (written, result) = po::write_catalog(catalog, path).await;
            catalog = written;
            flushed.errors.extend(result.err());
        }

        flushed.strings = po::locale_strings(language, &catalog);
        flushed.catalog = Some(catalog);

        for file in &self.result_files {
            let path = file.path_for(language, &self.root);
            let compiled = match file.compiler.format(std::slice::from_ref(&flushed.strings)) {
                Ok(bytes) => bytes,
                Err(source) => {
                    flushed.errors.push(FlushError::Compile { filename: path, source });
                    continue;
                }
            };
            let compiled = match &file.post_transform {
                Some(transform) => transform(compiled),
                None => compiled,
            };

            if host.replace_module(&path, &compiled) {
                tracing::debug!(path = %path.display(), "Replaced loaded module");
                flushed.replaced += 1;
            }

            let write = host.write_file(path.clone(), compiled);
            if file.save_file {
                match write.await {
                    Ok(()) => flushed.written += 1,
                    Err(e) => flushed.errors.push(FlushError::write(path, e)),
                }
            } else {
                tokio::spawn(async move {
                    if let Err(e) = write.await {
                        tracing::warn!(
                            path = %path.display(),
                            error = %e,
                            "Background write failed"
                        );
                    }
                });
                flushed.scheduled += 1;
            }
        }

        flushed
    }
}

impl fmt::Debug for CatalogFlush {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CatalogFlush")
            .field("root", &self.root)
            .field("potfile", &self.potfile)
            .field("obsolete_file", &self.obsolete_file)
            .field("po_files", &self.po_files)
            .field("scope", &self.scope)
            .field("result_files", &self.result_files)
            .field("save_callback", &self.save_callback.is_some())
            .field("snapshots", &self.snapshots.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use futures::FutureExt;
    use googletest::prelude::*;
    use rstest::rstest;
    use tempfile::TempDir;

    use super::*;
    use crate::config::ResultFileConfig;
    use crate::host::MemoryHost;
    use crate::types::{
        ContextMap,
        MessageContext,
        TranslationUnit,
    };

    fn settings(dir: &Path) -> PluginSettings {
        PluginSettings {
            base_dir: Some(dir.to_path_buf()),
            potfile: Some(PathBuf::from("po/template.pot")),
            po_files: Some("po/{lang}.po".to_string()),
            lang_list: vec!["de".to_string(), "fr".to_string()],
            result_files: vec![ResultFileConfig {
                filename: "dist/{lang}.json".to_string(),
                format: crate::config::OutputFormat::Json,
                module_name: "gettext".to_string(),
                save_file: true,
            }],
            ..PluginSettings::default()
        }
    }

    fn table_with(key: &str) -> KeyTable {
        let mut table = KeyTable::new();
        let contexts: ContextMap =
            [(MessageContext::None, TranslationUnit::new().with_reference("a.js:1"))].into();
        table.ingest(key, contexts);
        table
    }

    fn languages() -> Vec<String> {
        vec!["de".to_string(), "fr".to_string()]
    }

    #[tokio::test]
    async fn flush_writes_template_catalogs_and_artifacts() {
        let dir = TempDir::new().unwrap();
        let memory = MemoryHost::new();
        let host: Arc<dyn BuildHost> = Arc::new(memory.clone());
        let mut flush = CatalogFlush::new(dir.path().to_path_buf(), &settings(dir.path()));

        let report = flush.flush(&table_with("Hello"), &languages(), &host).await;

        assert!(report.is_success(), "{:?}", report.errors);
        assert_that!(report.appended, eq(2));
        assert_that!(report.artifacts_written, eq(2));
        assert!(dir.path().join("po/template.pot").exists());
        assert!(dir.path().join("po/de.po").exists());
        assert!(dir.path().join("po/fr.po").exists());
        assert!(memory.file(&dir.path().join("dist/de.json")).is_some());
        assert_that!(flush.snapshot_strings("de").unwrap().entries, is_empty());
    }

    #[tokio::test]
    async fn background_writes_are_counted_as_scheduled() {
        let dir = TempDir::new().unwrap();
        let host: Arc<dyn BuildHost> = Arc::new(MemoryHost::new());
        let mut settings = settings(dir.path());
        settings.result_files[0].save_file = false;
        let mut flush = CatalogFlush::new(dir.path().to_path_buf(), &settings);

        let report = flush.flush(&table_with("Hello"), &languages(), &host).await;

        assert_that!(report.artifacts_written, eq(0));
        assert_that!(report.artifacts_scheduled, eq(2));
    }

    #[tokio::test]
    async fn loaded_modules_are_replaced_in_memory() {
        let dir = TempDir::new().unwrap();
        let memory = MemoryHost::new();
        let de = dir.path().join("dist/de.json");
        memory.load_module(de.clone(), "{}");
        let host: Arc<dyn BuildHost> = Arc::new(memory.clone());
        let mut flush = CatalogFlush::new(dir.path().to_path_buf(), &settings(dir.path()));

        let report = flush.flush(&table_with("Hello"), &languages(), &host).await;

        assert_that!(report.modules_replaced, eq(1));
        assert_eq!(memory.module(&de), memory.file(&de));
    }

    #[tokio::test]
    async fn save_callback_failure_is_reported() {
        let dir = TempDir::new().unwrap();
        let host: Arc<dyn BuildHost> = Arc::new(MemoryHost::new());
        let mut flush = CatalogFlush::new(dir.path().to_path_buf(), &settings(dir.path()));
        flush.set_save_callback(Arc::new(|strings: Vec<LocaleStrings>| {
            async move { Err::<(), _>(format!("rejected {} languages", strings.len())) }.boxed()
        }));

        let report = flush.flush(&table_with("Hello"), &languages(), &host).await;

        assert_that!(report.errors, len(eq(1)));
        assert!(matches!(
            &report.errors[0],
            FlushError::SaveCallback(m) if m == "rejected 2 languages"
        ));
    }

    #[tokio::test]
    async fn existing_translations_survive_a_flush() {
        let dir = TempDir::new().unwrap();
        let mut existing = po::new_catalog("de");
        let mut hello = polib::message::Message::build_singular();
        hello.with_msgid("Hello".to_string()).with_msgstr("Hallo".to_string());
        existing.append_or_update(hello.done());
        let (_, written) = po::write_catalog(existing, dir.path().join("po/de.po")).await;
        written.unwrap();
        let memory = MemoryHost::new();
        let host: Arc<dyn BuildHost> = Arc::new(memory.clone());
        let mut flush = CatalogFlush::new(dir.path().to_path_buf(), &settings(dir.path()));

        flush.flush(&table_with("Hello"), &languages(), &host).await;

        let json: serde_json::Value =
            serde_json::from_slice(&memory.file(&dir.path().join("dist/de.json")).unwrap())
                .unwrap();
        assert_eq!(json, serde_json::json!({ "de": { "Hello": "Hallo" } }));
    }

    #[rstest]
    fn languages_are_detected_from_catalog_files() {
        let dir = TempDir::new().unwrap();
        let po = dir.path().join("po");
        std::fs::create_dir_all(&po).unwrap();
        for name in ["fr.po", "de.po", "template.pot", "notes.txt"] {
            std::fs::write(po.join(name), "").unwrap();
        }
        let flush = CatalogFlush::new(dir.path().to_path_buf(), &settings(dir.path()));

        assert_that!(flush.detect_languages(), elements_are![eq("de"), eq("fr")]);
    }
}
