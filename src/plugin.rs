//! The plugin context object driven by host build events.

use std::path::{
    Path,
    PathBuf,
};
use std::sync::Arc;

use thiserror::Error;

use crate::catalog::KeyTable;
use crate::config::{
    ConfigError,
    ConfigManager,
    FileMatcher,
    MatcherError,
};
use crate::extract::{
    ExtractionAdapter,
    ExtractionError,
    Extractor,
    GettextExtractor,
};
use crate::flush::{
    CatalogFlush,
    FlushReport,
    ResultFile,
    SaveCallback,
};
use crate::host::{
    BuildEvent,
    BuildHost,
};
use crate::merge::{
    CoordinatorState,
    EmitHandle,
    FileExtraction,
    MergeCoordinator,
    MergeOutcome,
};
use crate::types::parse_raw_strings;

/// Errors raised while constructing the plugin.
#[derive(Error, Debug)]
pub enum PluginError {
    /// Invalid settings.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Invalid exclude patterns.
    #[error(transparent)]
    Matcher(#[from] MatcherError),
}

/// Outcome of one compilation pass.
#[derive(Debug)]
pub struct PassReport {
    /// What the merge step did.
    pub merge: MergeOutcome,
    /// `None` when the pass needed no flush.
    pub flush: Option<FlushReport>,
}

/// Extracts loaded modules and hands the results to the merge buffer.
///
/// Cheap to clone; module-loaded callbacks may run on many tasks at once.
#[derive(Debug, Clone)]
pub struct ModuleLoader {
    /// Filters and extracts modules.
    adapter: ExtractionAdapter,
    /// Pending buffer of the coordinator.
    emitter: EmitHandle,
}

impl ModuleLoader {
    /// Extracts `source` without emitting it. `Ok(None)` means the file is filtered out.
    ///
    /// # Errors
    /// Returns `ExtractionError` if the source cannot be parsed.
    pub fn extract(
        &self,
        path: &Path,
        source: &str,
    ) -> Result<Option<FileExtraction>, ExtractionError> {
        Ok(self
            .adapter
            .extract(path, source)?
            .map(|strings| FileExtraction::new(path.to_path_buf(), strings)))
    }

    /// Queues an extraction for the next merge.
    pub async fn emit(&self, extraction: FileExtraction) {
        self.emitter.emit(extraction).await;
    }

    /// Extracts and emits one module. Returns true if the module was extracted.
    ///
    /// # Errors
    /// Returns `ExtractionError` if the source cannot be parsed; nothing is
    /// emitted for the file in that case.
    pub async fn load(&self, path: &Path, source: &str) -> Result<bool, ExtractionError> {
        match self.extract(path, source)? {
            Some(extraction) => {
                self.emit(extraction).await;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Emits raw output of an external extractor (`{key: {context: record}}`).
    ///
    /// # Errors
    /// Returns an error if `json` is not shaped like extractor output.
    pub async fn emit_raw(&self, path: &Path, json: &str) -> Result<(), serde_json::Error> {
        let strings = parse_raw_strings(json)?;
        self.emit(FileExtraction::new(path.to_path_buf(), strings)).await;
        Ok(())
    }
}

/// Owns everything one build process accumulates: the key table, the merge
/// coordinator and the catalog snapshots.
#[derive(Debug)]
pub struct GettextPlugin {
    /// Extraction front end shared with module callbacks.
    loader: ModuleLoader,
    /// Every key seen during this build.
    table: KeyTable,
    /// Pass state machine.
    coordinator: MergeCoordinator,
    /// Catalog writer and snapshots.
    flush: CatalogFlush,
    /// Target languages.
    languages: Vec<String>,
    /// Build system the plugin runs in.
    host: Arc<dyn BuildHost>,
}

impl GettextPlugin {
    /// Creates the plugin from loaded settings.
    ///
    /// When `langList` is empty, languages are detected from existing PO files.
    ///
    /// # Errors
    /// Returns `PluginError` if the settings are invalid.
    pub fn new(config: &ConfigManager, host: Arc<dyn BuildHost>) -> Result<Self, PluginError> {
        let settings = config.get_settings();
        settings.validate().map_err(ConfigError::ValidationErrors)?;

        let root = config.workspace_root().cloned().unwrap_or_else(|| PathBuf::from("."));
        let matcher = FileMatcher::new(config.base_dir(), settings)?;
        let extractor = Arc::new(GettextExtractor::new(settings.markers.clone()));
        let coordinator = MergeCoordinator::new(settings.flush_policy);
        let loader = ModuleLoader {
            adapter: ExtractionAdapter::new(matcher, extractor),
            emitter: coordinator.emitter(),
        };
        let flush = CatalogFlush::new(root, settings);

        let languages = if settings.lang_list.is_empty() {
            let detected = flush.detect_languages();
            tracing::info!(languages = ?detected, "Detected languages from catalogs");
            detected
        } else {
            settings.lang_list.clone()
        };

        Ok(Self { loader, table: KeyTable::new(), coordinator, flush, languages, host })
    }

    /// Replaces the built-in extractor.
    #[must_use]
    pub fn with_extractor(mut self, extractor: Arc<dyn Extractor>) -> Self {
        let matcher = self.loader.adapter.matcher().clone();
        self.loader.adapter = ExtractionAdapter::new(matcher, extractor);
        self
    }

    /// Adds an artifact compiled on every flush.
    #[must_use]
    pub fn with_result_file(mut self, file: ResultFile) -> Self {
        self.flush.add_result_file(file);
        self
    }

    /// Sets a callback receiving every language's strings after a flush.
    #[must_use]
    pub fn with_save_callback(mut self, callback: SaveCallback) -> Self {
        self.flush.set_save_callback(callback);
        self
    }

    /// Handle for module-loaded callbacks running outside the plugin.
    #[must_use]
    pub fn module_loader(&self) -> ModuleLoader {
        self.loader.clone()
    }

    /// Target languages.
    #[must_use]
    pub fn languages(&self) -> &[String] {
        &self.languages
    }

    /// Keys merged so far.
    #[must_use]
    pub const fn key_table(&self) -> &KeyTable {
        &self.table
    }

    /// Catalog flush state, including snapshots.
    #[must_use]
    pub const fn catalog_flush(&self) -> &CatalogFlush {
        &self.flush
    }

    /// Coordinator state.
    #[must_use]
    pub const fn state(&self) -> CoordinatorState {
        self.coordinator.state()
    }

    /// Starts collecting a new pass.
    pub fn on_build_start(&mut self) {
        self.coordinator.begin_pass();
    }

    /// Extracts a loaded module into the current pass.
    ///
    /// Parse errors are logged and returned; the file contributes nothing.
    ///
    /// # Errors
    /// Returns `ExtractionError` if the module cannot be parsed.
    pub async fn on_module_loaded(
        &self,
        path: &Path,
        source: &str,
    ) -> Result<bool, ExtractionError> {
        self.loader.load(path, source).await.inspect_err(|e| {
            tracing::warn!(path = %path.display(), error = %e, "Skipping file");
        })
    }

    /// Merges the pass and flushes the catalogs if the policy asks for it.
    pub async fn on_compilation_finished(&mut self) -> PassReport {
        let merge = self.coordinator.merge(&mut self.table).await;

        let flush = if merge.decision.is_flush() {
            Some(self.flush.flush(&self.table, &self.languages, &self.host).await)
        } else {
            tracing::debug!("No new translation keys, skipping flush");
            None
        };

        self.coordinator.finish_pass(&mut self.table);
        PassReport { merge, flush }
    }

    /// Dispatches a host event. Returns a report for `CompilationFinished`.
    pub async fn handle_event(&mut self, event: BuildEvent) -> Option<PassReport> {
        match event {
            BuildEvent::BuildStarted => {
                self.on_build_start();
                None
            }
            BuildEvent::ModuleLoaded { path, source } => {
                // already logged
                let _ = self.on_module_loaded(&path, &source).await;
                None
            }
            BuildEvent::CompilationFinished => Some(self.on_compilation_finished().await),
        }
    }
}
