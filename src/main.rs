//! One-shot driver: extracts a whole workspace and runs a single merge and flush pass.

use std::path::{
    Path,
    PathBuf,
};
use std::sync::Arc;

use futures::{
    StreamExt,
    stream,
};
use gettext_extract_plugin::config::ConfigManager;
use gettext_extract_plugin::host::FsHost;
use gettext_extract_plugin::{
    GettextPlugin,
    ModuleLoader,
};
use ignore::WalkBuilder;
use tracing_subscriber::EnvFilter;

/// Runs the driver and maps its result to an exit code.
#[tokio::main]
async fn main() -> std::process::ExitCode {
    let (writer, _guard) = tracing_appender::non_blocking(std::io::stderr());
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(writer)
        .init();

    let workspace = std::env::args_os().nth(1).map_or_else(|| PathBuf::from("."), PathBuf::from);

    match run(workspace).await {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            std::process::ExitCode::FAILURE
        }
    }
}

/// Extracts `workspace` and runs one merge and flush pass.
async fn run(workspace: PathBuf) -> Result<(), gettext_extract_plugin::PluginError> {
    let mut config = ConfigManager::new();
    config.load_settings(Some(workspace.clone()))?;

    let mut plugin = GettextPlugin::new(&config, Arc::new(FsHost))?;
    plugin.on_build_start();

    let files = find_source_files(&workspace);
    tracing::info!(files = files.len(), workspace = %workspace.display(), "Extracting workspace");

    let loader = plugin.module_loader();
    let skipped = stream::iter(files)
        .map(|path| load_file(loader.clone(), path))
        .buffer_unordered(num_cpus::get())
        .filter(|loaded| std::future::ready(!loaded))
        .count()
        .await;
    if skipped > 0 {
        tracing::warn!(skipped, "Some files could not be extracted");
    }

    let report = plugin.on_compilation_finished().await;
    tracing::info!(
        keys = plugin.key_table().len(),
        new_pairs = report.merge.new_pairs,
        flushed = report.flush.is_some(),
        "Done"
    );

    Ok(())
}

/// Reads and extracts one file. Returns false if the file was skipped because of an error.
async fn load_file(loader: ModuleLoader, path: PathBuf) -> bool {
    let source = match tokio::fs::read_to_string(&path).await {
        Ok(source) => source,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Failed to read file");
            return false;
        }
    };

    let extractor = loader.clone();
    let extracted = tokio::task::spawn_blocking(move || {
        extractor.extract(&path, &source).map_err(|e| (path, e))
    })
    .await;

    match extracted {
        Ok(Ok(Some(extraction))) => {
            loader.emit(extraction).await;
            true
        }
        Ok(Ok(None)) => true,
        Ok(Err((path, e))) => {
            tracing::warn!(path = %path.display(), error = %e, "Skipping file");
            false
        }
        Err(e) => {
            tracing::warn!(error = %e, "Extraction task failed");
            false
        }
    }
}

/// Files of the workspace, honouring `.gitignore`.
fn find_source_files(workspace: &Path) -> Vec<PathBuf> {
    WalkBuilder::new(workspace)
        .hidden(false)
        .git_ignore(true)
        .git_global(true)
        .git_exclude(true)
        .follow_links(false)
        .build()
        .filter_map(|result| match result {
            Ok(entry) => Some(entry),
            Err(err) => {
                tracing::debug!(?err, "Failed to read directory entry");
                None
            }
        })
        .filter(|entry| entry.file_type().is_some_and(|ft| ft.is_file()))
        .map(ignore::DirEntry::into_path)
        .collect()
}
