//! Host build-system interface.
//!
//! The plugin reacts to [`BuildEvent`]s and talks back to the host through
//! [`BuildHost`]: artifact writes and in-memory replacement of modules the
//! running build has already loaded.

use std::collections::BTreeMap;
use std::fmt::Debug;
use std::io;
use std::path::{
    Path,
    PathBuf,
};
use std::sync::{
    Arc,
    Mutex,
    MutexGuard,
    PoisonError,
};

use futures::future::BoxFuture;

/// Lifecycle events of a build, in the order the host fires them.
///
/// All `ModuleLoaded` events of a pass precede its `CompilationFinished`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildEvent {
    /// A new build pass starts.
    BuildStarted,
    /// The host loaded a module.
    ModuleLoaded {
        /// Absolute path of the module.
        path: PathBuf,
        /// Module source text.
        source: String,
    },
    /// Every module of the pass is loaded.
    CompilationFinished,
}

/// Services the host exposes to the plugin.
pub trait BuildHost: Send + Sync + Debug {
    /// Writes an artifact. Missing parent directories are created.
    fn write_file(&self, path: PathBuf, contents: Vec<u8>) -> BoxFuture<'static, io::Result<()>>;

    /// Replaces the content of `path` if it is a module of the current build.
    ///
    /// Returns true if a loaded module was replaced.
    fn replace_module(&self, path: &Path, contents: &[u8]) -> bool;
}

/// Host backed by the file system, without an in-memory module graph.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsHost;

impl BuildHost for FsHost {
    fn write_file(&self, path: PathBuf, contents: Vec<u8>) -> BoxFuture<'static, io::Result<()>> {
        Box::pin(async move {
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::write(&path, contents).await
        })
    }

    fn replace_module(&self, _path: &Path, _contents: &[u8]) -> bool {
        false
    }
}

/// Shared state of a [`MemoryHost`].
#[derive(Debug, Default)]
struct MemoryState {
    /// Written artifacts.
    files: BTreeMap<PathBuf, Vec<u8>>,
    /// Module graph of the running build.
    modules: BTreeMap<PathBuf, Vec<u8>>,
    /// `write_file` calls.
    writes: usize,
    /// Successful `replace_module` calls.
    replacements: usize,
}

/// In-memory host for embedding and tests.
///
/// Written files are kept in a map; modules registered with
/// [`MemoryHost::load_module`] form the module graph.
#[derive(Debug, Clone, Default)]
pub struct MemoryHost {
    /// Shared with the futures returned by `write_file`.
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryHost {
    /// Creates a host without files or modules.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Locks the state; a poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers a module of the running build.
    pub fn load_module(&self, path: impl Into<PathBuf>, contents: impl Into<Vec<u8>>) {
        self.lock().modules.insert(path.into(), contents.into());
    }

    /// Last content written to `path`.
    #[must_use]
    pub fn file(&self, path: &Path) -> Option<Vec<u8>> {
        self.lock().files.get(path).cloned()
    }

    /// Current content of a loaded module.
    #[must_use]
    pub fn module(&self, path: &Path) -> Option<Vec<u8>> {
        self.lock().modules.get(path).cloned()
    }

    /// Number of `write_file` calls so far.
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.lock().writes
    }

    /// Number of modules replaced so far.
    #[must_use]
    pub fn replacement_count(&self) -> usize {
        self.lock().replacements
    }
}

impl BuildHost for MemoryHost {
    fn write_file(&self, path: PathBuf, contents: Vec<u8>) -> BoxFuture<'static, io::Result<()>> {
        let state = Arc::clone(&self.state);
        Box::pin(async move {
            let mut state = state.lock().unwrap_or_else(PoisonError::into_inner);
            state.writes += 1;
            state.files.insert(path, contents);
            Ok(())
        })
    }

    fn replace_module(&self, path: &Path, contents: &[u8]) -> bool {
        let mut state = self.lock();
        let Some(module) = state.modules.get_mut(path) else {
            return false;
        };
        contents.clone_into(module);
        state.replacements += 1;
        true
    }
}
