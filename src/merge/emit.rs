//! Buffer of per-file extraction results collected during one pass.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::types::ExtractedStrings;

/// Strings extracted from one module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileExtraction {
    /// The extracted file.
    pub path: PathBuf,
    /// Its strings.
    pub strings: ExtractedStrings,
}

impl FileExtraction {
    /// Pairs a file with its strings.
    #[must_use]
    pub const fn new(path: PathBuf, strings: ExtractedStrings) -> Self {
        Self { path, strings }
    }
}

/// Cloneable handle module-loaded callbacks use to hand results to the
/// coordinator. Extractions may run concurrently; only the buffer is shared.
#[derive(Debug, Clone, Default)]
pub struct EmitHandle {
    /// Extractions waiting for the merge step.
    buffer: Arc<Mutex<Vec<FileExtraction>>>,
}

impl EmitHandle {
    /// Creates a handle to a new, empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues an extraction for the next merge.
    pub async fn emit(&self, extraction: FileExtraction) {
        self.buffer.lock().await.push(extraction);
    }

    /// Number of buffered results.
    pub async fn pending(&self) -> usize {
        self.buffer.lock().await.len()
    }

    /// Takes every buffered result in emit order, leaving the buffer empty.
    pub(super) async fn drain(&self) -> Vec<FileExtraction> {
        std::mem::take(&mut *self.buffer.lock().await)
    }
}
