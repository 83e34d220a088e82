//! Local preview manager
//!
//! A preview is a temporary file holding a pending recording so it can be
//! played back before upload. Each handle owns its file: releasing or
//! dropping the handle deletes the file and makes its id unresolvable.

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use tempfile::TempPath;
use thiserror::Error;
use tracing::{debug, warn};

use crate::domain::recording::PendingAudioBuffer;

/// Errors from the preview manager
#[derive(Debug, Error)]
pub enum PreviewError {
    #[error("Failed to create preview file: {0}")]
    Create(#[from] std::io::Error),
}

/// Identifier of a live preview
pub type PreviewId = u64;

#[derive(Default)]
struct Registry {
    next_id: PreviewId,
    live: HashMap<PreviewId, TempPath>,
}

impl Registry {
    fn remove(&mut self, id: PreviewId) -> Option<TempPath> {
        self.live.remove(&id)
    }
}

/// Revocable reference to a locally playable copy of a buffer
pub struct PreviewHandle {
    id: PreviewId,
    path: PathBuf,
    registry: Arc<Mutex<Registry>>,
}

impl PreviewHandle {
    pub fn id(&self) -> PreviewId {
        self.id
    }

    /// Path of the playable file, valid for the lifetime of the handle
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl std::fmt::Debug for PreviewHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreviewHandle")
            .field("id", &self.id)
            .field("path", &self.path)
            .finish()
    }
}

impl Drop for PreviewHandle {
    fn drop(&mut self) {
        let path = self.registry.lock().remove(self.id);
        if let Some(path) = path {
            debug!(id = self.id, "preview dropped without explicit release");
            if let Err(err) = path.close() {
                warn!(error = %err, "failed to delete preview file");
            }
        }
    }
}

/// Creates and revokes preview handles
pub struct PreviewManager {
    dir: PathBuf,
    registry: Arc<Mutex<Registry>>,
}

impl PreviewManager {
    /// Manager writing previews to the system temp directory
    pub fn new() -> Self {
        Self::in_dir(std::env::temp_dir())
    }

    /// Manager writing previews to `dir`
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            registry: Arc::new(Mutex::new(Registry::default())),
        }
    }

    /// Write `buffer` to a temporary file and register a handle for it
    pub fn create_handle(&self, buffer: &PendingAudioBuffer) -> Result<PreviewHandle, PreviewError> {
        let extension = format!(".{}", buffer.encoding().extension());
        let mut file = tempfile::Builder::new()
            .prefix("nivelver-preview-")
            .suffix(&extension)
            .tempfile_in(&self.dir)?;
        file.write_all(buffer.data())?;
        file.flush()?;

        let temp_path = file.into_temp_path();
        let path = temp_path.to_path_buf();

        let mut registry = self.registry.lock();
        let id = registry.next_id;
        registry.next_id += 1;
        registry.live.insert(id, temp_path);
        debug!(id, path = %path.display(), "preview created");

        Ok(PreviewHandle {
            id,
            path,
            registry: Arc::clone(&self.registry),
        })
    }

    /// Revoke a handle and delete its file
    pub fn release(&self, handle: PreviewHandle) {
        let path = self.registry.lock().remove(handle.id);
        if let Some(path) = path {
            if let Err(err) = path.close() {
                warn!(error = %err, "failed to delete preview file");
            }
            debug!(id = handle.id, "preview released");
        }
    }

    /// Release `previous` (if any) before creating a handle for `buffer`
    pub fn replace(
        &self,
        previous: Option<PreviewHandle>,
        buffer: &PendingAudioBuffer,
    ) -> Result<PreviewHandle, PreviewError> {
        if let Some(previous) = previous {
            self.release(previous);
        }
        self.create_handle(buffer)
    }

    /// Path of a live preview, `None` once released
    pub fn resolve(&self, id: PreviewId) -> Option<PathBuf> {
        self.registry
            .lock()
            .live
            .get(&id)
            .map(|path| path.to_path_buf())
    }

    /// Number of handles not yet released
    pub fn live_count(&self) -> usize {
        self.registry.lock().live.len()
    }
}

impl Default for PreviewManager {
    fn default() -> Self {
        Self::new()
    }
}
