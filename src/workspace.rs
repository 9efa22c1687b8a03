//! # Upload Workspace
//!
//! Owns the one scratch directory the server works in. Lifecycle: created
//! under the OS temp area at process start, wiped and recreated at the start
//! of every upload, deleted at most once when the process ends. Deletion is
//! best-effort at every stage since the directory may already be gone;
//! recreation failures propagate because nothing can be stored without the
//! directory.
//!
//! The workspace is an explicit handle passed into the serving layer
//! (`Arc<Workspace>`), never ambient state. `teardown` is safe to call from
//! any thread any number of times; the first caller wins, which is what
//! makes the signal path and the `Drop` path compose.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use crate::error::Photo2DocxError;

/// Fixed name of the generated document inside the workspace.
pub const OUTPUT_FILE_NAME: &str = "output.docx";

/// The per-process scratch directory.
#[derive(Debug)]
pub struct Workspace {
    root: PathBuf,
    destroyed: AtomicBool,
    /// Serializes one whole upload (reset, save, generate, write) so a
    /// concurrent request cannot delete files out from under another.
    upload_lock: Mutex<()>,
}

impl Workspace {
    /// Create a fresh scratch directory under the OS temp area.
    pub fn create() -> Result<Self, Photo2DocxError> {
        let dir = tempfile::Builder::new()
            .prefix("photo2docx-")
            .tempdir()
            .map_err(|source| Photo2DocxError::WorkspaceCreate {
                path: std::env::temp_dir(),
                source,
            })?;
        let root = dir.keep();
        tracing::debug!(path = %root.display(), "workspace created");
        Ok(Self {
            root,
            destroyed: AtomicBool::new(false),
            upload_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Path of the generated document, present or not.
    pub fn output_path(&self) -> PathBuf {
        self.root.join(OUTPUT_FILE_NAME)
    }

    pub fn output_exists(&self) -> bool {
        self.output_path().is_file()
    }

    /// Hold this for the duration of one upload.
    pub fn lock_upload(&self) -> MutexGuard<'_, ()> {
        self.upload_lock.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Wipe and recreate the directory, destroying the previous batch and
    /// output unconditionally. Deletion errors are ignored.
    pub fn reset(&self) -> Result<(), Photo2DocxError> {
        let _ = std::fs::remove_dir_all(&self.root);
        std::fs::create_dir_all(&self.root).map_err(|source| Photo2DocxError::WorkspaceCreate {
            path: self.root.clone(),
            source,
        })
    }

    /// Persist one uploaded file under its client-supplied name with any
    /// directory components stripped. Last write wins on collisions.
    pub fn save_upload(&self, file_name: &str, data: &[u8]) -> Result<PathBuf, Photo2DocxError> {
        let name = bare_file_name(file_name);
        if name.is_empty() {
            return Err(Photo2DocxError::UploadStore {
                name: file_name.to_string(),
                source: io::Error::new(io::ErrorKind::InvalidInput, "empty filename"),
            });
        }
        let path = self.root.join(name);
        std::fs::write(&path, data).map_err(|source| Photo2DocxError::UploadStore {
            name: file_name.to_string(),
            source,
        })?;
        Ok(path)
    }

    /// Delete the directory. The first call wins; every later call is a
    /// no-op, and failures are swallowed.
    pub fn teardown(&self) {
        if self.destroyed.swap(true, Ordering::SeqCst) {
            return;
        }
        let _ = std::fs::remove_dir_all(&self.root);
        tracing::debug!(path = %self.root.display(), "workspace removed");
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// The final path component of a client-supplied filename, split on both
/// separator styles browsers have been known to send.
fn bare_file_name(name: &str) -> &str {
    name.rsplit(['/', '\\']).next().unwrap_or(name)
}
