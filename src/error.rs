//! Error types for the photo2docx library.
//!
//! One enum covers the whole pipeline. Every variant is fatal for the
//! request that triggered it: the document is either generated in full or
//! not at all, so there is no partial-success type to carry around.
//! Workspace deletion failures never appear here; the workspace swallows
//! them (see [`crate::workspace`]).

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the photo2docx library.
#[derive(Debug, Error)]
pub enum Photo2DocxError {
    // ── Image errors ──────────────────────────────────────────────────────
    /// An uploaded image file could not be read from the workspace.
    #[error("failed to read image file '{path}': {source}")]
    ImageRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file was read but its pixel dimensions could not be decoded.
    #[error("failed to decode image '{path}': {source}")]
    ImageDecode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// The file is neither PNG nor JPEG, the only formats the document
    /// package embeds.
    #[error("unsupported image format for '{path}' (first bytes: {magic:02x?})")]
    UnsupportedImage { path: PathBuf, magic: [u8; 4] },

    // ── Document assembly errors ──────────────────────────────────────────
    /// Emitting one of the XML parts of the package failed.
    #[error("failed to build document part '{part}': {source}")]
    PartBuild {
        part: String,
        #[source]
        source: std::io::Error,
    },

    // ── Workspace errors ──────────────────────────────────────────────────
    /// The scratch directory could not be created or recreated.
    #[error("failed to create workspace directory '{path}': {source}")]
    WorkspaceCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An uploaded file could not be persisted into the workspace.
    #[error("failed to store upload '{name}': {source}")]
    UploadStore {
        name: String,
        #[source]
        source: std::io::Error,
    },

    /// The generated document could not be written to the output path.
    #[error("failed to write output file '{path}': {source}")]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
