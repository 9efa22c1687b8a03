//! # photo2docx
//!
//! Turns a batch of photos into a print-ready word-processing report.
//!
//! Most "images to document" tools shell out to a word processor or lean on
//! a heavyweight authoring library, then fight it over row heights and page
//! breaks. photo2docx goes the other way: **the .docx file is just a zip of
//! XML parts**, so it writes the WordprocessingML markup and the OPC
//! container directly and owns every measurement on the page. Two photos
//! per page in bordered single-column tables, exact row heights, fixed
//! Korean captions, a page break between page groups.
//!
//! The crate is both a library (feed it image paths, get document bytes)
//! and a small local web app (upload photos in the browser, download the
//! generated report).
//!
//! ## Architecture
//!
//! ```text
//! Uploaded files (HTTP) or image paths (API)
//!       ↓
//!   [image_loader] - image bytes, format, pixel dimensions
//!       ↓
//!   [layout]       - page groups, tables, rows, captions
//!       ↓
//!   [model]        - typed document tree in wire units
//!       ↓
//!   [docx]         - WordprocessingML parts in an OPC zip container
//! ```

pub mod docx;
pub mod error;
pub mod image_loader;
pub mod layout;
pub mod model;
pub mod multipart;
pub mod pages;
pub mod server;
pub mod workspace;

use std::path::{Path, PathBuf};

use docx::DocxWriter;
use error::Photo2DocxError;
use image_loader::ImageAsset;
use layout::LayoutEngine;

/// Generate the report from image files on disk, in order.
///
/// This is the primary entry point. Takes the paths of the photos to lay
/// out and returns the bytes of a complete .docx file.
pub fn generate(paths: &[PathBuf]) -> Result<Vec<u8>, Photo2DocxError> {
    let mut assets = Vec::with_capacity(paths.len());
    for path in paths {
        assets.push(ImageAsset::load(path)?);
    }
    let engine = LayoutEngine::new();
    let document = engine.layout(assets);
    let writer = DocxWriter::new();
    writer.write(&document)
}

/// Generate the report and write it to `output`.
pub fn generate_to_file(paths: &[PathBuf], output: &Path) -> Result<(), Photo2DocxError> {
    let bytes = generate(paths)?;
    std::fs::write(output, &bytes).map_err(|source| Photo2DocxError::OutputWrite {
        path: output.to_path_buf(),
        source,
    })?;
    tracing::debug!(path = %output.display(), bytes = bytes.len(), "wrote document");
    Ok(())
}
