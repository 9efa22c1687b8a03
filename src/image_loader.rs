//! # Image Loading
//!
//! Loads uploaded images from the workspace and prepares them for document
//! embedding. The document package carries the original encoded bytes
//! untouched (the word processor decodes them itself), so loading is a
//! format check plus a pixel-dimension probe. Dimensions feed the layout
//! engine's aspect-ratio scaling; the format picks the media part extension
//! and content type.

use std::io::Cursor;
use std::path::Path;

use crate::error::Photo2DocxError;

/// Image formats the document package can embed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
}

impl ImageFormat {
    /// Extension used for the media part name (`imageN.<ext>`).
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpeg",
        }
    }

    /// MIME type registered for the extension in the package content types.
    pub fn content_type(&self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
        }
    }
}

/// A loaded image ready for embedding: original bytes, detected format,
/// probed pixel dimensions, and the source filename for labeling.
#[derive(Debug, Clone)]
pub struct ImageAsset {
    pub bytes: Vec<u8>,
    pub format: ImageFormat,
    pub width_px: u32,
    pub height_px: u32,
    /// The filename the image was saved under, without directories.
    pub file_name: String,
}

impl ImageAsset {
    /// Read an image file, classify it from magic bytes, and probe its
    /// pixel dimensions. Fails on unreadable files and on anything that is
    /// not a decodable PNG or JPEG.
    pub fn load(path: &Path) -> Result<ImageAsset, Photo2DocxError> {
        let bytes = std::fs::read(path).map_err(|source| Photo2DocxError::ImageRead {
            path: path.to_path_buf(),
            source,
        })?;

        let format = if is_jpeg(&bytes) {
            ImageFormat::Jpeg
        } else if is_png(&bytes) {
            ImageFormat::Png
        } else {
            let mut magic = [0u8; 4];
            for (slot, byte) in magic.iter_mut().zip(bytes.iter()) {
                *slot = *byte;
            }
            return Err(Photo2DocxError::UnsupportedImage {
                path: path.to_path_buf(),
                magic,
            });
        };

        let (width_px, height_px) = probe_dimensions(&bytes, path)?;

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(ImageAsset {
            bytes,
            format,
            width_px,
            height_px,
            file_name,
        })
    }
}

fn is_jpeg(data: &[u8]) -> bool {
    data.len() >= 2 && data[0] == 0xFF && data[1] == 0xD8
}

fn is_png(data: &[u8]) -> bool {
    data.len() >= 4 && data[0] == 0x89 && data[1] == 0x50 && data[2] == 0x4E && data[3] == 0x47
}

/// Read dimensions without decoding pixels.
fn probe_dimensions(data: &[u8], path: &Path) -> Result<(u32, u32), Photo2DocxError> {
    let reader = image::io::Reader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| Photo2DocxError::ImageDecode {
            path: path.to_path_buf(),
            source: image::ImageError::IoError(e),
        })?;

    reader
        .into_dimensions()
        .map_err(|source| Photo2DocxError::ImageDecode {
            path: path.to_path_buf(),
            source,
        })
}
