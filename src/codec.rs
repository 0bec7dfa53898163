//! Decoding and encoding of bitmaps at the edges of the pipeline.
//!
//! Pipeline stages only ever see decoded [`RgbaImage`] buffers. The
//! functions here turn upstream byte buffers and files into those bitmaps,
//! and turn finished stickers back into lossless, alpha-capable PNG data.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::{ImageFormat, RgbaImage};

use crate::error::{Error, Result};

/// Decode an in-memory image buffer (any format `image` recognises) to RGBA.
///
/// # Errors
///
/// Returns [`Error::Decode`] if the buffer is not a valid image.
pub fn decode(bytes: &[u8]) -> Result<RgbaImage> {
    let img = image::load_from_memory(bytes).map_err(Error::Decode)?;
    Ok(img.to_rgba8())
}

/// Encode a bitmap as PNG bytes for a downstream packager.
///
/// # Errors
///
/// Returns [`Error::Image`] if encoding fails.
pub fn encode_png(img: &RgbaImage) -> Result<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::new());
    img.write_to(&mut buffer, ImageFormat::Png)?;
    Ok(buffer.into_inner())
}

/// Load an image file from disk as RGBA.
///
/// # Errors
///
/// Returns [`Error::Io`] if the file cannot be read and [`Error::Decode`] if
/// its contents are not an image.
pub fn load(path: &Path) -> Result<RgbaImage> {
    let bytes = std::fs::read(path)?;
    decode(&bytes)
}

/// Save a bitmap as PNG, creating the parent directory if needed.
///
/// # Errors
///
/// Returns [`Error::UnsupportedFormat`] if `path` does not end in `.png`, or
/// an I/O / encoding error if writing fails.
pub fn save_png(img: &RgbaImage, path: &Path) -> Result<()> {
    let format =
        ImageFormat::from_path(path).map_err(|e| Error::UnsupportedFormat(e.to_string()))?;
    if format != ImageFormat::Png {
        // Stickers need an alpha channel; anything lossy or opaque is refused.
        return Err(Error::UnsupportedFormat(format!("{format:?}")));
    }

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }

    img.save_with_format(path, ImageFormat::Png)?;
    Ok(())
}

/// Check if a file has a supported image extension.
#[must_use]
pub fn is_supported_image(path: &Path) -> bool {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => matches!(
            ext.to_lowercase().as_str(),
            "jpg" | "jpeg" | "png" | "webp" | "bmp"
        ),
        None => false,
    }
}

/// List the supported images directly inside `dir`, sorted by file name.
///
/// Sorting fixes the order stickers are placed into grids.
///
/// # Errors
///
/// Returns [`Error::Io`] if the directory cannot be read.
pub fn collect_sources(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(std::result::Result::ok)
        .filter(|e| e.file_type().map(|ft| ft.is_file()).unwrap_or(false))
        .map(|e| e.path())
        .filter(|p| is_supported_image(p))
        .collect();
    paths.sort();
    Ok(paths)
}
