//! Error types for the sticker-grid crate.

/// Errors that can occur while compositing, cleaning or splitting sticker grids.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An input buffer could not be decoded as an image.
    #[error("failed to decode image: {0}")]
    Decode(image::ImageError),

    /// The compositor was called without any source images.
    #[error("no source images supplied to the grid compositor")]
    EmptyInput,

    /// A retouch mask does not cover the bitmap it is applied to.
    #[error("mask is {mask_width}x{mask_height} but image is {width}x{height}")]
    MaskSize {
        /// Mask width in pixels.
        mask_width: u32,
        /// Mask height in pixels.
        mask_height: u32,
        /// Image width in pixels.
        width: u32,
        /// Image height in pixels.
        height: u32,
    },

    /// The requested sticker count is not one of the supported set sizes.
    #[error("unsupported sticker count {0} (expected 8, 16, 24, 32 or 40)")]
    InvalidStickerCount(u32),

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The image format is not supported.
    #[error("unsupported image format: {0}")]
    UnsupportedFormat(String),

    /// An error occurred while encoding or saving an image.
    #[error("image processing error: {0}")]
    Image(#[from] image::ImageError),
}

/// A specialized `Result` type for this crate.
pub type Result<T> = std::result::Result<T, Error>;
