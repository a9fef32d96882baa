//! Error types for the sigstamp crate.

/// Errors that can occur while removing backgrounds, composing stamps, or exporting.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An operation needs a source image but none has been loaded.
    #[error("no source image loaded")]
    NoImageLoaded,

    /// A stamp or signature was requested before any stroke was drawn.
    #[error("nothing to compose: no strokes have been drawn")]
    NothingToCompose,

    /// A save was requested before a result image was produced.
    #[error("nothing to save: produce a result image first")]
    NothingToSave,

    /// A colour string could not be parsed.
    #[error("invalid colour: {0}")]
    InvalidColor(String),

    /// A grid guide description could not be parsed.
    #[error("invalid grid guide: {0}")]
    InvalidGrid(String),

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The image format is not supported.
    #[error("unsupported image format: {0}")]
    UnsupportedFormat(String),

    /// An error occurred during image decoding or encoding.
    #[error("image processing error: {0}")]
    Image(#[from] image::ImageError),
}

/// A specialized `Result` type for this crate.
pub type Result<T> = std::result::Result<T, Error>;
