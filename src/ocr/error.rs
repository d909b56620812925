//! Error types for OCR.

use thiserror::Error;

/// OCR failure. The display text always starts with `ERROR` and is shown
/// to the user verbatim.
#[derive(Debug, Error)]
pub enum OcrError {
    /// The OCR binary could not be found.
    #[error("ERROR: Tesseract is not installed or not on PATH ({binary})")]
    NotInstalled {
        /// Binary that was looked up.
        binary: String,
    },
    /// The bytes are not an image format the engine reads.
    #[error("ERROR: Unsupported image format; upload PNG, JPEG, BMP, TIFF, GIF or WebP")]
    UnsupportedFormat,
    /// The engine ran and reported a failure.
    #[error("ERROR: Text extraction failed: {0}")]
    Failed(String),
    /// The engine succeeded but recognized nothing.
    #[error("ERROR: No text found in image")]
    NoText,
    /// Talking to the engine process failed.
    #[error("ERROR: Could not run OCR: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result alias for OCR calls.
pub type OcrResult<T> = Result<T, OcrError>;
