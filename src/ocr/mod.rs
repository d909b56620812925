//! OCR collaborator: image bytes in, trimmed text out.

pub mod error;
pub mod tesseract;

pub use error::{OcrError, OcrResult};
pub use tesseract::TesseractCli;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// OCR language codes offered in the settings panel; the first is the default.
pub const OCR_LANGUAGES: &[&str] = &["eng", "spa", "fra", "deu", "chi_sim", "jpn", "hin"];

/// Extracts text from an image.
pub trait TextExtractor: Send + Sync {
    /// Recognize the text in `image` using `language`.
    ///
    /// # Errors
    /// Returns an error if the engine is missing, the image is unreadable, or
    /// no text was recognized.
    fn extract_text(&self, image: &[u8], language: &str) -> OcrResult<String>;
}

/// Image container formats the engine accepts.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ImageFormat {
    /// PNG.
    Png,
    /// JPEG.
    Jpeg,
    /// Windows bitmap.
    Bmp,
    /// TIFF, either byte order.
    Tiff,
    /// GIF.
    Gif,
    /// WebP.
    WebP,
}

impl ImageFormat {
    /// Detect the format from leading magic bytes.
    #[must_use]
    pub const fn sniff(bytes: &[u8]) -> Option<Self> {
        match bytes {
            [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, ..] => Some(Self::Png),
            [0xFF, 0xD8, 0xFF, ..] => Some(Self::Jpeg),
            [b'B', b'M', ..] => Some(Self::Bmp),
            [b'I', b'I', 0x2A, 0x00, ..] | [b'M', b'M', 0x00, 0x2A, ..] => Some(Self::Tiff),
            [b'G', b'I', b'F', b'8', ..] => Some(Self::Gif),
            [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => Some(Self::WebP),
            _ => None,
        }
    }
}

/// Decode an uploaded image given as plain base64 or a `data:` URL.
///
/// # Errors
/// Returns an error if the payload is not valid base64.
pub fn decode_image_payload(payload: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let payload = payload.trim();
    let encoded = match payload.split_once(";base64,") {
        Some((prefix, data)) if prefix.starts_with("data:") => data,
        _ => payload,
    };
    STANDARD.decode(encoded)
}

/// Encode image bytes for storage in a message.
#[must_use]
pub fn encode_image(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}
