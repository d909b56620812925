//! Tesseract CLI runner.
//!
//! Pipes the image through `tesseract stdin stdout` with a fixed engine and
//! page-segmentation mode. Leptonica decodes the container and converts the
//! pixels, so no re-encoding happens here.

use std::io::{ErrorKind, Write};
use std::process::{Command, Stdio};

use tracing::debug;

use super::error::{OcrError, OcrResult};
use super::{ImageFormat, TextExtractor};

/// LSTM engine only.
const OEM: &str = "3";
/// Assume a single uniform block of text.
const PSM: &str = "6";

/// Runs the `tesseract` binary as a child process per image.
#[derive(Clone, Debug)]
pub struct TesseractCli {
    binary: String,
}

impl TesseractCli {
    /// Use `binary` (a name on `PATH` or a full path).
    #[must_use]
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl TextExtractor for TesseractCli {
    fn extract_text(&self, image: &[u8], language: &str) -> OcrResult<String> {
        let format = ImageFormat::sniff(image).ok_or(OcrError::UnsupportedFormat)?;
        debug!(?format, language, bytes = image.len(), "running tesseract");

        let mut child = Command::new(&self.binary)
            .args(["stdin", "stdout", "-l", language, "--oem", OEM, "--psm", PSM])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|err| match err.kind() {
                ErrorKind::NotFound => OcrError::NotInstalled {
                    binary: self.binary.clone(),
                },
                _ => OcrError::Io(err),
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            // A child that exits early closes the pipe; its status says why.
            match stdin.write_all(image) {
                Ok(()) => {}
                Err(err) if err.kind() == ErrorKind::BrokenPipe => {}
                Err(err) => return Err(OcrError::Io(err)),
            }
        }

        let output = child.wait_with_output()?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let reason = if stderr.is_empty() {
                output.status.to_string()
            } else {
                stderr
            };
            return Err(OcrError::Failed(reason));
        }

        let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if text.is_empty() {
            return Err(OcrError::NoText);
        }
        Ok(text)
    }
}
