//! Text extraction from uploaded documents.
//!
//! Images go through Tesseract after a grayscale and contrast pass, PDFs are
//! read page by page. [`extract_text`] picks the route from the file
//! extension.

pub mod ocr;
pub mod pdf;

use std::path::{Path, PathBuf};

use thiserror::Error;

pub use ocr::OcrSettings;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("failed to read image {0}: {1}")]
    Image(PathBuf, #[source] image::ImageError),
    #[error("I/O error during extraction: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid tesseract command: {0}")]
    Command(#[from] crate::util::command::CommandLineError),
    #[error("tesseract exited with status {status}: {stderr}")]
    Tesseract { status: i32, stderr: String },
    #[error("failed to read PDF {0}: {1}")]
    Pdf(PathBuf, #[source] lopdf::Error),
    #[error("unsupported document type: {0}")]
    Unsupported(PathBuf),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Image,
    Pdf,
}

impl DocumentKind {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "png" | "jpg" | "jpeg" => Some(Self::Image),
            "pdf" => Some(Self::Pdf),
            _ => None,
        }
    }
}

/// Extracts raw, uncleaned text from a stored upload.
pub fn extract_text(path: &Path, ocr: &OcrSettings) -> Result<String, ExtractError> {
    match DocumentKind::from_path(path) {
        Some(DocumentKind::Image) => ocr::extract_text_from_image(path, ocr),
        Some(DocumentKind::Pdf) => pdf::extract_text_from_pdf(path),
        None => Err(ExtractError::Unsupported(path.to_path_buf())),
    }
}
