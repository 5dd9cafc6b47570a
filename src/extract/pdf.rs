use std::path::Path;

use log::{info, warn};
use lopdf::Document;

use super::ExtractError;

/// Concatenates the text of every page in page order, without separators.
pub fn extract_text_from_pdf(path: &Path) -> Result<String, ExtractError> {
    let pdf_error = |err| ExtractError::Pdf(path.to_path_buf(), err);
    let document = Document::load(path).map_err(pdf_error)?;
    let pages = document.get_pages();

    let mut text = String::new();
    for page_number in pages.keys() {
        text.push_str(&document.extract_text(&[*page_number]).map_err(pdf_error)?);
    }

    let text = text.trim().to_string();
    if text.is_empty() {
        warn!("PDF {} has no extractable text", path.display());
    }
    info!("PDF imported with {} pages", pages.len());
    Ok(text)
}
