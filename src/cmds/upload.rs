use std::path::Path;

use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        Multipart, State,
    },
    http::StatusCode,
    Json,
};
use log::info;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use unicode_normalization::UnicodeNormalization;

use super::ApiError;
use crate::{
    extract::{self, DocumentKind},
    state::AppState,
    text::clean_text,
};

const ALLOWED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "pdf"];

static UNSAFE_FILENAME_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9_.-]").expect("valid filename pattern"));

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub text: String,
}

pub fn allowed_file(filename: &str) -> bool {
    filename
        .rsplit_once('.')
        .is_some_and(|(_, ext)| ALLOWED_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
}

/// Reduces a client supplied name to a flat ASCII filename that cannot
/// escape the upload directory. Accented letters are decomposed (NFKD) so
/// they keep their base letter. May return an empty string.
pub fn secure_filename(filename: &str) -> String {
    let ascii: String = filename
        .nfkd()
        .filter(char::is_ascii)
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();
    let joined = ascii.split_whitespace().collect::<Vec<_>>().join("_");
    UNSAFE_FILENAME_CHARS
        .replace_all(&joined, "")
        .trim_matches(|c| c == '.' || c == '_')
        .to_string()
}

fn multipart_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::TooLarge
    } else {
        ApiError::Multipart(err.body_text())
    }
}

pub async fn upload(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut multipart = multipart.map_err(|_| ApiError::NoFilePart)?;

    let mut upload = None;
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some("file") {
            continue;
        }
        // A part without a filename is a plain form value, not a file.
        let Some(filename) = field.file_name().map(str::to_string) else {
            continue;
        };
        let bytes = field
            .bytes()
            .await
            .map_err(multipart_error)?;
        upload = Some((filename, bytes));
        break;
    }

    let (filename, bytes) = upload.ok_or(ApiError::NoFilePart)?;
    if filename.is_empty() {
        return Err(ApiError::NoSelectedFile);
    }
    if !allowed_file(&filename) {
        return Err(ApiError::InvalidFileFormat);
    }
    let stored_name = secure_filename(&filename);
    if stored_name.is_empty() {
        return Err(ApiError::InvalidFileFormat);
    }

    let path = state.upload_dir().join(&stored_name);
    tokio::fs::write(&path, &bytes)
        .await
        .map_err(ApiError::Storage)?;
    info!("Stored upload {} ({} bytes)", path.display(), bytes.len());

    if DocumentKind::from_path(Path::new(&stored_name)).is_none() {
        return Err(ApiError::UnsupportedFileType);
    }

    let ocr = state.ocr.clone();
    let raw = tokio::task::spawn_blocking(move || extract::extract_text(&path, &ocr)).await??;
    let text = clean_text(&raw);
    info!("Extracted {} characters from {stored_name}", text.chars().count());
    Ok(Json(UploadResponse { text }))
}
