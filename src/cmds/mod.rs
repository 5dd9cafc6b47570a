//! HTTP command handlers.
//!
//! Every handler answers with JSON. Validation and playback problems come
//! back as `{"error": ...}` with HTTP 200 so the page can show them inline;
//! extraction and storage faults use HTTP 500.

pub mod audio_controls;
pub mod speak;
pub mod upload;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use log::error;
use serde::Serialize;
use thiserror::Error;

use crate::{audio::AudioError, extract::ExtractError, tts::SpeechError};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("No file part")]
    NoFilePart,
    #[error("No selected file")]
    NoSelectedFile,
    #[error("Invalid file format")]
    InvalidFileFormat,
    #[error("Unsupported file type")]
    UnsupportedFileType,
    #[error("Malformed upload: {0}")]
    Multipart(String),
    #[error("File too large")]
    TooLarge,
    #[error("Missing form field: {0}")]
    MissingField(&'static str),
    #[error("Invalid form: {0}")]
    InvalidForm(String),
    #[error("Invalid speed value: {0}")]
    InvalidSpeed(String),
    #[error("failed to store upload: {0}")]
    Storage(#[source] std::io::Error),
    #[error(transparent)]
    Extract(#[from] ExtractError),
    #[error(transparent)]
    Speech(#[from] SpeechError),
    #[error(transparent)]
    Audio(#[from] AudioError),
    #[error("background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::TooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Storage(_) | Self::Extract(_) | Self::Join(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            _ => StatusCode::OK,
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {self}");
        }
        (status, Json(ErrorBody { error: self.to_string() })).into_response()
    }
}
