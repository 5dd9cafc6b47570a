use axum::{
    extract::{rejection::FormRejection, State},
    Form, Json,
};
use log::info;
use serde::{Deserialize, Serialize};

use super::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct PlayTextForm {
    pub text: Option<String>,
    pub speed: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PlayTextResponse {
    pub status: &'static str,
    pub speed: f64,
}

pub fn parse_speed(raw: Option<&str>) -> Result<f64, ApiError> {
    match raw {
        None => Ok(1.0),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ApiError::InvalidSpeed(raw.to_string())),
    }
}

/// Synthesizes `text`, re-times it and starts playback. The speech lock is
/// held until the new file is loaded into the player, even if the client
/// goes away first, so concurrent calls never interleave writes to the
/// shared audio path.
pub async fn play_text(
    State(state): State<AppState>,
    form: Result<Form<PlayTextForm>, FormRejection>,
) -> Result<Json<PlayTextResponse>, ApiError> {
    let Form(form) = form.map_err(|err| ApiError::InvalidForm(err.body_text()))?;
    let text = form.text.ok_or(ApiError::MissingField("text"))?;
    let speed = parse_speed(form.speed.as_deref())?;

    let guard = state.speech_lock.clone().lock_owned().await;
    let speech = state.speech.clone();
    let playback = state.playback.clone();
    let summary = tokio::task::spawn_blocking(move || -> Result<_, ApiError> {
        let summary = speech.speak_text(&text, speed)?;
        playback.play(speech.audio_path())?;
        drop(guard);
        Ok(summary)
    })
    .await??;

    info!(
        "Playing {:.2}s of speech at {speed}x",
        summary.duration.as_secs_f64()
    );
    Ok(Json(PlayTextResponse {
        status: "playing",
        speed,
    }))
}
