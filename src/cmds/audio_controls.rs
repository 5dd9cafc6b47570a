use std::sync::Arc;

use axum::{extract::State, Json};
use log::info;
use serde::Serialize;

use super::ApiError;
use crate::{
    audio::{AudioError, PlaybackSession, PlaybackState},
    state::AppState,
};

#[derive(Debug, Serialize)]
pub struct CommandStatus {
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct PlaybackStatus {
    pub state: PlaybackState,
}

/// Session calls wait on the audio thread, so they run on the blocking pool.
async fn with_session<T, F>(state: &AppState, call: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&PlaybackSession) -> Result<T, AudioError> + Send + 'static,
{
    let playback = Arc::clone(&state.playback);
    Ok(tokio::task::spawn_blocking(move || call(&playback)).await??)
}

pub async fn pause_audio(State(state): State<AppState>) -> Result<Json<CommandStatus>, ApiError> {
    with_session(&state, PlaybackSession::pause).await?;
    info!("Playback paused");
    Ok(Json(CommandStatus { status: "paused" }))
}

pub async fn resume_audio(State(state): State<AppState>) -> Result<Json<CommandStatus>, ApiError> {
    with_session(&state, PlaybackSession::resume).await?;
    info!("Playback resumed");
    Ok(Json(CommandStatus { status: "resumed" }))
}

pub async fn stop_audio(State(state): State<AppState>) -> Result<Json<CommandStatus>, ApiError> {
    with_session(&state, PlaybackSession::stop).await?;
    info!("Playback stopped");
    Ok(Json(CommandStatus { status: "stopped" }))
}

pub async fn status_audio(State(state): State<AppState>) -> Result<Json<PlaybackStatus>, ApiError> {
    let current = with_session(&state, |session| Ok(session.status())).await?;
    Ok(Json(PlaybackStatus { state: current }))
}
