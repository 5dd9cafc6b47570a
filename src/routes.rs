use axum::{
    extract::DefaultBodyLimit,
    response::Html,
    routing::{get, post},
    Router,
};

use crate::cmds::{audio_controls, speak, upload};
use crate::state::AppState;

const INDEX_HTML: &str = include_str!("../templates/index.html");

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

pub fn create_router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/upload", post(upload::upload))
        .route("/play_text", post(speak::play_text))
        .route("/pause", post(audio_controls::pause_audio))
        .route("/resume", post(audio_controls::resume_audio))
        .route("/stop", post(audio_controls::stop_audio))
        .route("/status", get(audio_controls::status_audio))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(state)
}
