use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{Context, Result};
use log::info;
use tokio::sync::Mutex;

use crate::{
    audio::{AudioEngine, PlaybackSession, RodioEngine},
    config::Config,
    extract::OcrSettings,
    tts::{self, SpeechPipeline, Synthesizer},
};

#[derive(Clone)]
pub struct AppState {
    pub speech: Arc<SpeechPipeline>,
    pub playback: Arc<PlaybackSession>,
    /// Serializes synthesis, the audio file write and the player load.
    pub speech_lock: Arc<Mutex<()>>,
    pub ocr: Arc<OcrSettings>,
    upload_dir: Arc<PathBuf>,
}

impl AppState {
    pub fn initialise(config: &Config) -> Result<Self> {
        fs::create_dir_all(&config.upload_dir).with_context(|| {
            format!(
                "unable to create upload directory {}",
                config.upload_dir.display()
            )
        })?;
        let engine = RodioEngine::spawn().context("failed to start audio thread")?;
        let synthesizer = tts::synthesizer_from_config(&config.tts);
        info!(
            "Using {} speech backend, audio at {}",
            synthesizer.name(),
            config.audio_path.display()
        );
        Ok(Self::new(config, synthesizer, Box::new(engine)))
    }

    pub fn new(
        config: &Config,
        synthesizer: Arc<dyn Synthesizer>,
        engine: Box<dyn AudioEngine>,
    ) -> Self {
        Self {
            speech: Arc::new(SpeechPipeline::new(
                synthesizer,
                config.audio_path.clone(),
                config.ffmpeg_path.clone(),
            )),
            playback: Arc::new(PlaybackSession::new(engine)),
            speech_lock: Arc::new(Mutex::new(())),
            ocr: Arc::new(OcrSettings {
                command: config.tesseract_command.clone(),
                ..OcrSettings::default()
            }),
            upload_dir: Arc::new(config.upload_dir.clone()),
        }
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }
}
