//! Text-to-speech backends and the speak pipeline that feeds the player.

pub mod google;
pub mod piper;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::info;
use thiserror::Error;

use crate::audio::{speed, AudioSummary, SpeedError};
use crate::config::TtsBackend;
use crate::util::command::CommandLineError;

pub use google::GoogleTts;
pub use piper::PiperSynthesizer;

#[derive(Debug, Error)]
pub enum SpeechError {
    #[error("No text to speak")]
    EmptyText,
    #[error("TTS request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("TTS service returned HTTP {0}")]
    Status(u16),
    #[error("voice model not found at {0}")]
    VoiceNotFound(PathBuf),
    #[error("invalid Piper command: {0}")]
    Command(#[from] CommandLineError),
    #[error("failed to launch Piper: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("Piper exited with status {status}: {stderr}")]
    PiperFailure { status: i32, stderr: String },
    #[error("I/O error during synthesis: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Speed(#[from] SpeedError),
}

/// A speech backend. Implementations write audio in any format the player
/// can decode (MP3 or WAV) to `output`.
pub trait Synthesizer: Send + Sync {
    fn name(&self) -> &'static str;
    fn synthesize(&self, text: &str, output: &Path) -> Result<(), SpeechError>;
}

pub fn synthesizer_from_config(backend: &TtsBackend) -> Arc<dyn Synthesizer> {
    match backend {
        TtsBackend::Google { endpoint, timeout } => {
            Arc::new(GoogleTts::new(endpoint.clone(), *timeout))
        }
        TtsBackend::Piper {
            model_path,
            command,
        } => Arc::new(PiperSynthesizer::new(model_path.clone(), command.clone())),
    }
}

/// Synthesis followed by speed adjustment into the fixed audio path.
pub struct SpeechPipeline {
    synthesizer: Arc<dyn Synthesizer>,
    audio_path: PathBuf,
    ffmpeg: Option<PathBuf>,
}

impl SpeechPipeline {
    pub fn new(
        synthesizer: Arc<dyn Synthesizer>,
        audio_path: PathBuf,
        ffmpeg: Option<PathBuf>,
    ) -> Self {
        Self {
            synthesizer,
            audio_path,
            ffmpeg,
        }
    }

    pub fn audio_path(&self) -> &Path {
        &self.audio_path
    }

    /// Blocking; run it off the async executor.
    pub fn speak_text(&self, text: &str, speed: f64) -> Result<AudioSummary, SpeechError> {
        if text.trim().is_empty() {
            return Err(SpeechError::EmptyText);
        }
        speed::validate_factor(speed)?;

        info!(
            "Synthesizing {} characters with {} at {speed}x",
            text.chars().count(),
            self.synthesizer.name()
        );
        let raw = tempfile::Builder::new().prefix("reader-tts-").tempfile()?;
        self.synthesizer.synthesize(text, raw.path())?;
        let summary = speed::adjust_speed(
            raw.path(),
            speed,
            &self.audio_path,
            self.ffmpeg.as_deref(),
        )?;
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FailingSynthesizer, FakeSynthesizer};
    use std::time::Duration;
    use tempfile::TempDir;

    fn pipeline(temp: &TempDir, synthesizer: Arc<dyn Synthesizer>) -> SpeechPipeline {
        SpeechPipeline::new(synthesizer, temp.path().join("temp_output.wav"), None)
    }

    #[test]
    fn writes_adjusted_audio_to_fixed_path() {
        let temp = TempDir::new().unwrap();
        let pipeline = pipeline(&temp, Arc::new(FakeSynthesizer));

        let normal = pipeline.speak_text("hello there", 1.0).unwrap();
        let fast = pipeline.speak_text("hello there", 2.0).unwrap();
        assert!(pipeline.audio_path().exists());
        let expected = normal.duration.as_secs_f64() / 2.0;
        assert!((fast.duration.as_secs_f64() - expected).abs() < 1e-3);
    }

    #[test]
    fn empty_text_is_rejected() {
        let temp = TempDir::new().unwrap();
        let pipeline = pipeline(&temp, Arc::new(FakeSynthesizer));
        let err = pipeline.speak_text("  \n ", 1.0).unwrap_err();
        assert!(matches!(err, SpeechError::EmptyText));
        assert_eq!(err.to_string(), "No text to speak");
    }

    #[test]
    fn non_positive_speed_fails_before_synthesis() {
        let temp = TempDir::new().unwrap();
        let pipeline = pipeline(&temp, Arc::new(FailingSynthesizer));
        for speed in [0.0, -2.0] {
            let err = pipeline.speak_text("hello", speed).unwrap_err();
            assert!(matches!(err, SpeechError::Speed(SpeedError::InvalidFactor)));
        }
    }

    #[test]
    fn synthesis_failure_propagates() {
        let temp = TempDir::new().unwrap();
        let pipeline = pipeline(&temp, Arc::new(FailingSynthesizer));
        let err = pipeline.speak_text("hello", 1.0).unwrap_err();
        assert!(matches!(err, SpeechError::Status(503)));
        assert!(!pipeline.audio_path().exists());
    }

    #[test]
    fn builds_backend_from_config() {
        let google = synthesizer_from_config(&TtsBackend::Google {
            endpoint: "http://localhost/translate_tts".into(),
            timeout: Duration::from_secs(1),
        });
        assert_eq!(google.name(), "google");

        let piper = synthesizer_from_config(&TtsBackend::Piper {
            model_path: PathBuf::from("voice.onnx"),
            command: None,
        });
        assert_eq!(piper.name(), "piper");
    }
}
