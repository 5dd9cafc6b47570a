use std::{net::SocketAddr, path::PathBuf, time::Duration};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
    #[error("READER_PIPER_MODEL must be set when READER_TTS_BACKEND=piper")]
    PiperModelMissing,
    #[error("unknown TTS backend '{0}' (expected 'google' or 'piper')")]
    UnknownBackend(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum TtsBackend {
    Google {
        endpoint: String,
        timeout: Duration,
    },
    Piper {
        model_path: PathBuf,
        command: Option<String>,
    },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind: SocketAddr,
    pub upload_dir: PathBuf,
    pub audio_path: PathBuf,
    pub max_upload_bytes: usize,
    pub tts: TtsBackend,
    pub tesseract_command: Option<String>,
    pub ffmpeg_path: Option<PathBuf>,
}

const DEFAULT_BIND: &str = "127.0.0.1:5000";
const DEFAULT_TTS_URL: &str = "https://translate.google.com/translate_tts";
const DEFAULT_MAX_UPLOAD_BYTES: usize = 32 * 1024 * 1024;
const DEFAULT_TTS_TIMEOUT_SECS: u64 = 30;

impl Config {
    /// Reads `READER_*` variables from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let bind = parse_or(var("READER_BIND"), "READER_BIND", DEFAULT_BIND)?;
        let max_upload_bytes = match var("READER_MAX_UPLOAD_BYTES") {
            Some(raw) => parse(raw, "READER_MAX_UPLOAD_BYTES")?,
            None => DEFAULT_MAX_UPLOAD_BYTES,
        };

        let backend = var("READER_TTS_BACKEND").unwrap_or_else(|| "google".to_string());
        let tts = match backend.to_lowercase().as_str() {
            "google" => {
                let timeout_secs = match var("READER_TTS_TIMEOUT_SECS") {
                    Some(raw) => parse(raw, "READER_TTS_TIMEOUT_SECS")?,
                    None => DEFAULT_TTS_TIMEOUT_SECS,
                };
                TtsBackend::Google {
                    endpoint: var("READER_TTS_URL").unwrap_or_else(|| DEFAULT_TTS_URL.to_string()),
                    timeout: Duration::from_secs(timeout_secs),
                }
            }
            "piper" => TtsBackend::Piper {
                model_path: var("READER_PIPER_MODEL")
                    .map(PathBuf::from)
                    .ok_or(ConfigError::PiperModelMissing)?,
                command: var("READER_PIPER_COMMAND"),
            },
            _ => return Err(ConfigError::UnknownBackend(backend)),
        };

        Ok(Self {
            bind,
            upload_dir: var("READER_UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("uploads")),
            audio_path: var("READER_AUDIO_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("temp_output.wav")),
            max_upload_bytes,
            tts,
            tesseract_command: var("READER_TESSERACT_COMMAND"),
            ffmpeg_path: var("READER_FFMPEG_PATH").map(PathBuf::from),
        })
    }
}

fn parse<T: std::str::FromStr>(raw: String, key: &'static str) -> Result<T, ConfigError> {
    raw.trim()
        .parse()
        .map_err(|_| ConfigError::Invalid { key, value: raw })
}

fn parse_or<T: std::str::FromStr>(
    raw: Option<String>,
    key: &'static str,
    default: &str,
) -> Result<T, ConfigError> {
    parse(raw.unwrap_or_else(|| default.to_string()), key)
}
