use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use log::{error, info};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("ffmpeg is not available on PATH; install it or choose a .wav audio path")]
    FfmpegMissing,
    #[error("failed to launch ffmpeg: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("ffmpeg exited with status {status}: {stderr}")]
    Failed { status: i32, stderr: String },
}

/// Prefers an explicitly configured binary, then whatever `ffmpeg` is on
/// `PATH`.
pub fn locate_ffmpeg(configured: Option<&Path>) -> Option<PathBuf> {
    if let Some(candidate) = configured {
        if candidate.exists() {
            return Some(candidate.to_path_buf());
        }
    }
    which::which("ffmpeg").ok()
}

/// Encodes `source` (any format ffmpeg reads) to MP3 at `target`,
/// overwriting it.
pub fn encode_mp3(ffmpeg: &Path, source: &Path, target: &Path) -> Result<(), EncodeError> {
    info!("Encoding {} to MP3 with ffmpeg", source.display());
    let output = Command::new(ffmpeg)
        .args(["-y", "-loglevel", "error", "-i"])
        .arg(source)
        .args(["-vn", "-f", "mp3"])
        .arg(target)
        .stdin(Stdio::null())
        .output()
        .map_err(EncodeError::Spawn)?;

    if !output.status.success() {
        let status = output.status.code().unwrap_or_default();
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        error!("ffmpeg exited with status {status}: {stderr}");
        return Err(EncodeError::Failed { status, stderr });
    }
    Ok(())
}
