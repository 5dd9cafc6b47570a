//! Playback speed adjustment.
//!
//! Speed is changed the cheap way: the decoded samples are relabeled as if
//! recorded at `rate * factor` and then resampled back to `rate`. Duration
//! shrinks by the factor and pitch rises by the same amount; there is no
//! time-stretching.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::time::Duration;

use hound::{SampleFormat, WavSpec, WavWriter};
use log::info;
use rodio::{Decoder, Source};
use thiserror::Error;

use super::encode::{self, EncodeError};

#[derive(Debug, Error)]
pub enum SpeedError {
    #[error("Speed factor must be greater than 0.")]
    InvalidFactor,
    #[error("failed to open audio {0}: {1}")]
    Io(PathBuf, #[source] std::io::Error),
    #[error("failed to decode audio {0}: {1}")]
    Decode(PathBuf, String),
    #[error("failed to write audio: {0}")]
    Wav(#[from] hound::Error),
    #[error("failed to replace {0}: {1}")]
    Persist(PathBuf, #[source] std::io::Error),
    #[error("Speed factor {factor} would stretch the audio to {samples} samples")]
    TooLong { factor: f64, samples: u64 },
    #[error(transparent)]
    Encode(#[from] EncodeError),
}

/// Upper bound on the re-timed buffer: 64 Mi samples, a little over 45
/// minutes of 24 kHz mono.
pub const MAX_OUTPUT_SAMPLES: u64 = 1 << 26;

/// Interleaved 16-bit PCM.
#[derive(Debug, Clone, PartialEq)]
pub struct Pcm {
    pub samples: Vec<i16>,
    pub channels: u16,
    pub sample_rate: u32,
}

impl Pcm {
    pub fn frames(&self) -> usize {
        self.samples.len() / usize::from(self.channels.max(1))
    }

    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.frames() as f64 / f64::from(self.sample_rate))
    }
}

/// Shape of the file written by [`adjust_speed`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AudioSummary {
    pub channels: u16,
    pub sample_rate: u32,
    pub duration: Duration,
}

pub fn validate_factor(factor: f64) -> Result<(), SpeedError> {
    if factor.is_finite() && factor > 0.0 {
        Ok(())
    } else {
        Err(SpeedError::InvalidFactor)
    }
}

/// Decodes `input`, applies `factor` and exports to `output`, replacing any
/// previous file. `.mp3` outputs are encoded through ffmpeg, everything else
/// is written as 16-bit WAV.
pub fn adjust_speed(
    input: &Path,
    factor: f64,
    output: &Path,
    ffmpeg: Option<&Path>,
) -> Result<AudioSummary, SpeedError> {
    validate_factor(factor)?;
    let decoded = decode(input)?;
    let adjusted = change_speed(&decoded, factor)?;
    export(&adjusted, output, ffmpeg)?;

    let summary = AudioSummary {
        channels: adjusted.channels,
        sample_rate: adjusted.sample_rate,
        duration: adjusted.duration(),
    };
    info!(
        "Adjusted speech to {factor}x: {:.2}s -> {:.2}s, {} channel(s) at {} Hz",
        decoded.duration().as_secs_f64(),
        summary.duration.as_secs_f64(),
        summary.channels,
        summary.sample_rate
    );
    Ok(summary)
}

pub fn decode(path: &Path) -> Result<Pcm, SpeedError> {
    let file = File::open(path).map_err(|err| SpeedError::Io(path.to_path_buf(), err))?;
    let decoder = Decoder::new(BufReader::new(file))
        .map_err(|err| SpeedError::Decode(path.to_path_buf(), err.to_string()))?;
    let channels = decoder.channels();
    let sample_rate = decoder.sample_rate();
    Ok(Pcm {
        samples: decoder.collect(),
        channels,
        sample_rate,
    })
}

pub fn change_speed(audio: &Pcm, factor: f64) -> Result<Pcm, SpeedError> {
    validate_factor(factor)?;
    let relabeled_rate = (f64::from(audio.sample_rate) * factor) as u32;
    if relabeled_rate == 0 {
        return Err(SpeedError::InvalidFactor);
    }
    let samples = output_frames(audio.frames(), relabeled_rate, audio.sample_rate)
        * u64::from(audio.channels.max(1));
    if samples > MAX_OUTPUT_SAMPLES {
        return Err(SpeedError::TooLong { factor, samples });
    }
    Ok(Pcm {
        samples: resample_linear(&audio.samples, audio.channels, relabeled_rate, audio.sample_rate),
        channels: audio.channels,
        sample_rate: audio.sample_rate,
    })
}

/// Linear interpolation between neighbouring frames. A trailing partial
/// frame is dropped.
pub fn resample_linear(samples: &[i16], channels: u16, from_rate: u32, to_rate: u32) -> Vec<i16> {
    let channels = usize::from(channels.max(1));
    let frames = samples.len() / channels;
    if frames == 0 || from_rate == 0 || to_rate == 0 {
        return Vec::new();
    }
    if from_rate == to_rate {
        return samples[..frames * channels].to_vec();
    }

    let out_frames = output_frames(frames, from_rate, to_rate) as usize;
    let step = f64::from(from_rate) / f64::from(to_rate);
    let mut out = Vec::with_capacity(out_frames * channels);
    for frame in 0..out_frames {
        let position = frame as f64 * step;
        let index = (position.floor() as usize).min(frames - 1);
        let next = (index + 1).min(frames - 1);
        let fraction = position - index as f64;
        for channel in 0..channels {
            let a = f64::from(samples[index * channels + channel]);
            let b = f64::from(samples[next * channels + channel]);
            let value = (a + (b - a) * fraction).round();
            out.push(value.clamp(f64::from(i16::MIN), f64::from(i16::MAX)) as i16);
        }
    }
    out
}

fn output_frames(frames: usize, from_rate: u32, to_rate: u32) -> u64 {
    if from_rate == 0 {
        return 0;
    }
    frames as u64 * u64::from(to_rate) / u64::from(from_rate)
}

/// Writes to a sibling temporary file first and renames it over `output`,
/// so a sink still reading the previous file keeps a valid inode.
fn export(audio: &Pcm, output: &Path, ffmpeg: Option<&Path>) -> Result<(), SpeedError> {
    let dir = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir).map_err(|err| SpeedError::Persist(dir.clone(), err))?;
    let staging = |suffix: &str| {
        tempfile::Builder::new()
            .prefix(".reader-audio-")
            .suffix(suffix)
            .tempfile_in(&dir)
            .map_err(|err| SpeedError::Persist(output.to_path_buf(), err))
    };

    let mut wav = staging(".wav")?;
    write_wav(audio, wav.as_file_mut())?;

    let is_mp3 = output
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("mp3"));
    let finished = if is_mp3 {
        let ffmpeg = encode::locate_ffmpeg(ffmpeg).ok_or(EncodeError::FfmpegMissing)?;
        let mp3 = staging(".mp3")?;
        encode::encode_mp3(&ffmpeg, wav.path(), mp3.path())?;
        mp3
    } else {
        wav
    };

    finished
        .persist(output)
        .map_err(|err| SpeedError::Persist(output.to_path_buf(), err.error))?;
    Ok(())
}

fn write_wav(audio: &Pcm, file: &mut File) -> Result<(), SpeedError> {
    let spec = WavSpec {
        channels: audio.channels.max(1),
        sample_rate: audio.sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::new(BufWriter::new(file), spec)?;
    for &sample in &audio.samples {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;
    Ok(())
}
