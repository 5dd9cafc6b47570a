//! Test doubles for the speech backend and the audio device.

use std::path::Path;
use std::sync::Arc;

use hound::{SampleFormat, WavSpec, WavWriter};
use parking_lot::Mutex;

use crate::audio::{AudioEngine, AudioError};
use crate::tts::{SpeechError, Synthesizer};

pub fn write_test_wav(path: &Path, samples: &[i16], sample_rate: u32) {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(path, spec).unwrap();
    for &sample in samples {
        writer.write_sample(sample).unwrap();
    }
    writer.finalize().unwrap();
}

/// Writes 8 kHz mono speech whose length and samples depend on the text.
pub struct FakeSynthesizer;

impl Synthesizer for FakeSynthesizer {
    fn name(&self) -> &'static str {
        "fake"
    }

    fn synthesize(&self, text: &str, output: &Path) -> Result<(), SpeechError> {
        let samples: Vec<i16> = text
            .bytes()
            .flat_map(|byte| std::iter::repeat(i16::from(byte) * 100).take(80))
            .collect();
        write_test_wav(output, &samples, 8_000);
        Ok(())
    }
}

pub struct FailingSynthesizer;

impl Synthesizer for FailingSynthesizer {
    fn name(&self) -> &'static str {
        "failing"
    }

    fn synthesize(&self, _text: &str, _output: &Path) -> Result<(), SpeechError> {
        Err(SpeechError::Status(503))
    }
}

#[derive(Default)]
pub struct RecordingEngine {
    calls: Arc<Mutex<Vec<String>>>,
    finished: Arc<Mutex<bool>>,
    fail: bool,
}

impl RecordingEngine {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Arc<Mutex<Vec<String>>> {
        self.calls.clone()
    }

    pub fn finished_flag(&self) -> Arc<Mutex<bool>> {
        self.finished.clone()
    }

    fn record(&self, call: String) -> Result<(), AudioError> {
        if self.fail {
            return Err(AudioError::Device);
        }
        self.calls.lock().push(call);
        Ok(())
    }
}

impl AudioEngine for RecordingEngine {
    fn play(&mut self, path: &Path) -> Result<(), AudioError> {
        *self.finished.lock() = false;
        self.record(format!("play {}", path.display()))
    }

    fn pause(&mut self) -> Result<(), AudioError> {
        self.record("pause".into())
    }

    fn resume(&mut self) -> Result<(), AudioError> {
        self.record("resume".into())
    }

    fn stop(&mut self) -> Result<(), AudioError> {
        self.record("stop".into())
    }

    fn finished(&mut self) -> Result<bool, AudioError> {
        Ok(*self.finished.lock())
    }
}

/// [`FakeSynthesizer`] that takes `delay` before writing anything.
pub struct SlowSynthesizer {
    pub delay: std::time::Duration,
}

impl Synthesizer for SlowSynthesizer {
    fn name(&self) -> &'static str {
        "slow"
    }

    fn synthesize(&self, text: &str, output: &Path) -> Result<(), SpeechError> {
        std::thread::sleep(self.delay);
        FakeSynthesizer.synthesize(text, output)
    }
}

/// Shell script standing in for ffmpeg: copies the `-i` input to the last
/// argument.
pub const COPYING_FFMPEG: &str = "#!/bin/sh\n\
    IN=\"\"; OUT=\"\"\n\
    while [ \"$1\" != \"\" ]; do\n\
      if [ \"$1\" = \"-i\" ]; then shift; IN=\"$1\"; fi\n\
      OUT=\"$1\"\n\
      shift\n\
    done\n\
    cat \"$IN\" > \"$OUT\"\n";

pub fn write_stub_ffmpeg(dir: &Path, body: &str) -> std::path::PathBuf {
    let path = dir.join("ffmpeg");
    std::fs::write(&path, body).unwrap();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    }
    path
}
