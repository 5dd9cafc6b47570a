use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Instant;

use log::{error, info, warn};

use super::{SpeechError, Synthesizer};
use crate::util::command::command_from_override;

/// Local Piper voice. Text goes in on stdin, a WAV comes out at
/// `--output_file`.
#[derive(Debug, Clone)]
pub struct PiperSynthesizer {
    model_path: PathBuf,
    command: Option<String>,
}

impl PiperSynthesizer {
    pub fn new(model_path: PathBuf, command: Option<String>) -> Self {
        Self {
            model_path,
            command,
        }
    }

    fn build_command(&self, output: &Path) -> Result<Command, SpeechError> {
        if !self.model_path.exists() {
            return Err(SpeechError::VoiceNotFound(self.model_path.clone()));
        }
        let default: &[&str] = if cfg!(target_os = "windows") {
            &["runtime/piper/piper.exe"]
        } else {
            &["python", "-m", "piper"]
        };
        let mut command = command_from_override(self.command.as_deref(), default)?;
        command.arg("--model");
        command.arg(&self.model_path);
        command.arg("--output_file");
        command.arg(output);
        Ok(command)
    }
}

impl Synthesizer for PiperSynthesizer {
    fn name(&self) -> &'static str {
        "piper"
    }

    fn synthesize(&self, text: &str, output: &Path) -> Result<(), SpeechError> {
        let start = Instant::now();
        let mut child = self
            .build_command(output)?
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(SpeechError::Spawn)?;
        {
            let stdin = child.stdin.as_mut().ok_or_else(|| {
                SpeechError::Io(std::io::Error::other("failed to access Piper stdin"))
            })?;
            stdin.write_all(text.as_bytes())?;
        }
        let result = child.wait_with_output()?;
        let stderr = String::from_utf8_lossy(&result.stderr).trim().to_string();

        if !result.status.success() {
            let status = result.status.code().unwrap_or_default();
            error!("Piper exited with status {status}: {stderr}");
            return Err(SpeechError::PiperFailure { status, stderr });
        }
        if !stderr.is_empty() {
            warn!("Piper: {stderr}");
        }
        info!(
            "Piper synthesized {} in {} ms",
            output.display(),
            start.elapsed().as_millis()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::{prelude::*, TempDir};
    use std::fs;

    const MOCK_PIPER: &str = r#"#!/bin/sh
while [ "$#" -gt 0 ]; do
  case "$1" in
    --output_file) shift; out="$1" ;;
  esac
  shift
done
printf 'WAV:' > "$out"
cat >> "$out"
"#;

    fn mock_piper(temp: &TempDir, body: &str, model_exists: bool) -> PiperSynthesizer {
        let script = temp.child("mock_piper.sh");
        script.write_str(body).unwrap();
        let model = temp.child("voice.onnx");
        if model_exists {
            model.write_binary(b"voice").unwrap();
        }
        PiperSynthesizer::new(
            model.path().to_path_buf(),
            Some(format!("sh '{}'", script.path().display())),
        )
    }

    #[test]
    fn pipes_text_to_piper() {
        let temp = TempDir::new().unwrap();
        let piper = mock_piper(&temp, MOCK_PIPER, true);
        let output = temp.path().join("speech.wav");
        piper.synthesize("hola", &output).unwrap();
        assert_eq!(fs::read_to_string(&output).unwrap(), "WAV:hola");
    }

    #[test]
    fn missing_voice_returns_error() {
        let temp = TempDir::new().unwrap();
        let piper = mock_piper(&temp, MOCK_PIPER, false);
        let err = piper
            .synthesize("hola", &temp.path().join("speech.wav"))
            .unwrap_err();
        assert!(matches!(err, SpeechError::VoiceNotFound(_)));
    }

    #[test]
    fn process_failure_returns_stderr() {
        let temp = TempDir::new().unwrap();
        let piper = mock_piper(&temp, "#!/bin/sh\ncat > /dev/null\necho boom >&2\nexit 2\n", true);
        let err = piper
            .synthesize("hola", &temp.path().join("speech.wav"))
            .unwrap_err();
        match err {
            SpeechError::PiperFailure { status, stderr } => {
                assert_eq!(status, 2);
                assert_eq!(stderr, "boom");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
