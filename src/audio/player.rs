use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread;

use log::{info, warn};
use parking_lot::Mutex;
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("could not open audio file: {0}")]
    Io(String),
    #[error("audio file is corrupt: {0}")]
    Decode(String),
    #[error("no audio output device available")]
    Device,
    #[error("could not create audio sink: {0}")]
    Sink(String),
    #[error("audio thread is not running")]
    Disconnected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    Stopped,
    Playing,
    Paused,
}

/// Output backend driven by a [`PlaybackSession`].
pub trait AudioEngine: Send {
    /// Loads `path` and starts it, replacing whatever was playing.
    fn play(&mut self, path: &Path) -> Result<(), AudioError>;
    fn pause(&mut self) -> Result<(), AudioError>;
    fn resume(&mut self) -> Result<(), AudioError>;
    fn stop(&mut self) -> Result<(), AudioError>;
    /// `true` once the loaded audio has played to the end.
    fn finished(&mut self) -> Result<bool, AudioError>;
}

struct SessionInner {
    engine: Box<dyn AudioEngine>,
    state: PlaybackState,
}

/// The process-wide mixer. Commands are forwarded to the engine without
/// rejecting out-of-order calls; the state only follows transitions that
/// actually change something.
pub struct PlaybackSession {
    inner: Mutex<SessionInner>,
}

impl PlaybackSession {
    pub fn new(engine: Box<dyn AudioEngine>) -> Self {
        Self {
            inner: Mutex::new(SessionInner {
                engine,
                state: PlaybackState::Stopped,
            }),
        }
    }

    pub fn play(&self, path: &Path) -> Result<(), AudioError> {
        let mut inner = self.inner.lock();
        inner.engine.play(path)?;
        inner.state = PlaybackState::Playing;
        Ok(())
    }

    pub fn pause(&self) -> Result<(), AudioError> {
        let mut inner = self.inner.lock();
        inner.engine.pause()?;
        if inner.state == PlaybackState::Playing {
            inner.state = PlaybackState::Paused;
        }
        Ok(())
    }

    pub fn resume(&self) -> Result<(), AudioError> {
        let mut inner = self.inner.lock();
        inner.engine.resume()?;
        if inner.state == PlaybackState::Paused {
            inner.state = PlaybackState::Playing;
        }
        Ok(())
    }

    pub fn stop(&self) -> Result<(), AudioError> {
        let mut inner = self.inner.lock();
        inner.engine.stop()?;
        inner.state = PlaybackState::Stopped;
        Ok(())
    }

    pub fn status(&self) -> PlaybackState {
        let mut inner = self.inner.lock();
        if inner.state == PlaybackState::Playing {
            match inner.engine.finished() {
                Ok(true) => inner.state = PlaybackState::Stopped,
                Ok(false) => {}
                Err(err) => warn!("Unable to query playback progress: {err}"),
            }
        }
        inner.state
    }
}

enum EngineCommand {
    Play(PathBuf),
    Pause,
    Resume,
    Stop,
    Finished,
}

struct EngineRequest {
    command: EngineCommand,
    reply: mpsc::Sender<Result<bool, AudioError>>,
}

/// rodio backend. The output stream is not `Send`, so it lives on a
/// dedicated thread and is opened on the first `play`.
pub struct RodioEngine {
    commands: mpsc::Sender<EngineRequest>,
}

impl RodioEngine {
    pub fn spawn() -> Result<Self, AudioError> {
        let (commands, requests) = mpsc::channel();
        thread::Builder::new()
            .name("reader-audio".into())
            .spawn(move || run_audio_thread(requests))
            .map_err(|err| AudioError::Io(err.to_string()))?;
        Ok(Self { commands })
    }

    fn request(&self, command: EngineCommand) -> Result<bool, AudioError> {
        let (reply, response) = mpsc::channel();
        self.commands
            .send(EngineRequest { command, reply })
            .map_err(|_| AudioError::Disconnected)?;
        response.recv().map_err(|_| AudioError::Disconnected)?
    }
}

impl AudioEngine for RodioEngine {
    fn play(&mut self, path: &Path) -> Result<(), AudioError> {
        self.request(EngineCommand::Play(path.to_path_buf())).map(drop)
    }

    fn pause(&mut self) -> Result<(), AudioError> {
        self.request(EngineCommand::Pause).map(drop)
    }

    fn resume(&mut self) -> Result<(), AudioError> {
        self.request(EngineCommand::Resume).map(drop)
    }

    fn stop(&mut self) -> Result<(), AudioError> {
        self.request(EngineCommand::Stop).map(drop)
    }

    fn finished(&mut self) -> Result<bool, AudioError> {
        self.request(EngineCommand::Finished)
    }
}

#[derive(Default)]
struct Mixer {
    output: Option<(OutputStream, OutputStreamHandle)>,
    sink: Option<Sink>,
}

impl Mixer {
    fn play(&mut self, path: &Path) -> Result<(), AudioError> {
        let decoder = open_decoder(path)?;

        if self.output.is_none() {
            self.output = Some(OutputStream::try_default().map_err(|_| AudioError::Device)?);
            info!("Audio output device opened");
        }
        let Some((_, handle)) = self.output.as_ref() else {
            return Err(AudioError::Device);
        };

        if let Some(previous) = self.sink.take() {
            previous.stop();
        }
        let sink = Sink::try_new(handle).map_err(|err| AudioError::Sink(err.to_string()))?;
        sink.append(decoder);
        sink.play();
        self.sink = Some(sink);
        Ok(())
    }

    fn handle(&mut self, command: EngineCommand) -> Result<bool, AudioError> {
        match command {
            EngineCommand::Play(path) => self.play(&path).map(|_| false),
            EngineCommand::Pause => {
                if let Some(sink) = &self.sink {
                    sink.pause();
                }
                Ok(false)
            }
            EngineCommand::Resume => {
                if let Some(sink) = &self.sink {
                    sink.play();
                }
                Ok(false)
            }
            EngineCommand::Stop => {
                if let Some(sink) = self.sink.take() {
                    sink.stop();
                }
                Ok(false)
            }
            EngineCommand::Finished => Ok(self.sink.as_ref().map_or(true, Sink::empty)),
        }
    }
}

fn open_decoder(path: &Path) -> Result<Decoder<BufReader<File>>, AudioError> {
    let file = File::open(path).map_err(|err| AudioError::Io(err.to_string()))?;
    Decoder::new(BufReader::new(file)).map_err(|err| AudioError::Decode(err.to_string()))
}

fn run_audio_thread(requests: mpsc::Receiver<EngineRequest>) {
    let mut mixer = Mixer::default();
    for request in requests {
        let result = mixer.handle(request.command);
        let _ = request.reply.send(result);
    }
}
