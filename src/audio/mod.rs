//! Audio output and post-processing for synthesized speech.
//!
//! [`PlaybackSession`] wraps an injectable [`AudioEngine`]; the production
//! engine is [`RodioEngine`], which keeps the output device on its own
//! thread. [`speed`] re-times synthesized audio and [`encode`] hands MP3
//! output to ffmpeg.

pub mod encode;
pub mod player;
pub mod speed;

pub use player::{AudioEngine, AudioError, PlaybackSession, PlaybackState, RodioEngine};
pub use speed::{AudioSummary, SpeedError};
