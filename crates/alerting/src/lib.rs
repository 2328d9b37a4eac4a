//! Alerting System
//!
//! Provides throttled notification channels for detected objects:
//! synthesized tones, spoken announcements, and a custom audio clip with a
//! fallback chain down to the synthesized tone.

mod engine;
mod manager;
mod output;
mod speech;
mod throttle;
mod tone;

pub use engine::{decode_wav, AudioClip, AudioEngine, ClipStore, FsClipStore, HeadlessAudioEngine};
pub use manager::{AlertConfig, AlertManager, AlertSink, AlertStats, ClipOutcome, NoAlerts};
#[cfg(feature = "device-audio")]
pub use output::DeviceAudioEngine;
pub use output::Mixer;
pub use speech::{detection_phrase, EspeakSpeech, NoSpeech, SpeechSynth, Utterance};
pub use throttle::Throttle;
pub use tone::{synthesize, ToneSpec, Waveform};

use thiserror::Error;

/// Errors on the audio channels
#[derive(Debug, Clone, Error)]
pub enum AudioError {
    #[error("Failed to fetch audio from {path}: {reason}")]
    Fetch { path: String, reason: String },
    #[error("Audio decode failed: {0}")]
    Decode(String),
    #[error("Playback failed: {0}")]
    Playback(String),
    #[error("Audio output device unavailable: {0}")]
    Device(String),
}

/// Errors from the speech facility
#[derive(Debug, Clone, Error)]
pub enum SpeechError {
    #[error("Speech synthesis not supported")]
    Unsupported,
    #[error("Speech engine error: {0}")]
    Engine(String),
}
