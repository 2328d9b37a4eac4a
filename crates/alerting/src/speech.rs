//! Speech facility

use crate::SpeechError;
use std::process::{Command, Stdio};
use tracing::debug;
use vision_core::ObjectClass;

/// Speech rate used for announcements
pub const SPEECH_RATE: f32 = 1.2;
/// Speech pitch used for announcements
pub const SPEECH_PITCH: f32 = 1.0;

/// One spoken announcement
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub text: String,
    /// 0.0 to 1.0
    pub volume: f32,
    /// 1.0 is the platform's normal rate
    pub rate: f32,
    /// 1.0 is the platform's normal pitch (range 0.0 to 2.0)
    pub pitch: f32,
}

impl Utterance {
    pub fn new(text: impl Into<String>, volume: f32) -> Self {
        Self {
            text: text.into(),
            volume,
            rate: SPEECH_RATE,
            pitch: SPEECH_PITCH,
        }
    }
}

/// "person detected" / "3 cars detected"
pub fn detection_phrase(class: &ObjectClass, count: usize) -> String {
    if count > 1 {
        format!("{} {}s detected", count, class)
    } else {
        format!("{} detected", class)
    }
}

/// Platform text-to-speech
pub trait SpeechSynth: Send + Sync {
    fn is_supported(&self) -> bool;

    /// Queue an utterance without waiting for it to finish
    fn speak(&self, utterance: &Utterance) -> Result<(), SpeechError>;
}

/// Speech facility for platforms without one
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSpeech;

impl SpeechSynth for NoSpeech {
    fn is_supported(&self) -> bool {
        false
    }

    fn speak(&self, _utterance: &Utterance) -> Result<(), SpeechError> {
        Err(SpeechError::Unsupported)
    }
}

/// espeak-ng driven through its command line
#[derive(Debug, Clone)]
pub struct EspeakSpeech {
    program: String,
    available: bool,
}

impl EspeakSpeech {
    pub fn new() -> Self {
        Self::with_program("espeak-ng")
    }

    pub fn with_program(program: impl Into<String>) -> Self {
        let program = program.into();
        let available = Command::new(&program)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false);
        debug!("Speech program {} available: {}", program, available);
        Self { program, available }
    }

    fn sanitize(text: &str) -> String {
        text.chars()
            .filter(|c| !c.is_control() && !matches!(c, ';' | '|' | '&' | '$' | '`' | '<' | '>'))
            .take(500)
            .collect()
    }
}

impl Default for EspeakSpeech {
    fn default() -> Self {
        Self::new()
    }
}

impl SpeechSynth for EspeakSpeech {
    fn is_supported(&self) -> bool {
        self.available
    }

    fn speak(&self, utterance: &Utterance) -> Result<(), SpeechError> {
        if !self.available {
            return Err(SpeechError::Unsupported);
        }

        let text = Self::sanitize(&utterance.text);
        if text.trim().is_empty() {
            return Err(SpeechError::Engine("empty utterance".to_string()));
        }

        // espeak-ng: amplitude 0-200, speed in words per minute (175 normal), pitch 0-99 (50 normal)
        let amplitude = (utterance.volume.clamp(0.0, 1.0) * 200.0).round() as u32;
        let speed = (175.0 * utterance.rate.max(0.1)).round() as u32;
        let pitch = (utterance.pitch.clamp(0.0, 2.0) * 50.0).round().min(99.0) as u32;

        let mut child = Command::new(&self.program)
            .arg("-a")
            .arg(amplitude.to_string())
            .arg("-s")
            .arg(speed.to_string())
            .arg("-p")
            .arg(pitch.to_string())
            .arg(&text)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| SpeechError::Engine(format!("failed to run {}: {}", self.program, e)))?;

        // reap in the background so playback never blocks the caller
        std::thread::spawn(move || {
            let _ = child.wait();
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detection_phrase() {
        assert_eq!(detection_phrase(&ObjectClass::Person, 1), "person detected");
        assert_eq!(detection_phrase(&ObjectClass::Car, 3), "3 cars detected");
        assert_eq!(detection_phrase(&ObjectClass::Bus, 0), "bus detected");
    }

    #[test]
    fn test_utterance_defaults() {
        let u = Utterance::new("hello", 0.4);
        assert_eq!(u.rate, 1.2);
        assert_eq!(u.pitch, 1.0);
    }

    #[test]
    fn test_missing_program_is_unsupported() {
        let speech = EspeakSpeech::with_program("definitely-not-a-speech-binary");
        assert!(!speech.is_supported());
        assert!(matches!(
            speech.speak(&Utterance::new("x", 1.0)),
            Err(SpeechError::Unsupported)
        ));
    }

    #[test]
    fn test_sanitize_strips_shell_characters() {
        assert_eq!(EspeakSpeech::sanitize("car; rm -rf `x`\n"), "car rm -rf x");
    }
}
