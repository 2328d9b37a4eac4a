//! Alert Manager Implementation

use crate::engine::{AudioClip, AudioEngine, ClipStore};
use crate::speech::{detection_phrase, SpeechSynth, Utterance};
use crate::throttle::Throttle;
use crate::tone::{synthesize, ToneSpec};
use crate::AudioError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use vision_core::{Clock, ObjectClass};

const CLIP_KEY: &str = "person-clip";

/// Alert configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    /// Global switch for every channel
    pub enabled: bool,
    /// Output level, clamped to [0, 1]
    pub volume: f32,
    /// Tone cooldown for the person key (ms)
    pub person_cooldown_ms: u64,
    /// Tone cooldown for every other class key (ms)
    pub vehicle_cooldown_ms: u64,
    /// Speech cooldown per class (ms)
    pub speech_cooldown_ms: u64,
    /// Custom clip cooldown (ms)
    pub clip_cooldown_ms: u64,
    /// Path of the custom clip inside the clip store
    pub custom_clip_path: String,
    /// Preload budget for the custom clip (ms)
    pub preload_timeout_ms: u64,
    /// Sample rate used for synthesized tones
    pub sample_rate: u32,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            volume: 0.5,
            person_cooldown_ms: 2000,
            vehicle_cooldown_ms: 1500,
            speech_cooldown_ms: 3000,
            clip_cooldown_ms: 2000,
            custom_clip_path: "person-alert.wav".to_string(),
            preload_timeout_ms: 3000,
            sample_rate: 44_100,
        }
    }
}

/// Result of a custom-clip trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipOutcome {
    Disabled,
    Suppressed,
    /// Played a new instance of the preloaded clip
    Preloaded,
    /// Fetched, decoded, and played the clip on demand
    Fresh,
    /// Both clip paths failed or were disabled; played the person tone
    ToneFallback,
}

#[derive(Debug, Clone)]
enum ClipState {
    NotLoaded,
    Ready(AudioClip),
    /// Preload failed; only the tone fallback is used for this session
    Unavailable,
}

/// Counters for fired and suppressed alerts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AlertStats {
    pub tones: usize,
    pub utterances: usize,
    pub clips: usize,
    pub suppressed: usize,
}

/// Receiver of per-detection alert triggers
pub trait AlertSink {
    fn person_detected(&mut self);
    fn vehicle_detected(&mut self, class: &ObjectClass);
    /// `count` is the number of detections of `class` in the current cycle
    fn announce(&mut self, class: &ObjectClass, count: usize);
}

/// Sink that ignores every trigger
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAlerts;

impl AlertSink for NoAlerts {
    fn person_detected(&mut self) {}
    fn vehicle_detected(&mut self, _class: &ObjectClass) {}
    fn announce(&mut self, _class: &ObjectClass, _count: usize) {}
}

/// Alert manager for throttled multi-channel notification
pub struct AlertManager {
    config: AlertConfig,
    engine: Arc<dyn AudioEngine>,
    speech: Arc<dyn SpeechSynth>,
    store: Arc<dyn ClipStore>,
    clock: Arc<dyn Clock>,
    throttle: Throttle,
    clip: ClipState,
    sounds: HashMap<String, AudioClip>,
    stats: AlertStats,
}

impl AlertManager {
    /// Create a new alert manager
    pub fn new(
        mut config: AlertConfig,
        engine: Arc<dyn AudioEngine>,
        speech: Arc<dyn SpeechSynth>,
        store: Arc<dyn ClipStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        config.volume = clamp_volume(config.volume);
        info!("Creating alert manager with config: {:?}", config);
        Self {
            config,
            engine,
            speech,
            store,
            clock,
            throttle: Throttle::new(),
            clip: ClipState::NotLoaded,
            sounds: HashMap::new(),
            stats: AlertStats::default(),
        }
    }

    /// Load and decode the custom clip once, within the preload timeout.
    /// Failure disables both clip paths for the session.
    pub async fn preload(&mut self) -> bool {
        let store = Arc::clone(&self.store);
        let engine = Arc::clone(&self.engine);
        let path = self.config.custom_clip_path.clone();
        let budget = Duration::from_millis(self.config.preload_timeout_ms);

        let load = tokio::task::spawn_blocking(move || -> Result<AudioClip, AudioError> {
            let bytes = store.fetch(&path)?;
            engine.decode(&bytes)
        });

        let outcome = match tokio::time::timeout(budget, load).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => Err(AudioError::Decode(format!("preload task failed: {}", e))),
            Err(_) => {
                warn!("Custom audio preload timed out after {}ms", budget.as_millis());
                self.clip = ClipState::Unavailable;
                return false;
            }
        };

        match outcome {
            Ok(clip) => {
                info!("Custom audio clip preloaded ({}ms)", clip.duration_ms());
                self.clip = ClipState::Ready(clip);
                true
            }
            Err(e) => {
                warn!("Custom audio clip not available, will use fallback tones: {}", e);
                self.clip = ClipState::Unavailable;
                false
            }
        }
    }

    /// Whether the preloaded clip is ready for playback
    pub fn clip_ready(&self) -> bool {
        matches!(self.clip, ClipState::Ready(_))
    }

    fn tone_cooldown(&self, class: &ObjectClass) -> u64 {
        if class.is_person() {
            self.config.person_cooldown_ms
        } else {
            self.config.vehicle_cooldown_ms
        }
    }

    fn try_fire(&mut self, key: &str, cooldown_ms: u64) -> bool {
        let now = self.clock.now_ms();
        if self.throttle.try_fire(key, cooldown_ms, now) {
            true
        } else {
            debug!("Alert suppressed: {} in cooldown period", key);
            self.stats.suppressed += 1;
            false
        }
    }

    /// Synthesize and play the class tone, bypassing cooldowns
    fn play_tone(&mut self, class: &ObjectClass) -> bool {
        let tone = ToneSpec::for_class(class);
        let samples = synthesize(&tone, self.config.volume, self.config.sample_rate);
        let clip = AudioClip::mono(samples, self.config.sample_rate);
        match self.engine.play(&clip, 1.0) {
            Ok(()) => {
                debug!("Tone for {}: {} Hz {:?}", class, tone.frequency_hz, tone.waveform);
                self.stats.tones += 1;
                true
            }
            Err(e) => {
                warn!("Failed to play tone for {}: {}", class, e);
                false
            }
        }
    }

    /// Throttled class tone (person 2000ms, other classes 1500ms by default)
    pub fn trigger_tone(&mut self, class: &ObjectClass) -> bool {
        if !self.config.enabled {
            return false;
        }
        let key = format!("{}-tone", class);
        if !self.try_fire(&key, self.tone_cooldown(class)) {
            return false;
        }
        self.play_tone(class)
    }

    /// Throttled spoken announcement; silently does nothing when speech is unsupported
    pub fn trigger_speech(&mut self, class: &ObjectClass, count: usize) -> bool {
        if !self.config.enabled || !self.speech.is_supported() {
            return false;
        }
        let key = format!("{}-speech", class);
        if !self.try_fire(&key, self.config.speech_cooldown_ms) {
            return false;
        }

        let utterance = Utterance::new(detection_phrase(class, count), self.config.volume);
        match self.speech.speak(&utterance) {
            Ok(()) => {
                self.stats.utterances += 1;
                true
            }
            Err(e) => {
                debug!("Speech synthesis failed: {}", e);
                false
            }
        }
    }

    /// Throttled custom clip: preloaded instance, then a fresh load, then the person tone
    pub fn trigger_person_clip(&mut self) -> ClipOutcome {
        if !self.config.enabled {
            return ClipOutcome::Disabled;
        }
        if !self.try_fire(CLIP_KEY, self.config.clip_cooldown_ms) {
            return ClipOutcome::Suppressed;
        }

        let clip_paths_enabled = match &self.clip {
            ClipState::Ready(clip) => {
                let clip = clip.clone();
                match self.engine.play(&clip, self.config.volume) {
                    Ok(()) => {
                        self.stats.clips += 1;
                        return ClipOutcome::Preloaded;
                    }
                    Err(e) => {
                        warn!("Failed to play cached custom audio: {}", e);
                        true
                    }
                }
            }
            ClipState::NotLoaded => true,
            ClipState::Unavailable => false,
        };

        if clip_paths_enabled {
            match self.play_fresh_clip() {
                Ok(()) => {
                    self.stats.clips += 1;
                    return ClipOutcome::Fresh;
                }
                Err(e) => warn!("All custom audio attempts failed, using fallback tone: {}", e),
            }
        }

        self.play_tone(&ObjectClass::Person);
        ClipOutcome::ToneFallback
    }

    fn play_fresh_clip(&self) -> Result<(), AudioError> {
        let bytes = self.store.fetch(&self.config.custom_clip_path)?;
        let clip = self.engine.decode(&bytes)?;
        self.engine.play(&clip, self.config.volume)
    }

    /// Decode and cache a named sound
    pub fn load_sound(&mut self, name: &str, path: &str) -> Result<(), AudioError> {
        let bytes = self.store.fetch(path)?;
        let clip = self.engine.decode(&bytes)?;
        debug!("Loaded sound {} ({}ms)", name, clip.duration_ms());
        self.sounds.insert(name.to_string(), clip);
        Ok(())
    }

    /// Play a cached sound; unknown names and a disabled manager do nothing
    pub fn play_sound(&mut self, name: &str) -> bool {
        if !self.config.enabled {
            return false;
        }
        let Some(clip) = self.sounds.get(name) else {
            return false;
        };
        match self.engine.play(clip, self.config.volume) {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to play sound {}: {}", name, e);
                false
            }
        }
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.config.volume = clamp_volume(volume);
    }

    pub fn volume(&self) -> f32 {
        self.config.volume
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        info!("Alerts {}", if enabled { "enabled" } else { "disabled" });
        self.config.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    pub fn stats(&self) -> AlertStats {
        self.stats
    }

    /// Release loaded buffers and the audio device
    pub fn dispose(&mut self) {
        info!("Disposing alert manager");
        self.sounds.clear();
        self.clip = ClipState::NotLoaded;
        self.throttle.clear();
        self.engine.close();
    }
}

impl AlertSink for AlertManager {
    fn person_detected(&mut self) {
        self.trigger_person_clip();
    }

    fn vehicle_detected(&mut self, class: &ObjectClass) {
        self.trigger_tone(class);
    }

    fn announce(&mut self, class: &ObjectClass, count: usize) {
        self.trigger_speech(class, count);
    }
}

fn clamp_volume(volume: f32) -> f32 {
    if volume.is_nan() {
        0.0
    } else {
        volume.clamp(0.0, 1.0)
    }
}
