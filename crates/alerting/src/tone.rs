//! Tone parameters per class and waveform synthesis

use serde::{Deserialize, Serialize};
use std::f32::consts::PI;
use vision_core::ObjectClass;

/// Linear attack before the exponential decay
pub const ATTACK_MS: u32 = 10;
/// Level the decay ramps down to at the end of the tone
pub const RELEASE_FLOOR: f32 = 0.01;

/// Oscillator shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Waveform {
    Sine,
    Square,
    Triangle,
    Sawtooth,
}

impl Waveform {
    /// Sample the waveform at `phase` in [0, 1)
    pub fn sample(&self, phase: f32) -> f32 {
        match self {
            Waveform::Sine => (2.0 * PI * phase).sin(),
            Waveform::Square => {
                if phase < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            Waveform::Triangle => 1.0 - 4.0 * (phase - 0.5).abs(),
            Waveform::Sawtooth => 2.0 * phase - 1.0,
        }
    }
}

/// Oscillator settings for one alert tone
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ToneSpec {
    pub frequency_hz: f32,
    pub duration_ms: u32,
    pub waveform: Waveform,
}

impl ToneSpec {
    pub const DEFAULT: ToneSpec = ToneSpec {
        frequency_hz: 500.0,
        duration_ms: 200,
        waveform: Waveform::Sine,
    };

    pub fn for_class(class: &ObjectClass) -> Self {
        let (frequency_hz, duration_ms, waveform) = match class {
            ObjectClass::Person => (800.0, 500, Waveform::Sine),
            ObjectClass::Car => (400.0, 300, Waveform::Square),
            ObjectClass::Truck => (300.0, 400, Waveform::Square),
            ObjectClass::Motorcycle => (600.0, 200, Waveform::Triangle),
            ObjectClass::Bicycle => (1000.0, 200, Waveform::Sine),
            _ => return Self::DEFAULT,
        };
        Self {
            frequency_hz,
            duration_ms,
            waveform,
        }
    }
}

/// Gain envelope at `t_ms`: linear ramp to `gain`, then exponential decay to the floor
fn envelope(t_ms: f32, duration_ms: f32, gain: f32) -> f32 {
    if gain <= 0.0 {
        return 0.0;
    }
    let attack = (ATTACK_MS as f32).min(duration_ms);
    if t_ms < attack {
        return gain * t_ms / attack;
    }
    let decay_span = (duration_ms - attack).max(f32::EPSILON);
    let progress = ((t_ms - attack) / decay_span).clamp(0.0, 1.0);
    let floor = RELEASE_FLOOR.min(gain);
    gain * (floor / gain).powf(progress)
}

/// Render a tone to mono PCM samples in [-1, 1]
pub fn synthesize(tone: &ToneSpec, gain: f32, sample_rate: u32) -> Vec<f32> {
    let gain = gain.clamp(0.0, 1.0);
    let total = (tone.duration_ms as u64 * sample_rate as u64 / 1000) as usize;
    let duration_ms = tone.duration_ms as f32;
    let rate = sample_rate as f32;

    (0..total)
        .map(|i| {
            let t = i as f32 / rate;
            let phase = (t * tone.frequency_hz).fract();
            tone.waveform.sample(phase) * envelope(t * 1000.0, duration_ms, gain)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_table() {
        assert_eq!(ToneSpec::for_class(&ObjectClass::Person).frequency_hz, 800.0);
        assert_eq!(ToneSpec::for_class(&ObjectClass::Truck).waveform, Waveform::Square);
        assert_eq!(ToneSpec::for_class(&ObjectClass::Motorcycle).duration_ms, 200);
        assert_eq!(ToneSpec::for_class(&ObjectClass::Dog), ToneSpec::DEFAULT);
        assert_eq!(
            ToneSpec::for_class(&ObjectClass::Other("ufo".into())),
            ToneSpec::DEFAULT
        );
    }

    #[test]
    fn test_synthesized_length_and_bounds() {
        let tone = ToneSpec::for_class(&ObjectClass::Car);
        let samples = synthesize(&tone, 0.5, 8000);

        assert_eq!(samples.len(), 2400);
        assert_eq!(samples[0], 0.0);
        assert!(samples.iter().all(|s| s.abs() <= 0.5 + 1e-6));
    }

    #[test]
    fn test_envelope_decays_to_floor() {
        assert!((envelope(10.0, 300.0, 0.5) - 0.5).abs() < 1e-6);
        assert!((envelope(300.0, 300.0, 0.5) - RELEASE_FLOOR).abs() < 1e-6);
        assert!(envelope(150.0, 300.0, 0.5) < 0.5);
    }

    #[test]
    fn test_zero_gain_is_silent() {
        let samples = synthesize(&ToneSpec::DEFAULT, 0.0, 8000);
        assert!(samples.iter().all(|s| *s == 0.0));
    }

    #[test]
    fn test_waveform_shapes() {
        assert_eq!(Waveform::Square.sample(0.25), 1.0);
        assert_eq!(Waveform::Square.sample(0.75), -1.0);
        assert_eq!(Waveform::Triangle.sample(0.5), 1.0);
        assert_eq!(Waveform::Sawtooth.sample(0.0), -1.0);
        assert!(Waveform::Sine.sample(0.25) > 0.99);
    }
}
