//! Playback on the default output device
//!
//! Every `play` adds a voice to a shared [`Mixer`]; the device callback sums
//! the active voices, so cloned clips overlap instead of queueing.

use crate::engine::AudioClip;
#[cfg(feature = "device-audio")]
pub use device::DeviceAudioEngine;

struct Voice {
    clip: AudioClip,
    position: f64,
    step: f64,
    gain: f32,
}

impl Voice {
    fn frames(&self) -> usize {
        self.clip.samples().len() / self.clip.channels() as usize
    }

    fn finished(&self) -> bool {
        self.position as usize >= self.frames()
    }
}

/// Sums active clips into interleaved output frames
pub struct Mixer {
    voices: Vec<Voice>,
    sample_rate: u32,
    channels: u16,
}

impl Mixer {
    pub fn new(sample_rate: u32, channels: u16) -> Self {
        Self {
            voices: Vec::new(),
            sample_rate: sample_rate.max(1),
            channels: channels.max(1),
        }
    }

    /// Start a new playback instance of `clip`
    pub fn add(&mut self, clip: AudioClip, gain: f32) {
        let step = clip.sample_rate() as f64 / self.sample_rate as f64;
        self.voices.push(Voice {
            clip,
            position: 0.0,
            step,
            gain: gain.clamp(0.0, 1.0),
        });
    }

    /// Voices still playing
    pub fn active(&self) -> usize {
        self.voices.len()
    }

    pub fn clear(&mut self) {
        self.voices.clear();
    }

    /// Overwrite `out` with the next frames of every voice; finished voices are dropped
    pub fn fill(&mut self, out: &mut [f32]) {
        out.fill(0.0);
        let channels = self.channels as usize;

        for voice in &mut self.voices {
            let source_channels = voice.clip.channels() as usize;
            let frames = voice.frames();
            for frame in out.chunks_mut(channels) {
                let index = voice.position as usize;
                if index >= frames {
                    break;
                }
                let base = index * source_channels;
                for (c, slot) in frame.iter_mut().enumerate() {
                    let source = c.min(source_channels - 1);
                    *slot += voice.clip.samples()[base + source] * voice.gain;
                }
                voice.position += voice.step;
            }
        }

        self.voices.retain(|voice| !voice.finished());
        for sample in out.iter_mut() {
            *sample = sample.clamp(-1.0, 1.0);
        }
    }
}

#[cfg(feature = "device-audio")]
mod device {
    use super::Mixer;
    use crate::engine::{AudioClip, AudioEngine};
    use crate::AudioError;
    use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
    use cpal::{FromSample, SampleFormat, SizedSample, StreamConfig};
    use std::sync::mpsc;
    use std::sync::{Arc, Mutex};
    use tracing::{debug, info, warn};

    type Opened = Result<(Arc<Mutex<Mixer>>, String), AudioError>;

    /// Engine playing through the host's default output device
    ///
    /// The cpal stream is not `Send`, so it lives on its own thread until
    /// [`close`](AudioEngine::close) or drop.
    pub struct DeviceAudioEngine {
        mixer: Arc<Mutex<Mixer>>,
        shutdown: Mutex<Option<mpsc::Sender<()>>>,
        device_name: String,
    }

    impl DeviceAudioEngine {
        /// Open the default output device, failing when the host has none
        pub fn open_default() -> Result<Self, AudioError> {
            let (opened_tx, opened_rx) = mpsc::channel::<Opened>();
            let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

            std::thread::Builder::new()
                .name("audio-output".to_string())
                .spawn(move || {
                    let stream = match open_stream() {
                        Ok((stream, mixer, name)) => {
                            let _ = opened_tx.send(Ok((mixer, name)));
                            stream
                        }
                        Err(e) => {
                            let _ = opened_tx.send(Err(e));
                            return;
                        }
                    };
                    // returns on close or when the engine is dropped
                    let _ = shutdown_rx.recv();
                    drop(stream);
                    debug!("Audio output stream closed");
                })
                .map_err(|e| AudioError::Device(format!("failed to spawn output thread: {}", e)))?;

            let (mixer, device_name) = opened_rx
                .recv()
                .map_err(|_| AudioError::Device("output thread exited".to_string()))??;
            info!("Audio output on {}", device_name);

            Ok(Self {
                mixer,
                shutdown: Mutex::new(Some(shutdown_tx)),
                device_name,
            })
        }

        pub fn device_name(&self) -> &str {
            &self.device_name
        }
    }

    fn open_stream() -> Result<(cpal::Stream, Arc<Mutex<Mixer>>, String), AudioError> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| AudioError::Device("no default output device".to_string()))?;
        let name = device.name().unwrap_or_else(|_| "unknown device".to_string());

        let supported = device
            .default_output_config()
            .map_err(|e| AudioError::Device(format!("no output config: {}", e)))?;
        let config = supported.config();
        let mixer = Arc::new(Mutex::new(Mixer::new(
            config.sample_rate.0,
            config.channels,
        )));

        let shared = Arc::clone(&mixer);
        let stream = match supported.sample_format() {
            SampleFormat::F32 => build_stream::<f32>(&device, &config, shared),
            SampleFormat::I16 => build_stream::<i16>(&device, &config, shared),
            SampleFormat::U16 => build_stream::<u16>(&device, &config, shared),
            other => {
                return Err(AudioError::Device(format!(
                    "unsupported sample format {:?}",
                    other
                )))
            }
        }
        .map_err(|e| AudioError::Device(format!("failed to build stream: {}", e)))?;

        stream
            .play()
            .map_err(|e| AudioError::Device(format!("failed to start stream: {}", e)))?;
        debug!(
            "Output stream {} Hz, {} channel(s)",
            config.sample_rate.0, config.channels
        );
        Ok((stream, mixer, name))
    }

    fn build_stream<T>(
        device: &cpal::Device,
        config: &StreamConfig,
        mixer: Arc<Mutex<Mixer>>,
    ) -> Result<cpal::Stream, cpal::BuildStreamError>
    where
        T: SizedSample + FromSample<f32>,
    {
        let mut scratch: Vec<f32> = Vec::new();
        device.build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                scratch.resize(data.len(), 0.0);
                match mixer.lock() {
                    Ok(mut mixer) => mixer.fill(&mut scratch),
                    Err(_) => scratch.fill(0.0),
                }
                for (out, sample) in data.iter_mut().zip(&scratch) {
                    *out = T::from_sample(*sample);
                }
            },
            |err| warn!("Audio output stream error: {}", err),
            None,
        )
    }

    impl AudioEngine for DeviceAudioEngine {
        fn play(&self, clip: &AudioClip, gain: f32) -> Result<(), AudioError> {
            let mut mixer = self
                .mixer
                .lock()
                .map_err(|_| AudioError::Playback("mixer lock poisoned".to_string()))?;
            mixer.add(clip.clone(), gain);
            Ok(())
        }

        fn close(&self) {
            if let Ok(mut mixer) = self.mixer.lock() {
                mixer.clear();
            }
            if let Ok(mut shutdown) = self.shutdown.lock() {
                if let Some(tx) = shutdown.take() {
                    let _ = tx.send(());
                }
            }
        }
    }

    impl Drop for DeviceAudioEngine {
        fn drop(&mut self) {
            self.close();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlapping_voices_are_summed() {
        let mut mixer = Mixer::new(4, 1);
        let clip = AudioClip::mono(vec![0.25; 4], 4);
        mixer.add(clip.clone(), 1.0);
        mixer.add(clip, 0.5);

        let mut out = [0.0; 2];
        mixer.fill(&mut out);
        assert_eq!(out, [0.375, 0.375]);
        assert_eq!(mixer.active(), 2);
    }

    #[test]
    fn test_finished_voices_are_dropped() {
        let mut mixer = Mixer::new(4, 1);
        mixer.add(AudioClip::mono(vec![0.5, 0.5, 0.5], 4), 1.0);

        let mut out = [1.0; 4];
        mixer.fill(&mut out);
        assert_eq!(out, [0.5, 0.5, 0.5, 0.0]);
        assert_eq!(mixer.active(), 0);
    }

    #[test]
    fn test_mono_clip_fills_every_channel() {
        let mut mixer = Mixer::new(8, 2);
        mixer.add(AudioClip::mono(vec![0.1, 0.2], 8), 1.0);

        let mut out = [0.0; 4];
        mixer.fill(&mut out);
        assert_eq!(out, [0.1, 0.1, 0.2, 0.2]);
    }

    #[test]
    fn test_clip_resampled_to_device_rate() {
        let mut mixer = Mixer::new(8, 1);
        mixer.add(AudioClip::mono(vec![0.1, 0.2], 4), 1.0);

        let mut out = [0.0; 5];
        mixer.fill(&mut out);
        assert_eq!(out, [0.1, 0.1, 0.2, 0.2, 0.0]);
        assert_eq!(mixer.active(), 0);
    }

    #[test]
    fn test_output_is_clamped() {
        let mut mixer = Mixer::new(4, 1);
        for _ in 0..4 {
            mixer.add(AudioClip::mono(vec![0.9], 4), 1.0);
        }

        let mut out = [0.0; 1];
        mixer.fill(&mut out);
        assert_eq!(out, [1.0]);
    }

    #[test]
    fn test_clear_stops_everything() {
        let mut mixer = Mixer::new(4, 1);
        mixer.add(AudioClip::mono(vec![0.5; 16], 4), 1.0);
        mixer.clear();

        let mut out = [1.0; 2];
        mixer.fill(&mut out);
        assert_eq!(out, [0.0, 0.0]);
    }
}
