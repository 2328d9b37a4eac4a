//! Audio engine contract and clip loading

use crate::AudioError;
use std::io::Cursor;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Decoded, playable audio. Clones share the sample buffer, so the same clip
/// can be played as several overlapping instances.
#[derive(Debug, Clone)]
pub struct AudioClip {
    samples: Arc<[f32]>,
    sample_rate: u32,
    channels: u16,
}

impl AudioClip {
    pub fn new(samples: Vec<f32>, sample_rate: u32, channels: u16) -> Self {
        Self {
            samples: samples.into(),
            sample_rate,
            channels: channels.max(1),
        }
    }

    pub fn mono(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self::new(samples, sample_rate, 1)
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn duration_ms(&self) -> u64 {
        if self.sample_rate == 0 {
            return 0;
        }
        let frames = self.samples.len() as u64 / self.channels as u64;
        frames * 1000 / self.sample_rate as u64
    }
}

/// Audio output device
///
/// `play` is fire-and-forget: it starts a new playback instance and returns
/// without waiting for completion.
pub trait AudioEngine: Send + Sync {
    /// Decode fetched bytes into a playable clip
    fn decode(&self, bytes: &[u8]) -> Result<AudioClip, AudioError> {
        decode_wav(bytes)
    }

    fn play(&self, clip: &AudioClip, gain: f32) -> Result<(), AudioError>;

    /// Release device resources
    fn close(&self) {}
}

/// Decode a RIFF/WAVE buffer into normalized f32 samples
pub fn decode_wav(bytes: &[u8]) -> Result<AudioClip, AudioError> {
    let reader =
        hound::WavReader::new(Cursor::new(bytes)).map_err(|e| AudioError::Decode(e.to_string()))?;
    let spec = reader.spec();

    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<Result<_, _>>()
            .map_err(|e| AudioError::Decode(e.to_string()))?,
        hound::SampleFormat::Int => {
            let scale = (1u64 << (spec.bits_per_sample.clamp(1, 32) - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<Result<_, _>>()
                .map_err(|e| AudioError::Decode(e.to_string()))?
        }
    };

    Ok(AudioClip::new(samples, spec.sample_rate, spec.channels))
}

/// Where clip bytes come from
pub trait ClipStore: Send + Sync {
    fn fetch(&self, path: &str) -> Result<Vec<u8>, AudioError>;
}

/// Clip store reading from a local asset directory
#[derive(Debug, Clone)]
pub struct FsClipStore {
    root: PathBuf,
}

impl FsClipStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ClipStore for FsClipStore {
    fn fetch(&self, path: &str) -> Result<Vec<u8>, AudioError> {
        let full = self.root.join(path.trim_start_matches('/'));
        std::fs::read(&full).map_err(|e| AudioError::Fetch {
            path: full.display().to_string(),
            reason: e.to_string(),
        })
    }
}

/// Engine without an output device; playback is logged and counted
#[derive(Debug, Default)]
pub struct HeadlessAudioEngine {
    played: AtomicUsize,
}

impl HeadlessAudioEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn played(&self) -> usize {
        self.played.load(Ordering::SeqCst)
    }
}

impl AudioEngine for HeadlessAudioEngine {
    fn play(&self, clip: &AudioClip, gain: f32) -> Result<(), AudioError> {
        self.played.fetch_add(1, Ordering::SeqCst);
        debug!(
            "Playing {}ms clip ({} Hz, {} ch) at gain {:.2}",
            clip.duration_ms(),
            clip.sample_rate(),
            clip.channels(),
            gain
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) fn wav_bytes(samples: &[i16], sample_rate: u32) -> Vec<u8> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            for s in samples {
                writer.write_sample(*s).unwrap();
            }
            writer.finalize().unwrap();
        }
        cursor.into_inner()
    }

    #[test]
    fn test_decode_wav_normalizes() {
        let bytes = wav_bytes(&[0, 16384, -32768], 8000);
        let clip = decode_wav(&bytes).unwrap();

        assert_eq!(clip.sample_rate(), 8000);
        assert_eq!(clip.samples(), &[0.0, 0.5, -1.0]);
    }

    #[test]
    fn test_decode_garbage_fails() {
        assert!(matches!(decode_wav(b"not a wav"), Err(AudioError::Decode(_))));
    }

    #[test]
    fn test_clip_clones_share_buffer() {
        let clip = AudioClip::mono(vec![0.0; 8000], 8000);
        let copy = clip.clone();
        assert!(std::ptr::eq(clip.samples().as_ptr(), copy.samples().as_ptr()));
        assert_eq!(copy.duration_ms(), 1000);
    }

    #[test]
    fn test_fs_store_missing_file() {
        let store = FsClipStore::new("/definitely/not/here");
        assert!(matches!(store.fetch("/clip.wav"), Err(AudioError::Fetch { .. })));
    }
}
