//! Scheduler configuration

use model_adapter::ModelVariant;
use prediction_filter::clamp_confidence;
use serde::{Deserialize, Serialize};

/// Shortest allowed tick interval
pub const MIN_INTERVAL_MS: u64 = 10;

/// Tick interval for a target rate: `max(10, 1000 / fps)`
pub fn interval_ms(target_fps: u32) -> u64 {
    (1000 / target_fps.max(1) as u64).max(MIN_INTERVAL_MS)
}

/// Configuration for the detection scheduler
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Model variant loaded on startup
    pub variant: ModelVariant,
    /// Minimum detection score (clamped to [0.1, 0.95])
    pub confidence_threshold: f32,
    /// Target detection cycles per second
    pub target_fps: u32,
    /// Upper bound on detections requested from the model
    pub max_results: Option<usize>,
    /// Enter `Detecting` as soon as the initial load succeeds
    pub auto_start: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            variant: ModelVariant::Lite,
            confidence_threshold: 0.6,
            target_fps: 30,
            max_results: Some(20),
            auto_start: true,
        }
    }
}

impl SchedulerConfig {
    /// Clamp every field into its supported range
    pub fn normalized(mut self) -> Self {
        self.confidence_threshold = clamp_confidence(self.confidence_threshold);
        self.target_fps = self.target_fps.max(1);
        self
    }

    pub fn interval_ms(&self) -> u64 {
        interval_ms(self.target_fps)
    }
}
