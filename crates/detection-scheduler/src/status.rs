//! Published pipeline status

use crate::Phase;
use model_adapter::ModelVariant;
use prediction_filter::DetectionSet;
use serde::Serialize;

/// Snapshot published after every cycle and every phase change
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineStatus {
    pub phase: Phase,
    pub variant: ModelVariant,
    /// Measured cycles per second
    pub fps: u32,
    pub target_fps: u32,
    pub confidence_threshold: f32,
    pub alerts_enabled: bool,
    pub object_count: usize,
    pub person_count: usize,
    /// Class label → count, first-encountered order
    pub class_counts: Vec<(String, usize)>,
    pub detection_latency_ms: u64,
    /// Capture time of the most recent frame sent to the model
    pub last_frame_at_ms: Option<u64>,
    pub last_error: Option<String>,
    pub cycles: u64,
}

impl PipelineStatus {
    pub fn new(variant: ModelVariant, target_fps: u32, confidence_threshold: f32) -> Self {
        Self {
            phase: Phase::Idle,
            variant,
            fps: 0,
            target_fps,
            confidence_threshold,
            alerts_enabled: true,
            object_count: 0,
            person_count: 0,
            class_counts: Vec::new(),
            detection_latency_ms: 0,
            last_frame_at_ms: None,
            last_error: None,
            cycles: 0,
        }
    }

    /// Replace the per-cycle detection fields
    pub fn apply_set(&mut self, set: &DetectionSet) {
        self.object_count = set.len();
        self.person_count = set.iter().filter(|d| d.class.is_person()).count();
        self.class_counts = set
            .class_counts()
            .iter()
            .map(|(class, n)| (class.to_string(), n))
            .collect();
        self.detection_latency_ms = set.iter().map(|d| d.latency_ms).max().unwrap_or(0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vision_core::Detection;

    #[test]
    fn test_apply_set() {
        let set = prediction_filter::filter(
            vec![
                Detection::new("person", 0.9, [0.0, 0.0, 1.0, 1.0]).with_timing(12, 0),
                Detection::new("car", 0.8, [0.0, 0.0, 1.0, 1.0]).with_timing(12, 0),
                Detection::new("person", 0.7, [0.0, 0.0, 1.0, 1.0]).with_timing(12, 0),
            ],
            0.5,
        );
        let mut status = PipelineStatus::new(ModelVariant::Lite, 30, 0.5);
        status.apply_set(&set);

        assert_eq!(status.object_count, 3);
        assert_eq!(status.person_count, 2);
        assert_eq!(
            status.class_counts,
            vec![("person".to_string(), 2), ("car".to_string(), 1)]
        );
        assert_eq!(status.detection_latency_ms, 12);
    }

    #[test]
    fn test_serializes_phase_tag() {
        let status = PipelineStatus::new(ModelVariant::MobilenetV1, 20, 0.65);
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["phase"]["phase"], "idle");
        assert_eq!(json["variant"], "mobilenet_v1");
    }
}
