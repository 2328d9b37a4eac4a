//! Prediction Filtering
//!
//! Thresholds, groups, and ranks raw detections into a per-cycle [`DetectionSet`].

mod filter;
mod preset;
mod set;

pub use filter::{
    class_counts, filter, filter_by_class, group_by_class, sort_by_confidence_descending,
};
pub use preset::PerformancePreset;
pub use set::{ClassCounts, DetectionSet};

/// Lowest accepted confidence threshold
pub const MIN_CONFIDENCE: f32 = 0.1;
/// Highest accepted confidence threshold
pub const MAX_CONFIDENCE: f32 = 0.95;

/// Clamp a requested threshold into the supported range
pub fn clamp_confidence(threshold: f32) -> f32 {
    if threshold.is_nan() {
        return MIN_CONFIDENCE;
    }
    threshold.clamp(MIN_CONFIDENCE, MAX_CONFIDENCE)
}
