//! Filtering and grouping primitives

use crate::{ClassCounts, DetectionSet};
use tracing::debug;
use vision_core::{Detection, ObjectClass};

/// Drop every detection scoring below `threshold` and derive class counts
///
/// Applied even though the model was asked for the same threshold:
/// backends are not guaranteed to honor it.
pub fn filter(raw: Vec<Detection>, threshold: f32) -> DetectionSet {
    let before = raw.len();
    let kept: Vec<Detection> = raw.into_iter().filter(|d| d.score >= threshold).collect();
    if kept.len() != before {
        debug!(
            "Dropped {} of {} detections below {:.2}",
            before - kept.len(),
            before,
            threshold
        );
    }
    DetectionSet::from_filtered(kept)
}

/// Single-pass class → count mapping
pub fn class_counts(detections: &[Detection]) -> ClassCounts {
    let mut counts = ClassCounts::default();
    for detection in detections {
        counts.increment(&detection.class);
    }
    counts
}

/// Copy sorted by score, highest first; equal scores keep their original order
pub fn sort_by_confidence_descending(detections: &[Detection]) -> Vec<Detection> {
    let mut sorted = detections.to_vec();
    sorted.sort_by(|a, b| b.score.total_cmp(&a.score));
    sorted
}

/// Group detections by class, classes in first-encountered order
pub fn group_by_class(detections: &[Detection]) -> Vec<(ObjectClass, Vec<Detection>)> {
    let mut groups: Vec<(ObjectClass, Vec<Detection>)> = Vec::new();
    for detection in detections {
        match groups.iter_mut().find(|(class, _)| *class == detection.class) {
            Some((_, members)) => members.push(detection.clone()),
            None => groups.push((detection.class.clone(), vec![detection.clone()])),
        }
    }
    groups
}

/// Keep only detections whose class is in `allowed`
pub fn filter_by_class(detections: &[Detection], allowed: &[ObjectClass]) -> Vec<Detection> {
    detections
        .iter()
        .filter(|d| allowed.contains(&d.class))
        .cloned()
        .collect()
}
