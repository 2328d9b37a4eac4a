//! Per-cycle detection set

use serde::Serialize;
use vision_core::{Detection, ObjectClass};

/// Class → count mapping in first-encountered order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ClassCounts(Vec<(ObjectClass, usize)>);

impl ClassCounts {
    pub(crate) fn increment(&mut self, class: &ObjectClass) {
        match self.0.iter_mut().find(|(c, _)| c == class) {
            Some((_, count)) => *count += 1,
            None => self.0.push((class.clone(), 1)),
        }
    }

    pub fn get(&self, class: &ObjectClass) -> usize {
        self.0
            .iter()
            .find(|(c, _)| c == class)
            .map(|(_, n)| *n)
            .unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ObjectClass, usize)> {
        self.0.iter().map(|(c, n)| (c, *n))
    }

    /// Number of distinct classes
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Sum of all counts
    pub fn total(&self) -> usize {
        self.0.iter().map(|(_, n)| n).sum()
    }

    /// The `n` most frequent classes; equal counts keep first-encountered order
    pub fn top(&self, n: usize) -> Vec<(ObjectClass, usize)> {
        let mut ranked = self.0.clone();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked.truncate(n);
        ranked
    }
}

/// Filtered detections for one cycle plus derived class counts
#[derive(Debug, Clone, Default, Serialize)]
pub struct DetectionSet {
    detections: Vec<Detection>,
    counts: ClassCounts,
}

impl DetectionSet {
    pub(crate) fn from_filtered(detections: Vec<Detection>) -> Self {
        let counts = crate::class_counts(&detections);
        Self { detections, counts }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn detections(&self) -> &[Detection] {
        &self.detections
    }

    pub fn class_counts(&self) -> &ClassCounts {
        &self.counts
    }

    pub fn count_of(&self, class: &ObjectClass) -> usize {
        self.counts.get(class)
    }

    pub fn len(&self) -> usize {
        self.detections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.detections.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Detection> {
        self.detections.iter()
    }
}

impl<'a> IntoIterator for &'a DetectionSet {
    type Item = &'a Detection;
    type IntoIter = std::slice::Iter<'a, Detection>;

    fn into_iter(self) -> Self::IntoIter {
        self.detections.iter()
    }
}
