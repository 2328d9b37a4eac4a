//! Detections produced by the model

use crate::ObjectClass;
use serde::{Deserialize, Serialize};

/// Axis-aligned box in frame pixel space
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn area(&self) -> f32 {
        self.width.max(0.0) * self.height.max(0.0)
    }
}

impl From<[f32; 4]> for BoundingBox {
    fn from([x, y, width, height]: [f32; 4]) -> Self {
        Self::new(x, y, width, height)
    }
}

/// One model output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Object class
    pub class: ObjectClass,
    /// Confidence score (0.0 to 1.0)
    pub score: f32,
    /// Bounding box relative to the frame
    pub bbox: BoundingBox,
    /// Inference latency of the cycle that produced this detection
    pub latency_ms: u64,
    /// When the detection was produced (milliseconds)
    pub timestamp_ms: u64,
}

impl Detection {
    /// Create an untimed detection, as reported by a detector backend
    pub fn new(class: impl Into<ObjectClass>, score: f32, bbox: impl Into<BoundingBox>) -> Self {
        Self {
            class: class.into(),
            score,
            bbox: bbox.into(),
            latency_ms: 0,
            timestamp_ms: 0,
        }
    }

    /// Stamp cycle timing onto the detection
    pub fn with_timing(mut self, latency_ms: u64, timestamp_ms: u64) -> Self {
        self.latency_ms = latency_ms;
        self.timestamp_ms = timestamp_ms;
        self
    }
}
