//! Core types for the vision alert pipeline
//!
//! Shared by every stage of the detection loop:
//! - Video frames and the video source contract
//! - Detections, bounding boxes, and the fixed object-class vocabulary
//! - Injectable clocks so timing logic stays testable

pub mod class;
pub mod clock;
pub mod detection;
pub mod frame;
pub mod source;

pub use class::ObjectClass;
pub use clock::{Clock, ManualClock, SystemClock};
pub use detection::{BoundingBox, Detection};
pub use frame::Frame;
pub use source::{ReadyToggle, TestPatternSource, VideoSource};

use thiserror::Error;

/// Video source error types
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Failed to open video source: {0}")]
    Open(String),

    #[error("Frame buffer size mismatch: expected {expected} bytes, got {actual}")]
    BufferSize { expected: usize, actual: usize },

    #[error("Invalid frame dimensions {width}x{height}")]
    Dimensions { width: u32, height: u32 },
}
