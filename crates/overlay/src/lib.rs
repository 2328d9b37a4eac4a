//! Detection Overlay
//!
//! Paints bounding boxes, labels, confidence bars, person alerts, and a
//! per-class summary onto a [`Surface`], choosing compact or full layout
//! constants from the surface size on every paint.

mod display_list;
mod layout;
mod palette;
mod raster;
mod renderer;
mod stats;
mod surface;

pub use display_list::{DisplayList, DrawCommand};
pub use layout::{RenderConfig, COMPACT_THRESHOLD};
pub use palette::{class_color, confidence_color};
pub use raster::RasterSurface;
pub use renderer::{pulse_at, Renderer};
pub use stats::{draw_stats_panel, COMPACT_TOP_CLASSES};
pub use surface::{Color, Font, Rect, Stroke, Surface};

use thiserror::Error;

/// Raster surface errors
#[derive(Error, Debug)]
pub enum SurfaceError {
    #[error("Failed to load font {path}: {reason}")]
    Font { path: String, reason: String },

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}
