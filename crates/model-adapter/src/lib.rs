//! Object Detection Model Adapter
//!
//! Wraps a pretrained detector behind a uniform `load` / `detect` contract.
//! The inference itself is a black box provided by a [`ModelBackend`].

mod adapter;
mod backend;
mod scripted;
mod variant;

pub use adapter::{LoadConfig, ModelAdapter, ModelHandle};
pub use backend::{Detector, ModelBackend};
pub use scripted::{ScriptedBackend, ScriptedDetector};
pub use variant::{ModelVariant, VariantPreset};

use thiserror::Error;

/// Errors while loading a model
#[derive(Debug, Clone, Error)]
pub enum LoadError {
    #[error("Numeric backend is not ready")]
    BackendNotReady,
    #[error("Model not found for variant {0}")]
    ModelNotFound(String),
    #[error("Model load failed: {0}")]
    Backend(String),
}

/// Errors during a single detection call
#[derive(Debug, Clone, Error)]
pub enum InferenceError {
    #[error("Invalid frame: {width}x{height} with {len} bytes")]
    InvalidFrame { width: u32, height: u32, len: usize },
    #[error("Inference failed: {0}")]
    Failed(String),
    #[error("Detector panicked during inference")]
    Panicked,
}
