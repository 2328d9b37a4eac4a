//! Detector backend traits

use crate::{InferenceError, LoadError, ModelVariant};
use vision_core::{Detection, Frame};

/// A loaded detector
///
/// Implementations treat the frame as read-only and report failures as
/// [`InferenceError`]; they may not honor `min_score` exactly.
pub trait Detector: Send + Sync {
    fn detect(
        &self,
        frame: &Frame,
        max_results: Option<usize>,
        min_score: f32,
    ) -> Result<Vec<Detection>, InferenceError>;

    /// Release model resources. Called once when the handle is superseded or torn down.
    fn dispose(&self) {}
}

/// Source of detectors (ONNX runtime, remote service, scripted replay, ...)
pub trait ModelBackend: Send + Sync {
    /// Backend identifier
    fn name(&self) -> &'static str;

    /// Bring up the numeric backend; must succeed before any load
    fn prepare(&self) -> Result<(), LoadError> {
        Ok(())
    }

    /// Load a detector for the given variant (may block)
    fn load(&self, variant: ModelVariant) -> Result<Box<dyn Detector>, LoadError>;
}
