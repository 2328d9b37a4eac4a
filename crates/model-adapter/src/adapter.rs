//! Model adapter: variant-aware loading and timed detection

use crate::{Detector, InferenceError, LoadError, ModelBackend, ModelVariant};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};
use vision_core::{Clock, Detection, Frame};

/// Load request
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoadConfig {
    pub variant: ModelVariant,
    /// Whether the numeric backend finished its own initialization
    pub backend_ready: bool,
}

/// Shared handle to a loaded detector
#[derive(Clone)]
pub struct ModelHandle {
    variant: ModelVariant,
    detector: Arc<dyn Detector>,
    released: Arc<AtomicBool>,
    clock: Arc<dyn Clock>,
}

impl ModelHandle {
    fn new(variant: ModelVariant, detector: Arc<dyn Detector>, clock: Arc<dyn Clock>) -> Self {
        Self {
            variant,
            detector,
            released: Arc::new(AtomicBool::new(false)),
            clock,
        }
    }

    pub fn variant(&self) -> ModelVariant {
        self.variant
    }

    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }

    /// Run the detector on a frame and stamp latency and timestamp onto every result
    pub fn detect(
        &self,
        frame: &Frame,
        max_results: Option<usize>,
        min_score: f32,
    ) -> Result<Vec<Detection>, InferenceError> {
        if !frame.is_well_formed() {
            return Err(InferenceError::InvalidFrame {
                width: frame.width,
                height: frame.height,
                len: frame.data.len(),
            });
        }
        if self.is_released() {
            return Err(InferenceError::Failed(format!(
                "{} model was released",
                self.variant
            )));
        }

        let start = Instant::now();
        let detector = Arc::clone(&self.detector);
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            detector.detect(frame, max_results, min_score)
        }))
        .map_err(|_| InferenceError::Panicked)?;
        let latency_ms = start.elapsed().as_millis() as u64;

        let detections = result?;
        let timestamp_ms = self.clock.now_ms();
        debug!(
            "Detected {} objects in {}ms (frame {})",
            detections.len(),
            latency_ms,
            frame.sequence
        );

        Ok(detections
            .into_iter()
            .map(|d| d.with_timing(latency_ms, timestamp_ms))
            .collect())
    }

    /// Dispose the underlying detector exactly once
    pub fn release(&self) {
        if !self.released.swap(true, Ordering::SeqCst) {
            info!("Releasing {} model", self.variant);
            self.detector.dispose();
        }
    }
}

impl std::fmt::Debug for ModelHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelHandle")
            .field("variant", &self.variant)
            .field("released", &self.is_released())
            .finish()
    }
}

/// Owns the current model and supersedes it when a new variant is loaded
///
/// Superseded handles are retired, not released: a detection may still be
/// running on them. The owner calls [`release_retired`](Self::release_retired)
/// once no cycle can reach them any more.
pub struct ModelAdapter {
    backend: Arc<dyn ModelBackend>,
    current: Option<ModelHandle>,
    retired: Vec<ModelHandle>,
    clock: Arc<dyn Clock>,
}

impl ModelAdapter {
    pub fn new(backend: Arc<dyn ModelBackend>, clock: Arc<dyn Clock>) -> Self {
        info!("Creating model adapter for backend {}", backend.name());
        Self {
            backend,
            current: None,
            retired: Vec::new(),
            clock,
        }
    }

    /// Initialize the numeric backend; the result feeds [`LoadConfig::backend_ready`]
    pub fn prepare_backend(&self) -> bool {
        match self.backend.prepare() {
            Ok(()) => true,
            Err(e) => {
                warn!("Backend {} not ready: {}", self.backend.name(), e);
                false
            }
        }
    }

    /// Load a variant. Idempotent per variant; a new variant supersedes and retires the previous handle.
    pub async fn load(&mut self, config: &LoadConfig) -> Result<ModelHandle, LoadError> {
        if !config.backend_ready {
            return Err(LoadError::BackendNotReady);
        }

        if let Some(current) = &self.current {
            if current.variant() == config.variant && !current.is_released() {
                debug!("Model {} already loaded", config.variant);
                return Ok(current.clone());
            }
        }

        let variant = config.variant;
        info!(
            "Loading {} model ({} architecture)",
            variant,
            variant.preset().base
        );

        let backend = Arc::clone(&self.backend);
        let detector = tokio::task::spawn_blocking(move || backend.load(variant))
            .await
            .map_err(|e| LoadError::Backend(format!("load task failed: {}", e)))??;

        let handle = ModelHandle::new(variant, Arc::from(detector), Arc::clone(&self.clock));
        if let Some(previous) = self.current.replace(handle.clone()) {
            debug!("Superseding {} model", previous.variant());
            self.retired.push(previous);
        }

        info!("Model {} loaded successfully", variant);
        Ok(handle)
    }

    /// Currently loaded handle, if any
    pub fn current(&self) -> Option<&ModelHandle> {
        self.current.as_ref()
    }

    /// Stop handing out the current model without releasing it yet
    pub fn retire_current(&mut self) {
        if let Some(handle) = self.current.take() {
            self.retired.push(handle);
        }
    }

    /// Superseded handles still waiting for release
    pub fn retired_count(&self) -> usize {
        self.retired.len()
    }

    /// Release every superseded handle
    pub fn release_retired(&mut self) {
        for handle in self.retired.drain(..) {
            handle.release();
        }
    }

    /// Release the current handle and everything retired
    pub fn release(&mut self) {
        self.retire_current();
        self.release_retired();
    }
}

impl Drop for ModelAdapter {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ScriptedBackend;
    use vision_core::{Detection, ManualClock};

    fn frame() -> Frame {
        Frame::new(vec![0; 4 * 4 * 3], 4, 4, 0, 0).unwrap()
    }

    fn adapter(backend: Arc<ScriptedBackend>) -> ModelAdapter {
        ModelAdapter::new(backend, Arc::new(ManualClock::new(5_000)))
    }

    #[tokio::test]
    async fn test_load_is_idempotent_per_variant() {
        let backend = Arc::new(ScriptedBackend::new(vec![]));
        let mut adapter = adapter(backend.clone());
        let config = LoadConfig {
            variant: ModelVariant::Lite,
            backend_ready: true,
        };

        adapter.load(&config).await.unwrap();
        adapter.load(&config).await.unwrap();
        assert_eq!(backend.load_count(), 1);
    }

    #[tokio::test]
    async fn test_new_variant_supersedes_previous() {
        let backend = Arc::new(ScriptedBackend::new(vec![]));
        let mut adapter = adapter(backend.clone());

        let first = adapter
            .load(&LoadConfig {
                variant: ModelVariant::Lite,
                backend_ready: true,
            })
            .await
            .unwrap();
        let second = adapter
            .load(&LoadConfig {
                variant: ModelVariant::MobilenetV2,
                backend_ready: true,
            })
            .await
            .unwrap();

        assert!(!first.is_released());
        assert_eq!(adapter.retired_count(), 1);
        assert_eq!(backend.load_count(), 2);
        assert_eq!(backend.dispose_count(), 0);
        assert_eq!(adapter.current().unwrap().variant(), ModelVariant::MobilenetV2);

        // a cycle started before the switch still runs on the old model
        assert!(first.detect(&frame(), None, 0.5).is_ok());

        adapter.release_retired();
        assert!(first.is_released());
        assert!(!second.is_released());
        assert_eq!(backend.dispose_count(), 1);
        assert_eq!(adapter.retired_count(), 0);
    }

    #[tokio::test]
    async fn test_release_covers_retired_handles() {
        let backend = Arc::new(ScriptedBackend::new(vec![]));
        let mut adapter = adapter(backend.clone());

        for variant in [ModelVariant::Lite, ModelVariant::MobilenetV1] {
            adapter
                .load(&LoadConfig {
                    variant,
                    backend_ready: true,
                })
                .await
                .unwrap();
        }
        drop(adapter);
        assert_eq!(backend.dispose_count(), 2);
    }

    #[tokio::test]
    async fn test_backend_not_ready() {
        let backend = Arc::new(ScriptedBackend::new(vec![]));
        let mut adapter = adapter(backend.clone());

        let err = adapter
            .load(&LoadConfig {
                variant: ModelVariant::Lite,
                backend_ready: false,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, LoadError::BackendNotReady));
        assert_eq!(backend.load_count(), 0);
    }

    #[tokio::test]
    async fn test_load_failure_is_reported() {
        let backend = Arc::new(ScriptedBackend::new(vec![]).failing_variant(ModelVariant::MobilenetV1));
        let mut adapter = adapter(backend);

        let err = adapter
            .load(&LoadConfig {
                variant: ModelVariant::MobilenetV1,
                backend_ready: true,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, LoadError::ModelNotFound(_)));
        assert!(adapter.current().is_none());
    }

    #[tokio::test]
    async fn test_detect_stamps_timing() {
        let scene = vec![Detection::new("person", 0.9, [10.0, 10.0, 50.0, 100.0])];
        let backend = Arc::new(ScriptedBackend::new(vec![scene]));
        let mut adapter = adapter(backend);
        let handle = adapter
            .load(&LoadConfig {
                variant: ModelVariant::Lite,
                backend_ready: true,
            })
            .await
            .unwrap();

        let detections = handle.detect(&frame(), None, 0.5).unwrap();
        assert_eq!(detections.len(), 1);
        assert_eq!(detections[0].timestamp_ms, 5_000);
    }

    #[tokio::test]
    async fn test_malformed_frame_is_inference_error() {
        let backend = Arc::new(ScriptedBackend::new(vec![]));
        let mut adapter = adapter(backend);
        let handle = adapter
            .load(&LoadConfig {
                variant: ModelVariant::Lite,
                backend_ready: true,
            })
            .await
            .unwrap();

        let mut bad = frame();
        bad.data.truncate(5);
        assert!(matches!(
            handle.detect(&bad, None, 0.5),
            Err(InferenceError::InvalidFrame { len: 5, .. })
        ));
    }

    #[tokio::test]
    async fn test_release_disposes_once() {
        let backend = Arc::new(ScriptedBackend::new(vec![]));
        let mut adapter = adapter(backend.clone());
        let handle = adapter
            .load(&LoadConfig {
                variant: ModelVariant::Lite,
                backend_ready: true,
            })
            .await
            .unwrap();

        adapter.release();
        handle.release();
        assert_eq!(backend.dispose_count(), 1);
        assert!(handle.detect(&frame(), None, 0.5).is_err());
    }
}
