//! Scripted backend replaying fixed detection scenes
//!
//! Used for headless runs and tests. Scenes are returned as scripted;
//! `min_score` is not applied, thresholding is left to the caller.

use crate::{Detector, InferenceError, LoadError, ModelBackend, ModelVariant};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::debug;
use vision_core::{Detection, Frame};

#[derive(Default)]
struct Counters {
    loads: AtomicUsize,
    disposals: AtomicUsize,
    detections: AtomicUsize,
}

/// Backend that hands out [`ScriptedDetector`]s
pub struct ScriptedBackend {
    scenes: Arc<Vec<Vec<Detection>>>,
    failing_variants: HashSet<ModelVariant>,
    fail_every: Option<usize>,
    counters: Arc<Counters>,
}

impl ScriptedBackend {
    pub fn new(scenes: Vec<Vec<Detection>>) -> Self {
        Self {
            scenes: Arc::new(scenes),
            failing_variants: HashSet::new(),
            fail_every: None,
            counters: Arc::new(Counters::default()),
        }
    }

    /// Make loads of `variant` fail
    pub fn failing_variant(mut self, variant: ModelVariant) -> Self {
        self.failing_variants.insert(variant);
        self
    }

    /// Make every n-th detection call fail
    pub fn failing_every(mut self, n: usize) -> Self {
        self.fail_every = Some(n.max(1));
        self
    }

    pub fn load_count(&self) -> usize {
        self.counters.loads.load(Ordering::SeqCst)
    }

    pub fn dispose_count(&self) -> usize {
        self.counters.disposals.load(Ordering::SeqCst)
    }

    pub fn detect_count(&self) -> usize {
        self.counters.detections.load(Ordering::SeqCst)
    }
}

impl ModelBackend for ScriptedBackend {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn load(&self, variant: ModelVariant) -> Result<Box<dyn Detector>, LoadError> {
        self.counters.loads.fetch_add(1, Ordering::SeqCst);
        if self.failing_variants.contains(&variant) {
            return Err(LoadError::ModelNotFound(variant.to_string()));
        }
        debug!("Scripted backend loaded {} ({} scenes)", variant, self.scenes.len());
        Ok(Box::new(ScriptedDetector {
            scenes: Arc::clone(&self.scenes),
            cursor: AtomicUsize::new(0),
            fail_every: self.fail_every,
            counters: Arc::clone(&self.counters),
        }))
    }
}

/// Detector cycling through the scripted scenes
pub struct ScriptedDetector {
    scenes: Arc<Vec<Vec<Detection>>>,
    cursor: AtomicUsize,
    fail_every: Option<usize>,
    counters: Arc<Counters>,
}

impl Detector for ScriptedDetector {
    fn detect(
        &self,
        _frame: &Frame,
        max_results: Option<usize>,
        _min_score: f32,
    ) -> Result<Vec<Detection>, InferenceError> {
        let call = self.counters.detections.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(n) = self.fail_every {
            if call % n == 0 {
                return Err(InferenceError::Failed(format!("scripted failure on call {}", call)));
            }
        }

        if self.scenes.is_empty() {
            return Ok(Vec::new());
        }
        let index = self.cursor.fetch_add(1, Ordering::SeqCst) % self.scenes.len();
        let scene = &self.scenes[index];
        let limit = max_results.unwrap_or(scene.len());
        Ok(scene.iter().take(limit).cloned().collect())
    }

    fn dispose(&self) {
        self.counters.disposals.fetch_add(1, Ordering::SeqCst);
    }
}
