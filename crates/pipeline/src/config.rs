//! Pipeline configuration

use alerting::AlertConfig;
use config::{Config, ConfigError, Environment, File};
use detection_scheduler::SchedulerConfig;
use model_adapter::ModelVariant;
use prediction_filter::{clamp_confidence, PerformancePreset};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default configuration file, overridable with `PIPELINE_CONFIG`
pub const DEFAULT_CONFIG_FILE: &str = "pipeline.toml";
/// Environment prefix for overrides, e.g. `PIPELINE_TARGET_FPS=15`
pub const ENV_PREFIX: &str = "PIPELINE";

/// Output format for log lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Complete pipeline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub model_variant: ModelVariant,
    /// Clamped to [0.1, 0.95]
    pub confidence_threshold: f32,
    /// At least 1
    pub target_fps: u32,
    pub alerts_enabled: bool,
    /// Clamped to [0, 1]
    pub volume: f32,
    pub max_results: Option<usize>,
    /// Start detecting as soon as the model is loaded
    pub auto_start: bool,
    /// Directory the custom clip and named sounds are read from
    pub asset_dir: PathBuf,
    /// Custom person clip, relative to `asset_dir`
    pub custom_clip_path: String,
    pub preload_timeout_ms: u64,
    /// Optional TTF/OTF font for overlay text
    pub font_path: Option<PathBuf>,
    pub log_level: String,
    pub log_format: LogFormat,
    /// Stop after this many seconds; run until ctrl-c when unset
    pub run_seconds: Option<u64>,
    /// Write the last painted overlay here on shutdown
    pub snapshot_path: Option<PathBuf>,
    pub surface_width: u32,
    pub surface_height: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let alerts = AlertConfig::default();
        Self {
            model_variant: ModelVariant::Lite,
            confidence_threshold: 0.6,
            target_fps: 30,
            alerts_enabled: true,
            volume: alerts.volume,
            max_results: Some(20),
            auto_start: true,
            asset_dir: PathBuf::from("assets"),
            custom_clip_path: alerts.custom_clip_path,
            preload_timeout_ms: alerts.preload_timeout_ms,
            font_path: None,
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
            run_seconds: None,
            snapshot_path: None,
            surface_width: 640,
            surface_height: 480,
        }
    }
}

impl PipelineConfig {
    /// Defaults, then the config file (if present), then `PIPELINE_*` variables
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var(format!("{}_CONFIG", ENV_PREFIX))
            .unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        Self::load_from(&path)
    }

    pub fn load_from(path: &str) -> Result<Self, ConfigError> {
        let config: PipelineConfig = Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?
            .try_deserialize()?;
        Ok(config.normalized())
    }

    /// Clamp numeric fields into their supported ranges
    pub fn normalized(mut self) -> Self {
        self.confidence_threshold = clamp_confidence(self.confidence_threshold);
        self.volume = if self.volume.is_nan() {
            0.0
        } else {
            self.volume.clamp(0.0, 1.0)
        };
        self.target_fps = self.target_fps.max(1);
        self.surface_width = self.surface_width.max(1);
        self.surface_height = self.surface_height.max(1);
        self
    }

    /// Use the variant's recommended rate and threshold
    pub fn with_variant_preset(mut self, variant: ModelVariant) -> Self {
        let preset = variant.preset();
        self.model_variant = variant;
        self.target_fps = preset.recommended_fps;
        self.confidence_threshold = preset.recommended_confidence;
        self
    }

    /// Use a device-class performance preset
    pub fn with_performance_preset(mut self, preset: PerformancePreset) -> Self {
        self.target_fps = preset.fps();
        self.confidence_threshold = preset.confidence();
        self
    }

    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig {
            variant: self.model_variant,
            confidence_threshold: self.confidence_threshold,
            target_fps: self.target_fps,
            max_results: self.max_results,
            auto_start: self.auto_start,
        }
    }

    pub fn alert_config(&self) -> AlertConfig {
        AlertConfig {
            enabled: self.alerts_enabled,
            volume: self.volume,
            custom_clip_path: self.custom_clip_path.clone(),
            preload_timeout_ms: self.preload_timeout_ms,
            ..AlertConfig::default()
        }
    }
}
