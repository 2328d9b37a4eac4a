//! Model variants and their recommended presets

use serde::{Deserialize, Serialize};
use std::fmt;

/// Selectable detector architectures, trading speed for accuracy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelVariant {
    /// Fastest detection, lower accuracy
    #[default]
    Lite,
    /// Balanced speed and accuracy
    MobilenetV1,
    /// Most accurate, slower detection
    MobilenetV2,
}

/// Recommended settings for a variant
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VariantPreset {
    /// Base architecture name understood by the backend
    pub base: &'static str,
    pub description: &'static str,
    pub recommended_fps: u32,
    pub recommended_confidence: f32,
}

impl ModelVariant {
    pub const ALL: [ModelVariant; 3] = [
        ModelVariant::Lite,
        ModelVariant::MobilenetV1,
        ModelVariant::MobilenetV2,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelVariant::Lite => "lite",
            ModelVariant::MobilenetV1 => "mobilenet_v1",
            ModelVariant::MobilenetV2 => "mobilenet_v2",
        }
    }

    pub fn preset(&self) -> VariantPreset {
        match self {
            ModelVariant::Lite => VariantPreset {
                base: "lite_mobilenet_v2",
                description: "Fastest detection, lower accuracy",
                recommended_fps: 30,
                recommended_confidence: 0.6,
            },
            ModelVariant::MobilenetV1 => VariantPreset {
                base: "mobilenet_v1",
                description: "Balanced speed and accuracy",
                recommended_fps: 20,
                recommended_confidence: 0.65,
            },
            ModelVariant::MobilenetV2 => VariantPreset {
                base: "mobilenet_v2",
                description: "Most accurate, slower detection",
                recommended_fps: 15,
                recommended_confidence: 0.7,
            },
        }
    }
}

impl fmt::Display for ModelVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
