//! Device performance presets

use serde::{Deserialize, Serialize};

/// Performance preset (target fps + confidence)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PerformancePreset {
    /// Better for older devices
    Low,
    /// Balanced performance and accuracy
    Medium,
    /// Requires a powerful device
    High,
}

impl PerformancePreset {
    pub fn fps(&self) -> u32 {
        match self {
            PerformancePreset::Low => 10,
            PerformancePreset::Medium => 20,
            PerformancePreset::High => 30,
        }
    }

    pub fn confidence(&self) -> f32 {
        match self {
            PerformancePreset::Low => 0.7,
            PerformancePreset::Medium => 0.65,
            PerformancePreset::High => 0.6,
        }
    }

    /// Pick a preset from core count and memory (GB)
    pub fn for_device(cores: usize, memory_gb: usize) -> Self {
        if cores >= 8 && memory_gb >= 8 {
            PerformancePreset::High
        } else if cores >= 4 && memory_gb >= 4 {
            PerformancePreset::Medium
        } else {
            PerformancePreset::Low
        }
    }
}
