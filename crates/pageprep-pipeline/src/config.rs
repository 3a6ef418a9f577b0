use serde::{Deserialize, Serialize};

use pageprep_analyze::AnalyzerConfig;
use pageprep_binarize::BinarizeConfig;

/// How the pipeline reacts when no accelerated surface is obtainable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum AccelerationPolicy {
    /// Try the shader engine, fall back to the CPU path if unavailable.
    #[default]
    Prefer,
    /// Fail pipeline construction when acceleration is unavailable.
    Require,
    /// Always use the CPU path.
    Disable,
}

/// Runtime configuration for the page preparation pipeline.
///
/// The nested configs carry the empirical policy constants (8x8 tile
/// grid, 1 % / 2 % / 55 % thresholds, 0.8 relax factor) as named fields
/// with their long-standing defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub acceleration: AccelerationPolicy,
    pub analyzer: AnalyzerConfig,
    pub binarize: BinarizeConfig,
    /// Worker threads for batch processing.
    pub num_workers: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            acceleration: AccelerationPolicy::default(),
            analyzer: AnalyzerConfig::default(),
            binarize: BinarizeConfig::default(),
            num_workers: 4,
        }
    }
}

impl PipelineConfig {
    /// Preset for environments without any GPU.
    pub fn cpu_only() -> Self {
        Self {
            acceleration: AccelerationPolicy::Disable,
            ..Self::default()
        }
    }
}
