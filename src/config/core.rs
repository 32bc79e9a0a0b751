use serde::{Deserialize, Serialize};

use crate::core::Biome;

/// Root configuration, read from `.mnis.toml`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct MnisConfig {
    /// Reference thresholds used when a caller does not name a biome
    #[serde(default)]
    pub biome: Biome,

    /// Prediction ensemble weights and batching
    #[serde(default)]
    pub ensemble: EnsembleConfig,

    /// BFS rolling window
    #[serde(default)]
    pub stability: StabilityConfig,

    /// Spike detection for ρ_e
    #[serde(default)]
    pub electrophysiology: ElectrophysiologyConfig,

    /// ABI rarefaction
    #[serde(default)]
    pub abi: AbiConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnsembleConfig {
    /// Spike-train predictor
    #[serde(default = "default_cnn_weight")]
    pub cnn_weight: f64,

    /// Tabular parameter predictor
    #[serde(default = "default_xgb_weight")]
    pub xgb_weight: f64,

    /// Time-series predictor
    #[serde(default = "default_lstm_weight")]
    pub lstm_weight: f64,

    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

impl Default for EnsembleConfig {
    fn default() -> Self {
        Self {
            cnn_weight: default_cnn_weight(),
            xgb_weight: default_xgb_weight(),
            lstm_weight: default_lstm_weight(),
            batch_size: default_batch_size(),
            threshold: default_threshold(),
        }
    }
}

impl EnsembleConfig {
    pub fn is_valid_weight(weight: f64) -> bool {
        (0.0..=1.0).contains(&weight)
    }

    pub fn validate_weight(weight: f64, name: &str) -> Result<(), String> {
        if Self::is_valid_weight(weight) {
            Ok(())
        } else {
            Err(format!("{} weight must be between 0.0 and 1.0", name))
        }
    }

    /// Every weight and the threshold must lie in [0, 1]; batches are non-empty
    pub fn validate(&self) -> Result<(), String> {
        Self::validate_weight(self.cnn_weight, "CNN")?;
        Self::validate_weight(self.xgb_weight, "XGBoost")?;
        Self::validate_weight(self.lstm_weight, "LSTM")?;
        if !Self::is_valid_weight(self.threshold) {
            return Err("Ensemble threshold must be between 0.0 and 1.0".to_string());
        }
        if self.batch_size == 0 {
            return Err("Ensemble batch_size must be at least 1".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StabilityConfig {
    #[serde(default = "default_window_years")]
    pub window_years: u32,
}

impl Default for StabilityConfig {
    fn default() -> Self {
        Self {
            window_years: default_window_years(),
        }
    }
}

impl StabilityConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.window_years == 0 {
            Err("Stability window_years must be at least 1".to_string())
        } else {
            Ok(())
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ElectrophysiologyConfig {
    /// Hz
    #[serde(default = "default_sampling_rate")]
    pub sampling_rate: f64,

    #[serde(default = "default_threshold_sigma")]
    pub threshold_sigma: f64,

    /// Minimum seconds between spikes on one electrode
    #[serde(default = "default_min_interval")]
    pub min_interval: f64,

    #[serde(default = "default_artifact_rejection")]
    pub artifact_rejection: bool,
}

impl Default for ElectrophysiologyConfig {
    fn default() -> Self {
        Self {
            sampling_rate: default_sampling_rate(),
            threshold_sigma: default_threshold_sigma(),
            min_interval: default_min_interval(),
            artifact_rejection: default_artifact_rejection(),
        }
    }
}

impl ElectrophysiologyConfig {
    pub fn validate(&self) -> Result<(), String> {
        if !(self.sampling_rate > 0.0) {
            return Err("Electrophysiology sampling_rate must be positive".to_string());
        }
        if !(self.threshold_sigma > 0.0) {
            return Err("Electrophysiology threshold_sigma must be positive".to_string());
        }
        if !(self.min_interval >= 0.0) {
            return Err("Electrophysiology min_interval cannot be negative".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AbiConfig {
    #[serde(default = "default_sequencing_depth")]
    pub sequencing_depth: u64,
}

impl Default for AbiConfig {
    fn default() -> Self {
        Self {
            sequencing_depth: default_sequencing_depth(),
        }
    }
}

impl AbiConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.sequencing_depth == 0 {
            Err("ABI sequencing_depth must be at least 1".to_string())
        } else {
            Ok(())
        }
    }
}

pub fn default_cnn_weight() -> f64 {
    0.38
}
pub fn default_xgb_weight() -> f64 {
    0.32
}
pub fn default_lstm_weight() -> f64 {
    0.30
}
pub fn default_batch_size() -> usize {
    32
}
pub fn default_threshold() -> f64 {
    0.5
}
pub fn default_window_years() -> u32 {
    3
}
pub fn default_sampling_rate() -> f64 {
    1000.0
}
pub fn default_threshold_sigma() -> f64 {
    3.0
}
pub fn default_min_interval() -> f64 {
    0.5
}
pub fn default_artifact_rejection() -> bool {
    true
}
pub fn default_sequencing_depth() -> u64 {
    crate::parameters::abi::DEFAULT_SEQUENCING_DEPTH
}
