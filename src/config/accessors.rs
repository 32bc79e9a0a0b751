use std::sync::OnceLock;

use super::core::MnisConfig;
use super::loader::load_config;
use crate::errors::Result;
use crate::models::Ensemble;
use crate::parameters::{
    AbiCalculator, BfsCalculator, Recording, RhoECalculator, SerCalculator, SpikeDetection,
};
use crate::scoring::MnisScorer;

static CONFIG: OnceLock<MnisConfig> = OnceLock::new();

/// Configuration discovered from the working directory, loaded once
pub fn get_config() -> &'static MnisConfig {
    CONFIG.get_or_init(load_config)
}

impl MnisConfig {
    pub fn scorer(&self) -> MnisScorer {
        MnisScorer::new(self.biome)
    }

    pub fn ser_calculator(&self) -> SerCalculator {
        SerCalculator::new(self.biome)
    }

    pub fn bfs_calculator(&self) -> BfsCalculator {
        BfsCalculator::new(self.stability.window_years)
    }

    pub fn abi_calculator(&self) -> AbiCalculator {
        AbiCalculator::new(self.abi.sequencing_depth)
    }

    pub fn spike_detection(&self) -> SpikeDetection {
        SpikeDetection {
            threshold_sigma: self.electrophysiology.threshold_sigma,
            min_interval: self.electrophysiology.min_interval,
            artifact_rejection: self.electrophysiology.artifact_rejection,
        }
    }

    pub fn rho_e_calculator(&self) -> RhoECalculator {
        RhoECalculator::new(self.spike_detection())
    }

    /// Wrap per-electrode traces sampled at the configured rate
    pub fn recording(&self, channels: Vec<Vec<f64>>) -> Result<Recording> {
        Recording::new(self.electrophysiology.sampling_rate, channels)
    }

    pub fn ensemble(&self) -> Result<Ensemble> {
        Ensemble::new(self.ensemble)
    }
}
