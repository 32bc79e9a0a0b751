//! Static reference data for MNIS scoring
//!
//! This module contains the immutable tables the scorer reads:
//! - The published weight vector (sums to 1.0 over the eight parameters)
//! - Biome-specific `{min, max_ref}` thresholds, plus the optimal band for SER
//! - Global fallback reference ranges per parameter
//!
//! Everything here is `const`/`static`; nothing is configured at runtime.

use crate::core::{Biome, Parameter};
use serde::Serialize;

/// Sub-range of a parameter that scores the maximum normalized value
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OptimalBand {
    pub min: f64,
    pub max: f64,
}

impl OptimalBand {
    pub fn contains(&self, value: f64) -> bool {
        self.min <= value && value <= self.max
    }
}

/// Reference thresholds for one parameter within one biome
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ParameterReference {
    pub min: f64,
    pub max_ref: f64,
    /// Only present for parameters scored against an optimal band
    pub optimal: Option<OptimalBand>,
}

impl ParameterReference {
    const fn linear(min: f64, max_ref: f64) -> Self {
        Self {
            min,
            max_ref,
            optimal: None,
        }
    }

    const fn banded(min: f64, max_ref: f64, optimal_min: f64, optimal_max: f64) -> Self {
        Self {
            min,
            max_ref,
            optimal: Some(OptimalBand {
                min: optimal_min,
                max: optimal_max,
            }),
        }
    }

    pub fn span(&self) -> f64 {
        self.max_ref - self.min
    }
}

/// Reference thresholds for all eight parameters of a biome
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BiomeReference {
    pub biome: Biome,
    /// Indexed in weight-table order (`Parameter as usize`)
    entries: [ParameterReference; 8],
}

impl BiomeReference {
    pub fn get(&self, parameter: Parameter) -> &ParameterReference {
        &self.entries[parameter as usize]
    }

    pub fn iter(&self) -> impl Iterator<Item = (Parameter, &ParameterReference)> {
        Parameter::ALL.iter().copied().zip(self.entries.iter())
    }
}

/// MNIS weights in weight-table order.
///
/// MNIS = 0.18·η_NW* + 0.16·E_a* + 0.18·ρ_e* + 0.14·∇C* + 0.12·SER*
///      + 0.10·K_topo* + 0.07·ABI* + 0.05·BFS*
pub const MNIS_WEIGHTS: [(Parameter, f64); 8] = [
    (Parameter::EtaNw, 0.18),
    (Parameter::EA, 0.16),
    (Parameter::RhoE, 0.18),
    (Parameter::GradC, 0.14),
    (Parameter::Ser, 0.12),
    (Parameter::KTopo, 0.10),
    (Parameter::Abi, 0.07),
    (Parameter::Bfs, 0.05),
];

pub fn weight(parameter: Parameter) -> f64 {
    MNIS_WEIGHTS[parameter as usize].1
}

/// Biome-agnostic reference ranges `(min, max_ref)`, covering every biome
pub const PARAMETER_RANGES: [(Parameter, f64, f64); 8] = [
    (Parameter::EtaNw, 0.25, 0.90),
    (Parameter::EA, 0.25, 0.82),
    (Parameter::RhoE, 0.15, 0.78),
    (Parameter::GradC, 0.35, 0.90),
    (Parameter::Ser, 0.40, 1.70),
    (Parameter::KTopo, 1.28, 1.88),
    (Parameter::Abi, 0.90, 2.20),
    (Parameter::Bfs, 0.22, 0.88),
];

pub fn global_range(parameter: Parameter) -> (f64, f64) {
    let (_, min, max) = PARAMETER_RANGES[parameter as usize];
    (min, max)
}

use ParameterReference as R;

static BIOME_REFERENCES: [BiomeReference; 5] = [
    BiomeReference {
        biome: Biome::TemperateBroadleaf,
        entries: [
            R::linear(0.32, 0.88),
            R::linear(0.30, 0.80),
            R::linear(0.20, 0.75),
            R::linear(0.40, 0.88),
            R::banded(0.45, 1.60, 0.90, 1.10),
            R::linear(1.35, 1.85),
            R::linear(1.00, 2.10),
            R::linear(0.28, 0.85),
        ],
    },
    BiomeReference {
        biome: Biome::BorealConifer,
        entries: [
            R::linear(0.28, 0.82),
            R::linear(0.28, 0.78),
            R::linear(0.18, 0.72),
            R::linear(0.38, 0.85),
            R::banded(0.42, 1.65, 0.88, 1.12),
            R::linear(1.30, 1.80),
            R::linear(0.95, 2.00),
            R::linear(0.25, 0.82),
        ],
    },
    BiomeReference {
        biome: Biome::TropicalMontane,
        entries: [
            R::linear(0.35, 0.90),
            R::linear(0.32, 0.82),
            R::linear(0.22, 0.78),
            R::linear(0.42, 0.90),
            R::banded(0.48, 1.55, 0.92, 1.08),
            R::linear(1.40, 1.88),
            R::linear(1.10, 2.20),
            R::linear(0.30, 0.88),
        ],
    },
    BiomeReference {
        biome: Biome::MediterraneanWoodland,
        entries: [
            R::linear(0.30, 0.85),
            R::linear(0.29, 0.79),
            R::linear(0.19, 0.73),
            R::linear(0.39, 0.86),
            R::banded(0.44, 1.62, 0.89, 1.11),
            R::linear(1.33, 1.82),
            R::linear(1.02, 2.05),
            R::linear(0.27, 0.84),
        ],
    },
    BiomeReference {
        biome: Biome::SubarcticBirch,
        entries: [
            R::linear(0.25, 0.78),
            R::linear(0.25, 0.75),
            R::linear(0.15, 0.68),
            R::linear(0.35, 0.82),
            R::banded(0.40, 1.70, 0.85, 1.15),
            R::linear(1.28, 1.75),
            R::linear(0.90, 1.90),
            R::linear(0.22, 0.80),
        ],
    },
];

/// Reference table for a biome
pub fn biome_reference(biome: Biome) -> &'static BiomeReference {
    &BIOME_REFERENCES[biome as usize]
}
