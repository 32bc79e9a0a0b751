//! ABI, biodiversity amplification index.
//!
//! Ratio of mean Shannon diversity in rhizosphere samples to that of bulk
//! soil samples, from OTU/ASV abundance counts.

use crate::core::Parameter;
use crate::parameters::{impl_measurement, report_warnings};
use crate::stats;
use serde::{Deserialize, Serialize};

pub const DEFAULT_SEQUENCING_DEPTH: u64 = 50_000;

/// Abundance counts, one row per sample
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AbiInputs {
    pub rhizosphere: Vec<Vec<u64>>,
    pub bulk: Vec<Vec<u64>>,
    pub rarefy: bool,
}

impl AbiInputs {
    pub fn new(rhizosphere: Vec<Vec<u64>>, bulk: Vec<Vec<u64>>) -> Self {
        Self {
            rhizosphere,
            bulk,
            rarefy: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbiResult {
    pub value: f64,
    pub shannon_rhizosphere: f64,
    pub shannon_bulk: f64,
    pub richness_rhizosphere: usize,
    pub richness_bulk: usize,
    pub evenness_rhizosphere: f64,
    pub evenness_bulk: f64,
    pub n_samples_rhizosphere: usize,
    pub n_samples_bulk: usize,
    pub sequencing_depth: u64,
    pub warnings: Vec<String>,
}

impl_measurement!(AbiResult, Parameter::Abi);

/// Per-compartment summary over the non-empty samples
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct Compartment {
    shannon: f64,
    richness: f64,
    evenness: f64,
}

impl Compartment {
    fn from_samples(samples: &[Vec<u64>]) -> Self {
        let (shannons, richness): (Vec<f64>, Vec<f64>) = samples
            .iter()
            .filter_map(|sample| {
                let present = sample.iter().filter(|&&c| c > 0).count();
                (present > 0).then(|| (shannon(sample), present as f64))
            })
            .unzip();
        if shannons.is_empty() {
            return Self::default();
        }
        let shannon = stats::mean(&shannons);
        let richness = stats::mean(&richness);
        Self {
            shannon,
            richness,
            evenness: pielou_evenness(shannon, richness),
        }
    }
}

/// Shannon index `H' = -Σ p·ln p` over non-zero counts
pub fn shannon(counts: &[u64]) -> f64 {
    let total: u64 = counts.iter().sum();
    if total == 0 {
        return 0.0;
    }
    let total = total as f64;
    -counts
        .iter()
        .filter(|&&c| c > 0)
        .map(|&c| {
            let p = c as f64 / total;
            p * p.ln()
        })
        .sum::<f64>()
}

/// Pielou's J' = H' / ln(S); a single species is perfectly even
pub fn pielou_evenness(shannon: f64, richness: f64) -> f64 {
    if richness <= 1.0 {
        1.0
    } else {
        shannon / richness.ln()
    }
}

#[derive(Debug, Clone)]
pub struct AbiCalculator {
    sequencing_depth: u64,
}

impl Default for AbiCalculator {
    fn default() -> Self {
        Self::new(DEFAULT_SEQUENCING_DEPTH)
    }
}

impl AbiCalculator {
    pub fn new(sequencing_depth: u64) -> Self {
        Self { sequencing_depth }
    }

    pub fn sequencing_depth(&self) -> u64 {
        self.sequencing_depth
    }

    /// Scale a sample down to `depth` reads.
    ///
    /// Counts are allocated proportionally and the leftover reads go to the
    /// largest fractional remainders (lowest index first on ties), so the
    /// result is reproducible and always sums to `depth`. Samples at or
    /// below `depth` are returned unchanged.
    pub fn rarefy(sample: &[u64], depth: u64) -> Vec<u64> {
        let total: u64 = sample.iter().sum();
        if total <= depth {
            return sample.to_vec();
        }

        let mut allocated: Vec<u64> = Vec::with_capacity(sample.len());
        let mut remainders: Vec<(usize, u128)> = Vec::with_capacity(sample.len());
        for (index, &count) in sample.iter().enumerate() {
            let scaled = count as u128 * depth as u128;
            allocated.push((scaled / total as u128) as u64);
            remainders.push((index, scaled % total as u128));
        }

        let assigned: u64 = allocated.iter().sum();
        let leftover = (depth - assigned) as usize;
        remainders.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        for &(index, _) in remainders.iter().take(leftover) {
            allocated[index] += 1;
        }
        allocated
    }

    pub fn compute(&self, inputs: &AbiInputs) -> AbiResult {
        let prepare = |samples: &[Vec<u64>]| -> Vec<Vec<u64>> {
            if inputs.rarefy {
                samples
                    .iter()
                    .map(|s| Self::rarefy(s, self.sequencing_depth))
                    .collect()
            } else {
                samples.to_vec()
            }
        };
        let rhizo = Compartment::from_samples(&prepare(&inputs.rhizosphere));
        let bulk = Compartment::from_samples(&prepare(&inputs.bulk));

        let value = if bulk.shannon > 0.0 {
            rhizo.shannon / bulk.shannon
        } else {
            1.0
        };

        let mut warnings = Vec::new();
        if value < 1.3 {
            warnings.push(
                "Low biodiversity amplification - possible hyphal exudate dysfunction".to_string(),
            );
        } else if value < 1.5 {
            warnings.push("Moderate biodiversity amplification - below optimal".to_string());
        }
        if rhizo.richness < 50.0 {
            warnings.push("Very low rhizosphere richness - severe degradation".to_string());
        } else if rhizo.richness < 100.0 {
            warnings.push("Low rhizosphere richness".to_string());
        }
        if bulk.shannon < 2.0 {
            warnings.push("Low bulk soil diversity - site may be degraded".to_string());
        }
        report_warnings(Parameter::Abi, &warnings);

        AbiResult {
            value,
            shannon_rhizosphere: rhizo.shannon,
            shannon_bulk: bulk.shannon,
            richness_rhizosphere: rhizo.richness as usize,
            richness_bulk: bulk.richness as usize,
            evenness_rhizosphere: rhizo.evenness,
            evenness_bulk: bulk.evenness,
            n_samples_rhizosphere: inputs.rhizosphere.len(),
            n_samples_bulk: inputs.bulk.len(),
            sequencing_depth: self.sequencing_depth,
            warnings,
        }
    }

    /// ABI proxy from soil chemistry when no sequencing is available.
    /// Clamped to [1.0, 2.5].
    pub fn estimate_from_soil_parameters(
        organic_matter: f64,
        ph: f64,
        nitrogen: f64,
        fungal_biomass: f64,
    ) -> f64 {
        let om_factor = 1.0 + 0.1 * organic_matter.ln_1p();
        let ph_factor = if (5.5..=7.0).contains(&ph) {
            1.0
        } else {
            1.0 - 0.1 * (ph - 6.25).abs()
        };
        let n_factor = if nitrogen > 50.0 {
            1.0 - 0.2 * (nitrogen / 100.0)
        } else {
            1.0
        };
        let biomass_factor = 1.0 + 0.3 * (fungal_biomass / 200.0);
        (1.5 * om_factor * ph_factor * n_factor * biomass_factor).clamp(1.0, 2.5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn even(species: usize, reads: u64) -> Vec<u64> {
        vec![reads; species]
    }

    #[test]
    fn shannon_of_even_community_is_ln_s() {
        assert!((shannon(&even(8, 10)) - 8f64.ln()).abs() < 1e-12);
        assert_eq!(shannon(&[0, 0]), 0.0);
        assert_eq!(shannon(&[42]), 0.0);
    }

    #[test]
    fn evenness_edge_cases() {
        assert_eq!(pielou_evenness(0.0, 1.0), 1.0);
        assert!((pielou_evenness(4f64.ln(), 4.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn rarefaction_is_deterministic_and_exact() {
        let sample = vec![7, 3, 5, 1, 0, 9];
        let once = AbiCalculator::rarefy(&sample, 10);
        let twice = AbiCalculator::rarefy(&sample, 10);
        assert_eq!(once, twice);
        assert_eq!(once.iter().sum::<u64>(), 10);
        assert_eq!(once[4], 0);
        assert_eq!(AbiCalculator::rarefy(&sample, 100), sample);
    }

    #[test]
    fn amplified_rhizosphere() {
        let inputs = AbiInputs {
            rhizosphere: vec![even(200, 10), even(200, 12)],
            bulk: vec![even(20, 50)],
            rarefy: false,
        };
        let result = AbiCalculator::default().compute(&inputs);
        assert!((result.value - 200f64.ln() / 20f64.ln()).abs() < 1e-12);
        assert_eq!(result.richness_rhizosphere, 200);
        assert_eq!(result.richness_bulk, 20);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn empty_bulk_soil_gives_unity() {
        let inputs = AbiInputs::new(vec![even(10, 5)], vec![vec![0, 0, 0]]);
        let result = AbiCalculator::new(1000).compute(&inputs);
        assert_eq!(result.value, 1.0);
        assert_eq!(result.shannon_bulk, 0.0);
        assert!(result
            .warnings
            .iter()
            .any(|w| w.starts_with("Low biodiversity amplification")));
    }

    #[test]
    fn soil_estimate_bounds() {
        let base = AbiCalculator::estimate_from_soil_parameters(0.0, 6.0, 0.0, 0.0);
        assert!((base - 1.5).abs() < 1e-12);
        assert_eq!(AbiCalculator::estimate_from_soil_parameters(0.0, 12.0, 400.0, 0.0), 1.0);
    }
}
