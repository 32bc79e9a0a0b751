//! Summary statistics across several scored samples.

use crate::scoring::classification::MnisClass;
use crate::scoring::composite::ScoreResult;
use crate::stats;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonSummary {
    pub mean: f64,
    /// Population standard deviation
    pub std: f64,
    pub min: f64,
    pub max: f64,
    pub median: f64,
    pub count: usize,
    /// Every class is present, zero-filled
    pub class_distribution: BTreeMap<MnisClass, usize>,
}

pub fn compare_results(results: &[ScoreResult]) -> ComparisonSummary {
    let mut class_distribution: BTreeMap<MnisClass, usize> =
        MnisClass::ALL.iter().map(|&class| (class, 0)).collect();
    for result in results {
        *class_distribution.entry(result.class).or_insert(0) += 1;
    }

    let scores: Vec<f64> = results.iter().map(|r| r.score).collect();
    if scores.is_empty() {
        return ComparisonSummary {
            mean: 0.0,
            std: 0.0,
            min: 0.0,
            max: 0.0,
            median: 0.0,
            count: 0,
            class_distribution,
        };
    }

    ComparisonSummary {
        mean: stats::mean(&scores),
        std: stats::std_dev(&scores),
        min: scores.iter().copied().fold(f64::INFINITY, f64::min),
        max: scores.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        median: stats::median(&scores),
        count: scores.len(),
        class_distribution,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Biome, ParameterSet};
    use crate::scoring::composite::score;

    fn set(scale: f64) -> ParameterSet {
        ParameterSet::new()
            .with("eta_nw", 0.32 + 0.56 * scale)
            .with("e_a", 0.30 + 0.50 * scale)
            .with("rho_e", 0.20 + 0.55 * scale)
            .with("grad_c", 0.40 + 0.48 * scale)
            .with("ser", 0.45 + 0.45 * scale)
            .with("k_topo", 1.35 + 0.50 * scale)
            .with("abi", 1.00 + 1.10 * scale)
            .with("bfs", 0.28 + 0.57 * scale)
    }

    #[test]
    fn empty_input_is_zeroed() {
        let summary = compare_results(&[]);
        assert_eq!(summary.count, 0);
        assert_eq!(summary.mean, 0.0);
        assert_eq!(summary.class_distribution.len(), 5);
        assert!(summary.class_distribution.values().all(|&n| n == 0));
    }

    #[test]
    fn identical_results_have_zero_spread() {
        let result = score(&set(0.5), Biome::TemperateBroadleaf).unwrap();
        let summary = compare_results(&[result.clone(), result.clone()]);
        assert_eq!(summary.count, 2);
        assert_eq!(summary.std, 0.0);
        assert_eq!(summary.min, summary.max);
        assert_eq!(summary.class_distribution[&result.class], 2);
    }

    #[test]
    fn spread_across_classes() {
        let results: Vec<ScoreResult> = [0.1, 0.5, 0.9]
            .iter()
            .map(|&s| score(&set(s), Biome::TemperateBroadleaf).unwrap())
            .collect();
        let summary = compare_results(&results);
        assert_eq!(summary.count, 3);
        assert!(summary.min < summary.median && summary.median < summary.max);
        assert_eq!(summary.class_distribution.values().sum::<usize>(), 3);
    }
}
