//! Composite MNIS scorer.
//!
//! Normalizes the eight raw parameters against a biome's reference table,
//! takes the fixed weighted sum and classifies the result. Every call is
//! independent; batch scoring is a parallel map over single calls.

use crate::core::{Biome, Normalized, Parameter, ParameterSet};
use crate::errors::{Error, Result};
use crate::reference::{biome_reference, BiomeReference, MNIS_WEIGHTS};
use crate::scoring::classification::{classify, MnisClass};
use crate::scoring::normalizer::normalize_with_reference;
use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info_span};

/// Outcome of scoring one parameter set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    /// Weighted composite in [0, 1]
    pub score: f64,
    pub class: MnisClass,
    /// Raw values that were scored, in weight-table order
    pub parameters: BTreeMap<Parameter, f64>,
    pub normalized: BTreeMap<Parameter, f64>,
    pub biome: Biome,
    pub site_id: Option<String>,
    pub mnu_id: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
    /// One entry per parameter saturated at 0.0 or 1.0
    pub warnings: Vec<String>,
}

impl ScoreResult {
    pub fn with_site_id(mut self, site_id: impl Into<String>) -> Self {
        self.site_id = Some(site_id.into());
        self
    }

    pub fn with_mnu_id(mut self, mnu_id: impl Into<String>) -> Self {
        self.mnu_id = Some(mnu_id.into());
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn normalized_value(&self, parameter: Parameter) -> Option<f64> {
        self.normalized.get(&parameter).copied()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// MNIS calculator bound to one biome
#[derive(Debug, Clone)]
pub struct MnisScorer {
    biome: Biome,
    reference: &'static BiomeReference,
}

impl Default for MnisScorer {
    fn default() -> Self {
        Self::new(Biome::default())
    }
}

impl MnisScorer {
    pub fn new(biome: Biome) -> Self {
        Self {
            biome,
            reference: biome_reference(biome),
        }
    }

    /// Build a scorer from a biome name, rejecting unknown biomes
    pub fn from_name(biome: &str) -> Result<Self> {
        Ok(Self::new(biome.parse()?))
    }

    pub fn biome(&self) -> Biome {
        self.biome
    }

    pub fn reference(&self) -> &'static BiomeReference {
        self.reference
    }

    pub fn normalize(&self, parameter: Parameter, raw_value: f64) -> f64 {
        normalize_with_reference(raw_value, self.reference.get(parameter)).value()
    }

    /// Score a complete parameter set.
    ///
    /// Fails with [`Error::Validation`] naming every missing parameter, and
    /// with [`Error::InvalidInput`] for NaN values.
    pub fn score(&self, parameters: &ParameterSet) -> Result<ScoreResult> {
        let missing = parameters.missing();
        if !missing.is_empty() {
            return Err(Error::missing_parameters(
                missing.iter().map(Parameter::as_str),
            ));
        }

        let extra = parameters.unrecognized_keys();
        if !extra.is_empty() {
            debug!(keys = ?extra, "Ignoring unrecognized parameter keys");
        }

        let mut raw = BTreeMap::new();
        let mut normalized = BTreeMap::new();
        let mut warnings = Vec::new();
        let mut weighted_sum = 0.0;

        for (parameter, weight) in MNIS_WEIGHTS {
            let value = parameters
                .get(parameter)
                .ok_or_else(|| Error::missing_parameters([parameter.as_str()]))?;
            if value.is_nan() {
                return Err(Error::invalid_input(format!("{} is NaN", parameter)));
            }

            let norm = normalize_with_reference(value, self.reference.get(parameter));
            if norm.is_floor() {
                warnings.push(format!("{} at minimum threshold", parameter));
            } else if norm.is_ceiling() {
                warnings.push(format!("{} at maximum threshold", parameter));
            }

            weighted_sum += weight * norm.value();
            raw.insert(parameter, value);
            normalized.insert(parameter, norm.value());
        }

        let score = Normalized::new(weighted_sum);
        let class = classify(score);

        debug!(
            biome = %self.biome,
            score = score.value(),
            class = %class,
            saturated = warnings.len(),
            "Scored parameter set"
        );

        Ok(ScoreResult {
            score: score.value(),
            class,
            parameters: raw,
            normalized,
            biome: self.biome,
            site_id: None,
            mnu_id: None,
            timestamp: None,
            warnings,
        })
    }

    /// Score independent parameter sets in parallel.
    ///
    /// Results keep input order; on failure the error of the earliest
    /// failing set is returned.
    pub fn batch_score(&self, sets: &[ParameterSet]) -> Result<Vec<ScoreResult>> {
        let span = info_span!("batch_score", biome = %self.biome, count = sets.len());
        let _guard = span.enter();

        let results: Vec<Result<ScoreResult>> =
            sets.par_iter().map(|set| self.score(set)).collect();
        results.into_iter().collect()
    }
}

/// Score a parameter set under a biome
pub fn score(parameters: &ParameterSet, biome: Biome) -> Result<ScoreResult> {
    MnisScorer::new(biome).score(parameters)
}

/// String-keyed convenience: biome by name
pub fn compute_mnis(parameters: &ParameterSet, biome: &str) -> Result<ScoreResult> {
    MnisScorer::from_name(biome)?.score(parameters)
}

pub fn batch_score(sets: &[ParameterSet], biome: Biome) -> Result<Vec<ScoreResult>> {
    MnisScorer::new(biome).batch_score(sets)
}
