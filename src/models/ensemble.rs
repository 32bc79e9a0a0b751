use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::EnsembleConfig;
use crate::core::{Parameter, ParameterSet};
use crate::errors::{Error, Result};
use crate::stats;

/// A model producing an MNIS estimate in [0, 1] from a flat feature vector
pub trait Predictor: Send + Sync {
    fn name(&self) -> &str;

    fn predict(&self, input: &[f64]) -> f64;

    /// True when the predictor stands in for a missing model
    fn is_fallback(&self) -> bool {
        false
    }
}

/// Constant prediction used when no model is loaded
#[derive(Debug, Clone, PartialEq)]
pub struct FallbackPredictor {
    name: String,
    value: f64,
}

impl FallbackPredictor {
    pub const DEFAULT_VALUE: f64 = 0.5;

    pub fn new(name: impl Into<String>) -> Self {
        Self::with_value(name, Self::DEFAULT_VALUE)
    }

    pub fn with_value(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

impl Predictor for FallbackPredictor {
    fn name(&self) -> &str {
        &self.name
    }

    fn predict(&self, _input: &[f64]) -> f64 {
        self.value
    }

    fn is_fallback(&self) -> bool {
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Slot {
    /// Raw bioelectrical spike trains
    Spike,
    /// The eight raw parameters
    Tabular,
    /// MNIS history
    Temporal,
}

impl Slot {
    pub const ALL: [Slot; 3] = [Slot::Spike, Slot::Tabular, Slot::Temporal];

    /// Key used in feature importance
    pub fn as_str(&self) -> &'static str {
        match self {
            Slot::Spike => "cnn",
            Slot::Tabular => "xgboost",
            Slot::Temporal => "lstm",
        }
    }

    fn weight(&self, config: &EnsembleConfig) -> f64 {
        match self {
            Slot::Spike => config.cnn_weight,
            Slot::Tabular => config.xgb_weight,
            Slot::Temporal => config.lstm_weight,
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-slot inputs; absent inputs are left out of the vote
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnsembleInputs {
    pub spikes: Option<Vec<f64>>,
    pub parameters: Option<Vec<f64>>,
    pub history: Option<Vec<f64>>,
}

impl EnsembleInputs {
    pub fn with_spikes(mut self, spikes: Vec<f64>) -> Self {
        self.spikes = Some(spikes);
        self
    }

    pub fn with_parameters(mut self, parameters: Vec<f64>) -> Self {
        self.parameters = Some(parameters);
        self
    }

    /// Tabular features in canonical parameter order; missing ones are NaN
    pub fn with_parameter_set(self, set: &ParameterSet) -> Self {
        let features = Parameter::ALL
            .iter()
            .map(|&p| set.get(p).unwrap_or(f64::NAN))
            .collect();
        self.with_parameters(features)
    }

    pub fn with_history(mut self, history: Vec<f64>) -> Self {
        self.history = Some(history);
        self
    }

    fn for_slot(&self, slot: Slot) -> Option<&[f64]> {
        match slot {
            Slot::Spike => self.spikes.as_deref(),
            Slot::Tabular => self.parameters.as_deref(),
            Slot::Temporal => self.history.as_deref(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnsembleResult {
    pub prediction: f64,
    /// Individual slot predictions, `None` when the slot had no input
    pub slot_predictions: BTreeMap<Slot, Option<f64>>,
    pub confidence: f64,
    pub feature_importance: BTreeMap<String, f64>,
    pub warnings: Vec<String>,
}

impl EnsembleResult {
    pub fn slot_prediction(&self, slot: Slot) -> Option<f64> {
        self.slot_predictions.get(&slot).copied().flatten()
    }
}

/// Weighted vote over three predictor slots
#[derive(Clone)]
pub struct Ensemble {
    config: EnsembleConfig,
    spike: Arc<dyn Predictor>,
    tabular: Arc<dyn Predictor>,
    temporal: Arc<dyn Predictor>,
}

impl fmt::Debug for Ensemble {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ensemble")
            .field("config", &self.config)
            .field("spike", &self.spike.name())
            .field("tabular", &self.tabular.name())
            .field("temporal", &self.temporal.name())
            .finish()
    }
}

impl Default for Ensemble {
    fn default() -> Self {
        Self::with_fallbacks(EnsembleConfig::default())
    }
}

impl Ensemble {
    pub fn new(config: EnsembleConfig) -> Result<Self> {
        config.validate().map_err(Error::configuration)?;
        Ok(Self::with_fallbacks(config))
    }

    fn with_fallbacks(config: EnsembleConfig) -> Self {
        Self {
            config,
            spike: Arc::new(FallbackPredictor::new(Slot::Spike.as_str())),
            tabular: Arc::new(FallbackPredictor::new(Slot::Tabular.as_str())),
            temporal: Arc::new(FallbackPredictor::new(Slot::Temporal.as_str())),
        }
    }

    pub fn with_spike_predictor(mut self, predictor: impl Predictor + 'static) -> Self {
        self.spike = Arc::new(predictor);
        self
    }

    pub fn with_tabular_predictor(mut self, predictor: impl Predictor + 'static) -> Self {
        self.tabular = Arc::new(predictor);
        self
    }

    pub fn with_temporal_predictor(mut self, predictor: impl Predictor + 'static) -> Self {
        self.temporal = Arc::new(predictor);
        self
    }

    pub fn config(&self) -> &EnsembleConfig {
        &self.config
    }

    pub fn predictor(&self, slot: Slot) -> &dyn Predictor {
        match slot {
            Slot::Spike => self.spike.as_ref(),
            Slot::Tabular => self.tabular.as_ref(),
            Slot::Temporal => self.temporal.as_ref(),
        }
    }

    /// Configured slot weights, keyed by slot name
    pub fn feature_importance(&self) -> BTreeMap<String, f64> {
        Slot::ALL
            .iter()
            .map(|slot| (slot.as_str().to_string(), slot.weight(&self.config)))
            .collect()
    }

    pub fn predict(&self, inputs: &EnsembleInputs) -> EnsembleResult {
        let mut slot_predictions = BTreeMap::new();
        let mut predictions = Vec::new();
        let mut weights = Vec::new();
        let mut warnings = Vec::new();

        for slot in Slot::ALL {
            let prediction = inputs.for_slot(slot).and_then(|input| {
                let predictor = self.predictor(slot);
                if predictor.is_fallback() {
                    warnings.push(format!(
                        "No {} model loaded - using fallback prediction",
                        slot
                    ));
                }
                let raw = predictor.predict(input);
                if raw.is_finite() {
                    Some(raw.clamp(0.0, 1.0))
                } else {
                    // Non-finite outputs do not vote
                    warnings.push(format!(
                        "{} predictor '{}' returned {} - excluded from ensemble",
                        slot,
                        predictor.name(),
                        raw
                    ));
                    None
                }
            });
            if let Some(p) = prediction {
                predictions.push(p);
                weights.push(slot.weight(&self.config));
            }
            slot_predictions.insert(slot, prediction);
        }

        let (prediction, confidence) = if predictions.is_empty() {
            (FallbackPredictor::DEFAULT_VALUE, 0.0)
        } else {
            let total_weight: f64 = weights.iter().sum();
            let weighted = if total_weight > 0.0 {
                predictions
                    .iter()
                    .zip(&weights)
                    .map(|(p, w)| p * w)
                    .sum::<f64>()
                    / total_weight
            } else {
                FallbackPredictor::DEFAULT_VALUE
            };
            let confidence = if predictions.len() > 1 {
                1.0 - stats::std_dev(&predictions)
            } else {
                0.7
            };
            (weighted, confidence)
        };

        if confidence < 0.5 {
            warnings.push("Low model agreement - prediction may be unreliable".to_string());
        }
        if prediction < 0.25 {
            warnings.push("Ensemble predicts EXCELLENT network state".to_string());
        } else if prediction > 0.8 {
            warnings.push("Ensemble predicts COLLAPSE risk".to_string());
        }

        debug!(
            prediction,
            confidence,
            votes = predictions.len(),
            "Ensemble prediction"
        );

        EnsembleResult {
            prediction,
            slot_predictions,
            confidence,
            feature_importance: self.feature_importance(),
            warnings,
        }
    }

    /// Predict many inputs, `batch_size` at a time in parallel
    pub fn predict_batch(&self, inputs: &[EnsembleInputs]) -> Vec<EnsembleResult> {
        inputs
            .par_chunks(self.config.batch_size.max(1))
            .flat_map_iter(|chunk| chunk.iter().map(|input| self.predict(input)))
            .collect()
    }

    /// True when the prediction reaches the configured risk threshold
    pub fn is_at_risk(&self, result: &EnsembleResult) -> bool {
        result.prediction >= self.config.threshold
    }
}
