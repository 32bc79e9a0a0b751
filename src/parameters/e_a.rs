//! E_a, adaptive resilience index.
//!
//! `E_a = (G_stressed / G_control) · exp(-λ · t_stress)` where λ is fitted
//! from recovery measurements when they are available.

use crate::core::Parameter;
use crate::errors::{Error, Result};
use crate::parameters::{impl_measurement, report_warnings};
use crate::stats::linear_fit;
use serde::{Deserialize, Serialize};
use std::fmt;

const DEFAULT_LAMBDA: f64 = 0.5;
const DEFAULT_RECOVERY_DAYS: f64 = 7.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResilienceClass {
    Resilient,
    Moderate,
    Compromised,
}

impl ResilienceClass {
    pub fn from_value(e_a: f64) -> Self {
        if e_a >= 0.80 {
            ResilienceClass::Resilient
        } else if e_a >= 0.50 {
            ResilienceClass::Moderate
        } else {
            ResilienceClass::Compromised
        }
    }
}

impl fmt::Display for ResilienceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ResilienceClass::Resilient => "RESILIENT",
            ResilienceClass::Moderate => "MODERATE",
            ResilienceClass::Compromised => "COMPROMISED",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EaInputs {
    /// µm/hour
    pub control_growth: f64,
    /// µm/hour
    pub stressed_growth: f64,
    /// hours
    pub stress_duration: f64,
    /// Growth rates observed during recovery, paired with `recovery_times`
    pub recovery_rates: Vec<f64>,
    /// hours
    pub recovery_times: Vec<f64>,
    pub temperature: f64,
    pub n_tips_control: u32,
    pub n_tips_stressed: u32,
}

impl EaInputs {
    pub fn new(control_growth: f64, stressed_growth: f64) -> Self {
        Self {
            control_growth,
            stressed_growth,
            stress_duration: 48.0,
            recovery_rates: Vec::new(),
            recovery_times: Vec::new(),
            temperature: 15.0,
            n_tips_control: 40,
            n_tips_stressed: 40,
        }
    }

    pub fn with_recovery(mut self, rates: Vec<f64>, times: Vec<f64>) -> Self {
        self.recovery_rates = rates;
        self.recovery_times = times;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EaResult {
    pub value: f64,
    pub growth_control: f64,
    pub growth_stressed: f64,
    pub growth_recovery: f64,
    pub suppression_percent: f64,
    /// days
    pub recovery_time: f64,
    pub lambda: f64,
    pub resilience_class: ResilienceClass,
    pub n_measurements: u32,
    pub warnings: Vec<String>,
}

impl_measurement!(EaResult, Parameter::EA);

#[derive(Debug, Clone, Default)]
pub struct EaCalculator;

impl EaCalculator {
    pub fn new() -> Self {
        Self
    }

    /// Decay coefficient λ from a log-linear fit of recovery rates over
    /// time, clamped to [0.01, 2.0]. Fewer than two points yield the
    /// default of 0.5.
    pub fn resilience_decay(rates: &[f64], times: &[f64]) -> f64 {
        if rates.len() < 2 {
            return DEFAULT_LAMBDA;
        }
        let log_rates: Vec<f64> = rates.iter().map(|r| (r + 1e-6).ln()).collect();
        match linear_fit(times, &log_rates) {
            Some(fit) => (-fit.slope).clamp(0.01, 2.0),
            None => DEFAULT_LAMBDA,
        }
    }

    pub fn compute(&self, inputs: &EaInputs) -> Result<EaResult> {
        if inputs.recovery_rates.len() != inputs.recovery_times.len() {
            return Err(Error::invalid_input(format!(
                "recovery rates ({}) and times ({}) differ in length",
                inputs.recovery_rates.len(),
                inputs.recovery_times.len()
            )));
        }

        let (suppression, growth_ratio) = if inputs.control_growth > 0.0 {
            let ratio = inputs.stressed_growth / inputs.control_growth;
            ((1.0 - ratio) * 100.0, ratio)
        } else {
            (100.0, 0.0)
        };

        let mut lambda = DEFAULT_LAMBDA;
        let mut recovered: Option<(f64, f64)> = None;
        if !inputs.recovery_rates.is_empty() {
            let target = 0.9 * inputs.control_growth;
            recovered = inputs
                .recovery_rates
                .iter()
                .zip(&inputs.recovery_times)
                .find(|(&rate, _)| rate >= target)
                .map(|(&rate, &hours)| (hours / 24.0, rate));
            lambda = Self::resilience_decay(&inputs.recovery_rates, &inputs.recovery_times);
        }

        let mut value = growth_ratio * (-lambda * inputs.stress_duration / 24.0).exp();
        if inputs.temperature != 15.0 {
            value *= (-0.5 * ((inputs.temperature - 15.0) / 10.0).powi(2)).exp();
        }
        let value = value.clamp(0.0, 1.0);

        let mut warnings = Vec::new();
        if value < 0.3 {
            warnings.push("Critically low resilience - network severely compromised".to_string());
        } else if value < 0.5 {
            warnings.push("Low resilience - recovery may be slow".to_string());
        }
        if suppression > 70.0 {
            warnings.push(format!("Severe growth suppression ({:.1}%)", suppression));
        } else if suppression > 50.0 {
            warnings.push(format!("Major growth suppression ({:.1}%)", suppression));
        }
        if let Some((days, _)) = recovered {
            if days > 14.0 {
                warnings.push(format!("Slow recovery ({:.1} days)", days));
            }
        }
        report_warnings(Parameter::EA, &warnings);

        let (recovery_time, growth_recovery) =
            recovered.unwrap_or((DEFAULT_RECOVERY_DAYS, inputs.stressed_growth));

        Ok(EaResult {
            value,
            growth_control: inputs.control_growth,
            growth_stressed: inputs.stressed_growth,
            growth_recovery,
            suppression_percent: suppression,
            recovery_time,
            lambda,
            resilience_class: ResilienceClass::from_value(value),
            n_measurements: inputs.n_tips_control + inputs.n_tips_stressed,
            warnings,
        })
    }

    /// E_a proxy from field observations. Clamped to [0.1, 1.0].
    pub fn estimate_from_field_data(
        ndvi_decline: f64,
        soil_moisture: f64,
        fungal_richness: u32,
        disturbance_severity: f64,
    ) -> f64 {
        let base = (fungal_richness as f64 / 20.0).min(1.0);
        let disturbance = 1.0 - disturbance_severity;
        let drought = 1.0 - (ndvi_decline / 100.0) * (1.0 - soil_moisture / 100.0);
        (base * disturbance * drought).clamp(0.1, 1.0)
    }
}
