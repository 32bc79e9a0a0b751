//! BFS, biological field stability.
//!
//! Inverse coefficient of variation of an MNIS time series, with trend and
//! lag-1 autocorrelation as early-warning signals of critical slowing down.

use crate::core::Parameter;
use crate::errors::{Error, Result};
use crate::parameters::{impl_measurement, report_warnings};
use crate::stats::{self, linear_fit, pearson};
use serde::{Deserialize, Serialize};

const MIN_POINTS: usize = 4;
const AR1_WINDOW: usize = 10;
const MAX_BFS: f64 = 2.0;
const DAYS_PER_YEAR: f64 = 365.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StabilityClass {
    Stable,
    Variable,
    Declining,
    Critical,
    InsufficientData,
}

impl StabilityClass {
    pub fn classify(bfs: f64, ar1: f64, trend: f64) -> Self {
        if bfs > 0.68 && ar1 < 0.3 && trend.abs() < 0.01 {
            StabilityClass::Stable
        } else if bfs > 0.48 && ar1 < 0.5 {
            StabilityClass::Variable
        } else if bfs > 0.28 && !(ar1 > 0.7 || trend < -0.02) {
            StabilityClass::Declining
        } else {
            StabilityClass::Critical
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BfsResult {
    /// 1/CV, capped to [0, 2]
    pub value: f64,
    pub cv: f64,
    pub mean_mnis: f64,
    pub std_mnis: f64,
    pub n_points: usize,
    pub time_span_days: f64,
    /// MNIS change per year
    pub trend_slope: f64,
    pub ar1_coefficient: f64,
    pub stability_class: StabilityClass,
    pub warnings: Vec<String>,
}

impl_measurement!(BfsResult, Parameter::Bfs);

/// Early-warning indicators comparing the start and end of a series
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TippingPointIndicators {
    pub variance_ratio: f64,
    pub ar1_ratio: f64,
    pub skewness_early: f64,
    pub skewness_late: f64,
    pub variance_increasing: bool,
    pub ar1_increasing: bool,
}

#[derive(Debug, Clone)]
pub struct BfsCalculator {
    window_years: u32,
}

impl Default for BfsCalculator {
    fn default() -> Self {
        Self::new(3)
    }
}

impl BfsCalculator {
    pub fn new(window_years: u32) -> Self {
        Self { window_years }
    }

    pub fn window_days(&self) -> f64 {
        self.window_years as f64 * DAYS_PER_YEAR
    }

    /// Lag-1 autocorrelation of the linearly detrended series
    pub fn ar1(values: &[f64]) -> f64 {
        if values.len() < 3 {
            return 0.0;
        }
        let xs: Vec<f64> = (0..values.len()).map(|i| i as f64).collect();
        let detrended: Vec<f64> = match linear_fit(&xs, values) {
            Some(fit) => values
                .iter()
                .zip(&xs)
                .map(|(v, &x)| v - fit.predict(x))
                .collect(),
            None => values.to_vec(),
        };
        let n = detrended.len();
        pearson(&detrended[..n - 1], &detrended[1..]).unwrap_or(0.0)
    }

    /// Least-squares slope of MNIS against time in years
    pub fn trend(values: &[f64], timestamps: &[f64]) -> f64 {
        let years: Vec<f64> = timestamps.iter().map(|t| t / DAYS_PER_YEAR).collect();
        linear_fit(&years, values).map_or(0.0, |fit| fit.slope)
    }

    /// Stability of an MNIS series sampled at `timestamps` (days).
    pub fn compute(&self, values: &[f64], timestamps: &[f64]) -> Result<BfsResult> {
        if values.len() != timestamps.len() {
            return Err(Error::invalid_input(format!(
                "bfs needs one timestamp per value ({} values, {} timestamps)",
                values.len(),
                timestamps.len()
            )));
        }

        let mean = stats::mean(values);
        let std = stats::std_dev(values);
        let span = time_span(timestamps);

        if values.len() < MIN_POINTS {
            let warnings = vec!["Insufficient data for stability analysis".to_string()];
            report_warnings(Parameter::Bfs, &warnings);
            return Ok(BfsResult {
                value: 0.0,
                cv: 0.0,
                mean_mnis: mean,
                std_mnis: std,
                n_points: values.len(),
                time_span_days: span,
                trend_slope: 0.0,
                ar1_coefficient: 0.0,
                stability_class: StabilityClass::InsufficientData,
                warnings,
            });
        }

        let (cv, bfs) = if mean != 0.0 {
            let cv = std / mean;
            (cv, if cv > 0.0 { 1.0 / cv } else { f64::INFINITY })
        } else {
            (0.0, 0.0)
        };

        let trend = Self::trend(values, timestamps);
        let recent = &values[values.len().saturating_sub(AR1_WINDOW)..];
        let ar1 = Self::ar1(recent);
        let stability_class = StabilityClass::classify(bfs, ar1, trend);

        let mut warnings = Vec::new();
        if bfs < 0.28 {
            warnings.push("Critically low stability - system near collapse".to_string());
        } else if bfs < 0.48 {
            warnings.push("Low stability - increasing variability".to_string());
        }
        if ar1 > 0.7 {
            warnings.push("High autocorrelation - critical slowing down detected".to_string());
        }
        if trend < -0.05 {
            warnings.push(format!("Rapid decline ({:.1}% per year)", trend * 100.0));
        } else if trend < -0.02 {
            warnings.push(format!("Moderate decline ({:.1}% per year)", trend * 100.0));
        }
        if span < 2.0 * DAYS_PER_YEAR {
            warnings.push("Time series shorter than 2 years - BFS may be unreliable".to_string());
        }
        report_warnings(Parameter::Bfs, &warnings);

        Ok(BfsResult {
            value: bfs.clamp(0.0, MAX_BFS),
            cv,
            mean_mnis: mean,
            std_mnis: std,
            n_points: values.len(),
            time_span_days: span,
            trend_slope: trend,
            ar1_coefficient: ar1,
            stability_class,
            warnings,
        })
    }

    /// Stability over the trailing rolling window ending at the latest sample
    pub fn compute_trailing_window(&self, values: &[f64], timestamps: &[f64]) -> Result<BfsResult> {
        if values.len() != timestamps.len() {
            return self.compute(values, timestamps);
        }
        let latest = timestamps.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let cutoff = latest - self.window_days();
        let (window_values, window_times): (Vec<f64>, Vec<f64>) = values
            .iter()
            .zip(timestamps)
            .filter(|(_, &t)| t >= cutoff)
            .map(|(&v, &t)| (v, t))
            .unzip();
        self.compute(&window_values, &window_times)
    }

    /// Compare the first and last `window_size` points. `None` when the
    /// series is shorter than two windows.
    pub fn detect_tipping_point(
        values: &[f64],
        window_size: usize,
    ) -> Option<TippingPointIndicators> {
        if window_size == 0 || values.len() < 2 * window_size {
            return None;
        }
        let early = &values[..window_size];
        let late = &values[values.len() - window_size..];

        let var_early = stats::variance(early);
        let variance_ratio = if var_early > 0.0 {
            stats::variance(late) / var_early
        } else {
            1.0
        };
        let ar1_early = Self::ar1(early);
        let ar1_ratio = if ar1_early != 0.0 {
            Self::ar1(late) / ar1_early
        } else {
            1.0
        };

        Some(TippingPointIndicators {
            variance_ratio,
            ar1_ratio,
            skewness_early: stats::skewness(early),
            skewness_late: stats::skewness(late),
            variance_increasing: variance_ratio > 1.5,
            ar1_increasing: ar1_ratio > 1.3,
        })
    }
}

fn time_span(timestamps: &[f64]) -> f64 {
    if timestamps.is_empty() {
        return 0.0;
    }
    let max = timestamps.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let min = timestamps.iter().copied().fold(f64::INFINITY, f64::min);
    max - min
}
