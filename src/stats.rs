//! Numeric helpers shared by the parameter calculators and result comparison.
//!
//! Conventions follow the usual scientific defaults: population standard
//! deviation, linear-interpolated percentiles and biased skewness.

use serde::{Deserialize, Serialize};

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population variance
pub fn variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64
}

/// Population standard deviation
pub fn std_dev(values: &[f64]) -> f64 {
    variance(values).sqrt()
}

fn sorted(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    sorted
}

/// Percentile in [0, 100] with linear interpolation between ranks
pub fn percentile(values: &[f64], q: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let sorted = sorted(values);
    let rank = (q.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let fraction = rank - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * fraction
}

pub fn median(values: &[f64]) -> f64 {
    percentile(values, 50.0)
}

/// Least-squares line `y = slope * x + intercept`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: f64,
}

impl LinearFit {
    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// Ordinary least squares. `None` for fewer than two points, mismatched
/// lengths or a degenerate x range.
pub fn linear_fit(xs: &[f64], ys: &[f64]) -> Option<LinearFit> {
    if xs.len() != ys.len() || xs.len() < 2 {
        return None;
    }
    let mx = mean(xs);
    let my = mean(ys);
    let sxx: f64 = xs.iter().map(|x| (x - mx).powi(2)).sum();
    if sxx == 0.0 {
        return None;
    }
    let sxy: f64 = xs.iter().zip(ys).map(|(x, y)| (x - mx) * (y - my)).sum();
    let slope = sxy / sxx;
    let intercept = my - slope * mx;

    let ss_tot: f64 = ys.iter().map(|y| (y - my).powi(2)).sum();
    let ss_res: f64 = xs
        .iter()
        .zip(ys)
        .map(|(x, y)| (y - (slope * x + intercept)).powi(2))
        .sum();
    let r_squared = if ss_tot > 0.0 {
        1.0 - ss_res / ss_tot
    } else {
        0.0
    };

    Some(LinearFit {
        slope,
        intercept,
        r_squared,
    })
}

/// Pearson correlation; `None` when either series has zero variance
pub fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    if xs.len() != ys.len() || xs.len() < 2 {
        return None;
    }
    let mx = mean(xs);
    let my = mean(ys);
    let sxy: f64 = xs.iter().zip(ys).map(|(x, y)| (x - mx) * (y - my)).sum();
    let sxx: f64 = xs.iter().map(|x| (x - mx).powi(2)).sum();
    let syy: f64 = ys.iter().map(|y| (y - my).powi(2)).sum();
    if sxx == 0.0 || syy == 0.0 {
        return None;
    }
    Some((sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0))
}

/// Biased sample skewness; 0.0 for constant or empty input
pub fn skewness(values: &[f64]) -> f64 {
    let sd = std_dev(values);
    if values.is_empty() || sd == 0.0 {
        return 0.0;
    }
    let m = mean(values);
    let m3 = values.iter().map(|v| (v - m).powi(3)).sum::<f64>() / values.len() as f64;
    m3 / sd.powi(3)
}

/// Map a value onto [0, 1] given its reference range. A degenerate range
/// maps everything to the midpoint.
pub fn normalize_value(value: f64, min: f64, max: f64, clip: bool) -> f64 {
    if max <= min {
        return 0.5;
    }
    let normalized = (value - min) / (max - min);
    if clip {
        normalized.clamp(0.0, 1.0)
    } else {
        normalized
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutlierMethod {
    /// Outside `[q1 - t*iqr, q3 + t*iqr]`
    Iqr,
    /// `|z| > t`
    ZScore,
}

/// Indices of outlying values. Fewer than four points never yield outliers.
pub fn detect_outliers(data: &[f64], method: OutlierMethod, threshold: f64) -> Vec<usize> {
    if data.len() < 4 {
        return Vec::new();
    }
    match method {
        OutlierMethod::Iqr => {
            let q1 = percentile(data, 25.0);
            let q3 = percentile(data, 75.0);
            let iqr = q3 - q1;
            let lower = q1 - threshold * iqr;
            let upper = q3 + threshold * iqr;
            data.iter()
                .enumerate()
                .filter(|(_, &v)| v < lower || v > upper)
                .map(|(i, _)| i)
                .collect()
        }
        OutlierMethod::ZScore => {
            let m = mean(data);
            let sd = std_dev(data);
            if sd == 0.0 {
                return Vec::new();
            }
            data.iter()
                .enumerate()
                .filter(|(_, &v)| ((v - m) / sd).abs() > threshold)
                .map(|(i, _)| i)
                .collect()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceMethod {
    /// `1 - std/mean`
    Std,
    /// `1 / (1 + cv)`
    Cv,
}

/// Confidence in [0, 1] from repeated measurements
pub fn calculate_confidence(measurements: &[f64], method: ConfidenceMethod) -> f64 {
    match measurements.len() {
        0 => return 0.0,
        1 => return 0.7,
        _ => {}
    }
    let m = mean(measurements);
    if m == 0.0 {
        return 0.5;
    }
    let sd = std_dev(measurements);
    let confidence = match method {
        ConfidenceMethod::Std => 1.0 - sd / m,
        ConfidenceMethod::Cv => 1.0 / (1.0 + sd / m),
    };
    confidence.clamp(0.0, 1.0)
}
