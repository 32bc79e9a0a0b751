//! ∇C, chemotropic navigation accuracy.
//!
//! Compares each segment of a tracked hyphal tip trajectory against the
//! chemical gradient direction and weights the resulting accuracy by how
//! directed the growth is overall (the chemotactic index).

use crate::core::Parameter;
use crate::parameters::{impl_measurement, report_warnings};
use crate::stats;
use serde::{Deserialize, Serialize};

const MIN_SEGMENT: f64 = 1e-6;

/// Tracked tip position in µm at time `t` seconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub t: f64,
}

impl Point3 {
    pub fn new(x: f64, y: f64, z: f64, t: f64) -> Self {
        Self { x, y, z, t }
    }

    /// Planar tracking data; z is fixed at 0
    pub fn planar(x: f64, y: f64, t: f64) -> Self {
        Self::new(x, y, 0.0, t)
    }

    fn delta(&self, to: &Point3) -> [f64; 3] {
        [to.x - self.x, to.y - self.y, to.z - self.z]
    }

    fn position(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }
}

/// Chemical gradient direction (unit vector) and source position
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GradientField {
    pub direction: [f64; 3],
    pub source: [f64; 3],
}

impl GradientField {
    /// Normalizes `direction`; a zero vector falls back to +x
    pub fn new(direction: [f64; 3], source: [f64; 3]) -> Self {
        let direction = unit(direction).unwrap_or([1.0, 0.0, 0.0]);
        Self { direction, source }
    }

    /// Net displacement of the trajectory, with the source at its end point
    pub fn from_trajectory(points: &[Point3]) -> Self {
        match (points.first(), points.last()) {
            (Some(start), Some(end)) if points.len() >= 2 => {
                Self::new(start.delta(end), end.position())
            }
            _ => Self::new([1.0, 0.0, 0.0], [0.0; 3]),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradCResult {
    pub value: f64,
    /// Mean per-segment deviation in degrees
    pub angular_error: f64,
    pub max_deviation: f64,
    /// µm
    pub trajectory_length: f64,
    pub n_points: usize,
    pub gradient_direction: [f64; 3],
    pub chemotactic_index: f64,
    pub warnings: Vec<String>,
}

impl_measurement!(GradCResult, Parameter::GradC);

fn norm(v: [f64; 3]) -> f64 {
    (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt()
}

fn dot(a: [f64; 3], b: [f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

fn unit(v: [f64; 3]) -> Option<[f64; 3]> {
    let n = norm(v);
    if n > 0.0 {
        Some([v[0] / n, v[1] / n, v[2] / n])
    } else {
        None
    }
}

#[derive(Debug, Clone, Default)]
pub struct GradCCalculator;

impl GradCCalculator {
    pub fn new() -> Self {
        Self
    }

    /// Angle in degrees between each non-degenerate segment and the gradient
    pub fn segment_errors(points: &[Point3], gradient: &GradientField) -> Vec<f64> {
        points
            .windows(2)
            .filter_map(|pair| {
                let delta = pair[0].delta(&pair[1]);
                if norm(delta) < MIN_SEGMENT {
                    return None;
                }
                let direction = unit(delta)?;
                Some(dot(direction, gradient.direction).clamp(-1.0, 1.0).acos().to_degrees())
            })
            .collect()
    }

    /// Path length projected toward the source over total path length
    pub fn chemotactic_index(points: &[Point3], gradient: &GradientField) -> f64 {
        if points.len() < 2 {
            return 0.0;
        }
        let start = points[0];
        let to_source = [
            gradient.source[0] - start.x,
            gradient.source[1] - start.y,
            gradient.source[2] - start.z,
        ];
        let distance = norm(to_source);
        if distance < MIN_SEGMENT {
            return 1.0;
        }
        let source_dir = [
            to_source[0] / distance,
            to_source[1] / distance,
            to_source[2] / distance,
        ];

        let (toward, total) = points.windows(2).fold((0.0, 0.0), |(toward, total), pair| {
            let delta = pair[0].delta(&pair[1]);
            let length = norm(delta);
            let projected = unit(delta)
                .map(|d| length * dot(d, source_dir).max(0.0))
                .unwrap_or(0.0);
            (toward + projected, total + length)
        });

        if total > 0.0 {
            toward / total
        } else {
            0.0
        }
    }

    pub fn compute(&self, points: &[Point3], gradient: Option<GradientField>) -> GradCResult {
        if points.len() < 2 {
            let warnings = vec!["Insufficient trajectory points".to_string()];
            report_warnings(Parameter::GradC, &warnings);
            return GradCResult {
                value: 0.0,
                angular_error: 90.0,
                max_deviation: 0.0,
                trajectory_length: 0.0,
                n_points: points.len(),
                gradient_direction: [0.0; 3],
                chemotactic_index: 0.0,
                warnings,
            };
        }

        let gradient = gradient.unwrap_or_else(|| GradientField::from_trajectory(points));
        let length: f64 = points
            .windows(2)
            .map(|pair| norm(pair[0].delta(&pair[1])))
            .sum();

        let errors = Self::segment_errors(points, &gradient);
        let mean_error = stats::mean(&errors);
        let max_error = errors.iter().copied().fold(0.0, f64::max);
        let ci = Self::chemotactic_index(points, &gradient);

        let accuracy = if mean_error < 20.0 {
            1.0 - mean_error / 180.0
        } else {
            (1.0 - mean_error / 90.0).max(0.0)
        };
        let raw = accuracy * (0.5 + 0.5 * ci);

        let mut warnings = Vec::new();
        if raw < 0.6 {
            warnings.push("Poor chemotropic navigation - possible gradient disruption".to_string());
        } else if raw < 0.78 {
            warnings.push("Reduced navigation accuracy".to_string());
        }
        if ci < 0.3 {
            warnings.push("Very weak chemotactic response".to_string());
        }
        if mean_error > 30.0 {
            warnings.push(format!("Large navigation error ({:.1}°)", mean_error));
        }
        report_warnings(Parameter::GradC, &warnings);

        GradCResult {
            value: raw.clamp(0.0, 1.0),
            angular_error: mean_error,
            max_deviation: max_error,
            trajectory_length: length,
            n_points: points.len(),
            gradient_direction: gradient.direction,
            chemotactic_index: ci,
            warnings,
        }
    }
}
