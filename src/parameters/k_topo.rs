//! K_topo, topological expansion rate.
//!
//! Box-counting fractal dimension of a binarized network image or volume:
//! the slope of `ln N(ε)` against `ln(1/ε)` over log-spaced box sizes.

use crate::core::Parameter;
use crate::errors::{Error, Result};
use crate::parameters::{impl_measurement, report_warnings};
use crate::stats::linear_fit;
use serde::{Deserialize, Serialize};

const N_SCALES: usize = 20;
const OTSU_BINS: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkClass {
    Linear,
    Sparse,
    Transitional,
    Foraging,
    SpaceFilling,
    Unknown,
}

impl NetworkClass {
    pub fn from_dimension(d_f: f64) -> Self {
        match d_f {
            d if d < 1.35 => NetworkClass::Linear,
            d if d < 1.54 => NetworkClass::Sparse,
            d if d < 1.72 => NetworkClass::Transitional,
            d if d < 1.85 => NetworkClass::Foraging,
            d if d <= 1.95 => NetworkClass::SpaceFilling,
            _ => NetworkClass::Unknown,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExplorationType {
    Low,
    Medium,
    High,
}

/// Row-major 2-D occupancy grid; `true` marks hyphae
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryImage {
    height: usize,
    width: usize,
    data: Vec<bool>,
}

impl BinaryImage {
    pub fn new(height: usize, width: usize, data: Vec<bool>) -> Result<Self> {
        if data.len() != height * width {
            return Err(Error::invalid_input(format!(
                "image of {}x{} needs {} pixels, got {}",
                height,
                width,
                height * width,
                data.len()
            )));
        }
        Ok(Self {
            height,
            width,
            data,
        })
    }

    pub fn empty(height: usize, width: usize) -> Self {
        Self {
            height,
            width,
            data: vec![false; height * width],
        }
    }

    /// Binarize a grayscale image. Without an explicit threshold Otsu's
    /// method picks one; pixels strictly above it are set.
    pub fn from_grayscale(
        height: usize,
        width: usize,
        pixels: &[f64],
        threshold: Option<f64>,
    ) -> Result<Self> {
        let threshold = threshold.unwrap_or_else(|| otsu_threshold(pixels));
        Self::new(height, width, pixels.iter().map(|&p| p > threshold).collect())
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn get(&self, row: usize, col: usize) -> bool {
        self.data[row * self.width + col]
    }

    pub fn set(&mut self, row: usize, col: usize, value: bool) {
        self.data[row * self.width + col] = value;
    }

    fn min_side(&self) -> usize {
        self.height.min(self.width)
    }

    /// Number of `size`-sided boxes containing at least one set pixel
    pub fn count_boxes(&self, size: usize) -> usize {
        let size = size.max(1);
        let cols = self.width.div_ceil(size);
        let mut occupied = vec![false; self.height.div_ceil(size) * cols];
        for (index, _) in self.data.iter().enumerate().filter(|(_, &set)| set) {
            let (row, col) = (index / self.width, index % self.width);
            occupied[(row / size) * cols + col / size] = true;
        }
        occupied.iter().filter(|&&o| o).count()
    }
}

/// Depth-major 3-D occupancy grid
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryVolume {
    depth: usize,
    height: usize,
    width: usize,
    data: Vec<bool>,
}

impl BinaryVolume {
    pub fn new(depth: usize, height: usize, width: usize, data: Vec<bool>) -> Result<Self> {
        if data.len() != depth * height * width {
            return Err(Error::invalid_input(format!(
                "volume of {}x{}x{} needs {} voxels, got {}",
                depth,
                height,
                width,
                depth * height * width,
                data.len()
            )));
        }
        Ok(Self {
            depth,
            height,
            width,
            data,
        })
    }

    fn min_side(&self) -> usize {
        self.depth.min(self.height).min(self.width)
    }

    pub fn count_boxes(&self, size: usize) -> usize {
        let size = size.max(1);
        let rows = self.height.div_ceil(size);
        let cols = self.width.div_ceil(size);
        let mut occupied = vec![false; self.depth.div_ceil(size) * rows * cols];
        let plane = self.height * self.width;
        for (index, _) in self.data.iter().enumerate().filter(|(_, &set)| set) {
            let z = index / plane;
            let row = (index % plane) / self.width;
            let col = index % self.width;
            occupied[((z / size) * rows + row / size) * cols + col / size] = true;
        }
        occupied.iter().filter(|&&o| o).count()
    }
}

/// Otsu's threshold over a 256-bin histogram spanning the data range
pub fn otsu_threshold(pixels: &[f64]) -> f64 {
    let min = pixels.iter().copied().fold(f64::INFINITY, f64::min);
    let max = pixels.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if pixels.is_empty() || max <= min {
        return if min.is_finite() { min } else { 0.0 };
    }

    let bin_width = (max - min) / OTSU_BINS as f64;
    let mut histogram = [0usize; OTSU_BINS];
    for &p in pixels {
        let bin = (((p - min) / bin_width) as usize).min(OTSU_BINS - 1);
        histogram[bin] += 1;
    }

    let total = pixels.len() as f64;
    let center = |bin: usize| min + (bin as f64 + 0.5) * bin_width;
    let grand_sum: f64 = histogram
        .iter()
        .enumerate()
        .map(|(bin, &n)| n as f64 * center(bin))
        .sum();

    let mut best = (f64::NEG_INFINITY, 0usize);
    let mut weight_below = 0.0;
    let mut sum_below = 0.0;
    for (bin, &n) in histogram.iter().enumerate().take(OTSU_BINS - 1) {
        weight_below += n as f64;
        sum_below += n as f64 * center(bin);
        let weight_above = total - weight_below;
        if weight_below == 0.0 || weight_above == 0.0 {
            continue;
        }
        let mean_below = sum_below / weight_below;
        let mean_above = (grand_sum - sum_below) / weight_above;
        let between = weight_below * weight_above * (mean_below - mean_above).powi(2);
        if between > best.0 {
            best = (between, bin);
        }
    }
    min + (best.1 as f64 + 1.0) * bin_width
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KTopoResult {
    /// Fractal dimension D_f
    pub value: f64,
    pub box_counts: Vec<usize>,
    pub box_sizes: Vec<usize>,
    pub r_squared: f64,
    pub n_scales: usize,
    pub confidence: f64,
    pub network_class: NetworkClass,
    pub warnings: Vec<String>,
}

impl_measurement!(KTopoResult, Parameter::KTopo);

#[derive(Debug, Clone)]
pub struct KTopoCalculator {
    min_box: f64,
    max_box: f64,
}

impl Default for KTopoCalculator {
    fn default() -> Self {
        Self::new(1.0, 1000.0)
    }
}

impl KTopoCalculator {
    pub fn new(min_box: f64, max_box: f64) -> Self {
        Self { min_box, max_box }
    }

    /// Distinct integer box sizes, log-spaced between `min_box` and the
    /// smaller of `max_box` and the shortest side. Sizes reaching the
    /// shortest side are dropped.
    pub fn box_sizes(&self, min_side: usize) -> Vec<usize> {
        let upper = self.max_box.min(min_side as f64);
        if upper <= 0.0 || self.min_box <= 0.0 {
            return Vec::new();
        }
        let (lo, hi) = (self.min_box.log10(), upper.log10());
        let mut sizes: Vec<usize> = (0..N_SCALES)
            .map(|i| {
                let exponent = lo + (hi - lo) * i as f64 / (N_SCALES - 1) as f64;
                (10f64.powf(exponent) as usize).max(1)
            })
            .filter(|&size| size < min_side)
            .collect();
        sizes.dedup();
        sizes
    }

    /// `(D_f, r²)` from box counts; fewer than three scales give `(0, 0)`
    pub fn fractal_dimension(box_counts: &[usize], box_sizes: &[usize]) -> (f64, f64) {
        if box_counts.len() < 3 || box_counts.len() != box_sizes.len() {
            return (0.0, 0.0);
        }
        let log_inv_eps: Vec<f64> = box_sizes.iter().map(|&s| -(s as f64).ln()).collect();
        let log_n: Vec<f64> = box_counts.iter().map(|&n| (n as f64).ln()).collect();
        linear_fit(&log_inv_eps, &log_n).map_or((0.0, 0.0), |fit| (fit.slope, fit.r_squared))
    }

    pub fn compute_from_image(&self, image: &BinaryImage) -> KTopoResult {
        let sizes = self.box_sizes(image.min_side());
        self.finish(sizes, |size| image.count_boxes(size))
    }

    pub fn compute_from_volume(&self, volume: &BinaryVolume) -> KTopoResult {
        let sizes = self.box_sizes(volume.min_side());
        self.finish(sizes, |size| volume.count_boxes(size))
    }

    fn finish(&self, sizes: Vec<usize>, count: impl Fn(usize) -> usize) -> KTopoResult {
        let (box_sizes, box_counts): (Vec<usize>, Vec<usize>) = sizes
            .into_iter()
            .map(|size| (size, count(size)))
            .filter(|&(_, n)| n > 0)
            .unzip();

        let (d_f, r_squared) = Self::fractal_dimension(&box_counts, &box_sizes);
        let n_scales = box_counts.len();
        let confidence = r_squared * (n_scales as f64 / 10.0).min(1.0);

        let mut warnings = Vec::new();
        if d_f < 1.35 {
            warnings.push("Critically low fractal dimension - network collapse".to_string());
        } else if d_f < 1.54 {
            warnings.push("Sparse network structure".to_string());
        }
        if r_squared < 0.9 {
            warnings.push("Poor fractal fit - possible multi-scale anomaly".to_string());
        }
        if n_scales < 5 {
            warnings.push("Limited scale range for fractal analysis".to_string());
        }
        report_warnings(Parameter::KTopo, &warnings);

        KTopoResult {
            value: d_f,
            box_counts,
            box_sizes,
            r_squared,
            n_scales,
            confidence,
            network_class: NetworkClass::from_dimension(d_f),
            warnings,
        }
    }

    /// D_f proxy from hyphal length density (cm/cm³) and branching
    /// frequency (per mm). Clamped to [1.2, 1.95].
    pub fn estimate_from_hyphal_density(
        hyphal_length: f64,
        branching_frequency: f64,
        exploration: ExplorationType,
    ) -> f64 {
        let base = match exploration {
            ExplorationType::Low => 1.4,
            ExplorationType::Medium => 1.6,
            ExplorationType::High => 1.8,
        };
        let density = if hyphal_length > 0.0 {
            ((hyphal_length / 100.0).log10() / 2.0).clamp(-0.2, 0.2)
        } else {
            -0.2
        };
        let branching = 0.1 * (branching_frequency - 2.0);
        (base + density + branching).clamp(1.2, 1.95)
    }
}
