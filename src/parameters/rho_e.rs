//! ρ_e, bioelectrical pulse density.
//!
//! Spike trains from a multi-electrode recording are summarized as
//! `mean rate · mean amplitude + α · coherence`, then scaled to [0, 1].
//! Per-electrode detection runs in parallel.

use crate::core::Parameter;
use crate::errors::{Error, Result};
use crate::parameters::{impl_measurement, report_warnings};
use crate::stats;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Weight of cross-electrode coherence in the raw density
const ALPHA: f64 = 0.35;
/// Raw density mapped to 1.0
const RAW_SCALE: f64 = 150.0;
/// Spikes rising faster than this are treated as movement artifacts
const MIN_RISE_SECONDS: f64 = 0.005;
const MIN_WIDTH_SAMPLES: f64 = 5.0;
const MAX_WIDTH_SAMPLES: f64 = 500.0;
/// Frequencies above this are ignored when estimating the dominant rhythm
const SLOW_RHYTHM_HZ: f64 = 0.1;

/// Voltage traces in mV, one channel per electrode, sampled at `sampling_rate` Hz
#[derive(Debug, Clone, PartialEq)]
pub struct Recording {
    sampling_rate: f64,
    channels: Vec<Vec<f64>>,
}

impl Recording {
    pub fn new(sampling_rate: f64, channels: Vec<Vec<f64>>) -> Result<Self> {
        if !(sampling_rate.is_finite() && sampling_rate > 0.0) {
            return Err(Error::invalid_input(format!(
                "sampling rate must be positive, got {}",
                sampling_rate
            )));
        }
        if let Some(first) = channels.first() {
            if let Some(bad) = channels.iter().position(|c| c.len() != first.len()) {
                return Err(Error::invalid_input(format!(
                    "electrode {} has {} samples, expected {}",
                    bad,
                    channels[bad].len(),
                    first.len()
                )));
            }
        }
        Ok(Self {
            sampling_rate,
            channels,
        })
    }

    /// Build from a `samples x electrodes` matrix
    pub fn from_samples(sampling_rate: f64, rows: &[Vec<f64>]) -> Result<Self> {
        let n_electrodes = rows.first().map_or(0, Vec::len);
        if let Some(bad) = rows.iter().position(|r| r.len() != n_electrodes) {
            return Err(Error::invalid_input(format!(
                "sample {} has {} electrodes, expected {}",
                bad,
                rows[bad].len(),
                n_electrodes
            )));
        }
        let channels = (0..n_electrodes)
            .map(|e| rows.iter().map(|row| row[e]).collect())
            .collect();
        Self::new(sampling_rate, channels)
    }

    pub fn sampling_rate(&self) -> f64 {
        self.sampling_rate
    }

    pub fn n_electrodes(&self) -> usize {
        self.channels.len()
    }

    pub fn n_samples(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }

    pub fn channel(&self, electrode: usize) -> Option<&[f64]> {
        self.channels.get(electrode).map(Vec::as_slice)
    }

    pub fn duration_hours(&self) -> f64 {
        self.n_samples() as f64 / self.sampling_rate / 3600.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpikeEvent {
    /// seconds from recording start
    pub timestamp: f64,
    /// mV above baseline
    pub amplitude: f64,
    /// half-height width, seconds
    pub duration: f64,
    pub electrode_id: usize,
    pub rise_time: f64,
    pub decay_time: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpikeDetection {
    pub threshold_sigma: f64,
    /// seconds
    pub min_interval: f64,
    pub artifact_rejection: bool,
}

impl Default for SpikeDetection {
    fn default() -> Self {
        Self {
            threshold_sigma: 3.0,
            min_interval: 0.5,
            artifact_rejection: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityPattern {
    Normal,
    Burst,
    Stress,
    Dormant,
}

impl ActivityPattern {
    /// From per-electrode spike rates (spikes/hour, silent electrodes
    /// included) and network coherence
    pub fn classify(spike_rates: &[f64], coherence: f64) -> Self {
        let mean_rate = stats::mean(spike_rates);
        let rate_std = if spike_rates.len() > 1 {
            stats::std_dev(spike_rates)
        } else {
            0.0
        };
        if mean_rate < 5.0 {
            ActivityPattern::Dormant
        } else if mean_rate > 50.0 && coherence > 0.6 {
            ActivityPattern::Burst
        } else if rate_std > mean_rate * 0.5 {
            ActivityPattern::Stress
        } else {
            ActivityPattern::Normal
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RhoEResult {
    pub value: f64,
    /// Mean over active electrodes, spikes/hour
    pub spike_rate: f64,
    /// Mean over active electrodes, mV
    pub mean_amplitude: f64,
    pub coherence: f64,
    pub spike_count: usize,
    pub active_electrodes: usize,
    /// Hz
    pub dominant_frequency: f64,
    pub pattern: ActivityPattern,
    pub warnings: Vec<String>,
}

impl_measurement!(RhoEResult, Parameter::RhoE);

#[derive(Debug, Clone)]
pub struct RhoECalculator {
    detection: SpikeDetection,
}

impl Default for RhoECalculator {
    fn default() -> Self {
        Self::new(SpikeDetection::default())
    }
}

/// Fractional sample positions where the peak crosses half its height
struct HalfHeight {
    left: f64,
    right: f64,
    clipped: bool,
}

fn half_height(signal: &[f64], peak: usize) -> HalfHeight {
    let half = signal[peak] / 2.0;

    let mut j = peak;
    while j > 0 && signal[j - 1] > half {
        j -= 1;
    }
    let (left, left_clipped) = if j == 0 {
        (0.0, true)
    } else {
        let (a, b) = (signal[j - 1], signal[j]);
        ((j - 1) as f64 + (half - a) / (b - a), false)
    };

    let mut k = peak;
    while k + 1 < signal.len() && signal[k + 1] > half {
        k += 1;
    }
    let (right, right_clipped) = if k + 1 == signal.len() {
        (k as f64, true)
    } else {
        let (a, b) = (signal[k], signal[k + 1]);
        (k as f64 + (a - half) / (a - b), false)
    };

    HalfHeight {
        left,
        right,
        clipped: left_clipped || right_clipped,
    }
}

impl RhoECalculator {
    pub fn new(detection: SpikeDetection) -> Self {
        Self { detection }
    }

    pub fn detection(&self) -> &SpikeDetection {
        &self.detection
    }

    /// Detect spikes on one electrode trace.
    ///
    /// Peaks must be local maxima at least `threshold_sigma` standard
    /// deviations above the median baseline, at least `min_interval` apart
    /// (the taller peak wins) and 5-500 samples wide at half height.
    pub fn detect_spikes(
        &self,
        trace: &[f64],
        sampling_rate: f64,
        electrode_id: usize,
    ) -> Vec<SpikeEvent> {
        if trace.len() < 3 {
            return Vec::new();
        }
        let dt = 1.0 / sampling_rate;
        let baseline = stats::median(trace);
        let signal: Vec<f64> = trace.iter().map(|v| v - baseline).collect();
        let threshold = self.detection.threshold_sigma * stats::std_dev(&signal);
        if !(threshold > 0.0) {
            return Vec::new();
        }

        let mut candidates: Vec<usize> = (1..signal.len() - 1)
            .filter(|&i| {
                signal[i] >= threshold && signal[i] > signal[i - 1] && signal[i] >= signal[i + 1]
            })
            .collect();

        // Enforce the refractory distance, keeping taller peaks first
        let distance = (self.detection.min_interval / dt) as usize;
        candidates.sort_by(|&a, &b| {
            signal[b]
                .partial_cmp(&signal[a])
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.cmp(&b))
        });
        let mut kept: Vec<usize> = Vec::new();
        for peak in candidates {
            if kept.iter().all(|&k| k.abs_diff(peak) >= distance.max(1)) {
                kept.push(peak);
            }
        }
        kept.sort_unstable();

        kept.into_iter()
            .filter_map(|peak| {
                let hh = half_height(&signal, peak);
                let width = hh.right - hh.left;
                if !(MIN_WIDTH_SAMPLES..=MAX_WIDTH_SAMPLES).contains(&width) {
                    return None;
                }
                let (rise, decay) = if hh.clipped {
                    (width * dt / 2.0, width * dt / 2.0)
                } else {
                    ((peak as f64 - hh.left) * dt, (hh.right - peak as f64) * dt)
                };
                if self.detection.artifact_rejection && rise < MIN_RISE_SECONDS {
                    return None;
                }
                Some(SpikeEvent {
                    timestamp: peak as f64 * dt,
                    amplitude: signal[peak],
                    duration: width * dt,
                    electrode_id,
                    rise_time: rise,
                    decay_time: decay,
                })
            })
            .collect()
    }

    /// Mean pairwise Pearson correlation of per-second summed spike
    /// amplitudes, floored at 0. Pairs involving a silent electrode count
    /// as uncorrelated.
    pub fn coherence(spikes: &[Vec<SpikeEvent>], duration_seconds: f64) -> f64 {
        if spikes.len() < 2 {
            return 0.0;
        }
        let n_bins = (duration_seconds.ceil() as usize).max(1);
        let series: Vec<Vec<f64>> = spikes
            .iter()
            .map(|train| {
                let mut bins = vec![0.0; n_bins];
                for spike in train {
                    let bin = (spike.timestamp as usize).min(n_bins - 1);
                    bins[bin] += spike.amplitude;
                }
                bins
            })
            .collect();

        let mut total = 0.0;
        let mut pairs = 0usize;
        for i in 0..series.len() {
            for j in i + 1..series.len() {
                total += stats::pearson(&series[i], &series[j]).unwrap_or(0.0);
                pairs += 1;
            }
        }
        (total / pairs as f64).max(0.0)
    }

    /// Median frequency below 0.1 Hz of the first electrode with more than
    /// ten spikes; 0 when there is none.
    pub fn dominant_frequency(spikes: &[Vec<SpikeEvent>]) -> f64 {
        let Some(train) = spikes.iter().find(|train| train.len() > 10) else {
            return 0.0;
        };
        let slow: Vec<f64> = train
            .windows(2)
            .map(|pair| pair[1].timestamp - pair[0].timestamp)
            .filter(|&interval| interval > 0.0)
            .map(|interval| 1.0 / interval)
            .filter(|&f| f < SLOW_RHYTHM_HZ)
            .collect();
        if slow.is_empty() {
            0.0
        } else {
            stats::median(&slow)
        }
    }

    /// Compute ρ_e for a recording. `duration_hours` overrides the
    /// duration implied by the sample count for spike rates only.
    pub fn compute(
        &self,
        recording: &Recording,
        duration_hours: Option<f64>,
    ) -> Result<RhoEResult> {
        let hours = duration_hours.unwrap_or_else(|| recording.duration_hours());
        if !(hours.is_finite() && hours > 0.0) {
            return Err(Error::invalid_input(format!(
                "rho_e needs a positive finite recording duration, got {} h",
                hours
            )));
        }

        let spikes: Vec<Vec<SpikeEvent>> = recording
            .channels
            .par_iter()
            .enumerate()
            .map(|(electrode, trace)| {
                self.detect_spikes(trace, recording.sampling_rate, electrode)
            })
            .collect();

        let spike_rates: Vec<f64> = spikes.iter().map(|s| s.len() as f64 / hours).collect();
        let active: Vec<usize> = (0..spikes.len()).filter(|&e| !spikes[e].is_empty()).collect();
        let (mean_rate, mean_amplitude) = if active.is_empty() {
            (0.0, 0.0)
        } else {
            let rates: Vec<f64> = active.iter().map(|&e| spike_rates[e]).collect();
            let amplitudes: Vec<f64> = active
                .iter()
                .map(|&e| stats::mean(&spikes[e].iter().map(|s| s.amplitude).collect::<Vec<_>>()))
                .collect();
            (stats::mean(&rates), stats::mean(&amplitudes))
        };

        // Bins follow the samples actually recorded; the override only scales rates
        let recorded_seconds = recording.n_samples() as f64 / recording.sampling_rate;
        let coherence = Self::coherence(&spikes, recorded_seconds);
        let raw = if active.is_empty() {
            0.0
        } else {
            mean_rate * mean_amplitude + ALPHA * coherence * 100.0
        };
        let value = (raw / RAW_SCALE).clamp(0.0, 1.0);
        let pattern = ActivityPattern::classify(&spike_rates, coherence);
        let spike_count = spikes.iter().map(Vec::len).sum();

        debug!(
            electrodes = recording.n_electrodes(),
            active = active.len(),
            spike_count,
            coherence,
            "Detected spike trains"
        );

        let mut warnings = Vec::new();
        if value < 0.2 {
            warnings.push("Critically low electrical activity".to_string());
        } else if value < 0.35 {
            warnings.push("Reduced electrical activity - possible stress".to_string());
        }
        if coherence < 0.3 && active.len() > 1 {
            warnings.push("Low network coherence - possible fragmentation".to_string());
        }
        match pattern {
            ActivityPattern::Stress => {
                warnings.push("Stress pattern detected in electrical activity".to_string())
            }
            ActivityPattern::Burst => {
                warnings.push("Burst activity detected - possible awakening event".to_string())
            }
            _ => {}
        }
        report_warnings(Parameter::RhoE, &warnings);

        Ok(RhoEResult {
            value,
            spike_rate: mean_rate,
            mean_amplitude,
            coherence,
            spike_count,
            active_electrodes: active.len(),
            dominant_frequency: Self::dominant_frequency(&spikes),
            pattern,
            warnings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RATE: f64 = 1000.0;

    /// Triangular spike: 20-sample rise, 40-sample decay
    fn add_spike(trace: &mut [f64], at: usize, amplitude: f64) {
        for d in 0..=20usize {
            if let Some(v) = at.checked_sub(d).and_then(|i| trace.get_mut(i)) {
                *v += amplitude * (1.0 - d as f64 / 20.0);
            }
        }
        for d in 1..=40usize {
            if let Some(v) = trace.get_mut(at + d) {
                *v += amplitude * (1.0 - d as f64 / 40.0);
            }
        }
    }

    fn periodic_trace(seconds: usize, every: usize, amplitude: f64) -> Vec<f64> {
        let mut trace = vec![0.0; seconds * RATE as usize];
        let mut at = 500;
        while at + 100 < trace.len() {
            add_spike(&mut trace, at, amplitude);
            at += every;
        }
        trace
    }

    #[test]
    fn detects_periodic_spikes() {
        let trace = periodic_trace(60, 2000, 50.0);
        let spikes = RhoECalculator::default().detect_spikes(&trace, RATE, 0);
        assert_eq!(spikes.len(), 30);
        let first = spikes[0];
        assert!((first.timestamp - 0.5).abs() < 1e-9);
        assert!((first.amplitude - 50.0).abs() < 1e-9);
        assert!((first.rise_time - 0.010).abs() < 1e-9);
        assert!((first.duration - 0.030).abs() < 1e-9);
    }

    #[test]
    fn artifact_rejection_drops_instant_rise() {
        let mut trace = vec![0.0; 5000];
        trace[1000] = 50.0;
        for d in 1..=40usize {
            trace[1000 + d] = 50.0 * (1.0 - d as f64 / 40.0);
        }
        let strict = RhoECalculator::default();
        assert!(strict.detect_spikes(&trace, RATE, 0).is_empty());

        let lenient = RhoECalculator::new(SpikeDetection {
            artifact_rejection: false,
            ..SpikeDetection::default()
        });
        assert_eq!(lenient.detect_spikes(&trace, RATE, 0).len(), 1);
    }

    #[test]
    fn refractory_distance_keeps_taller_peak() {
        let mut trace = vec![0.0; 5000];
        add_spike(&mut trace, 1000, 40.0);
        add_spike(&mut trace, 1150, 60.0);
        let spikes = RhoECalculator::default().detect_spikes(&trace, RATE, 3);
        assert_eq!(spikes.len(), 1);
        assert!((spikes[0].timestamp - 1.15).abs() < 1e-9);
        assert_eq!(spikes[0].electrode_id, 3);
    }

    #[test]
    fn synchronized_electrodes_burst() {
        let trace = periodic_trace(60, 2000, 50.0);
        let recording = Recording::new(RATE, vec![trace.clone(), trace]).unwrap();
        let result = RhoECalculator::default().compute(&recording, None).unwrap();
        assert_eq!(result.active_electrodes, 2);
        assert_eq!(result.spike_count, 60);
        assert!((result.coherence - 1.0).abs() < 1e-9);
        assert_eq!(result.value, 1.0);
        assert_eq!(result.pattern, ActivityPattern::Burst);
        assert!((result.spike_rate - 1800.0).abs() < 1e-6);
    }

    #[test]
    fn duration_override_leaves_coherence_alone() {
        let trace = periodic_trace(10, 2000, 50.0);
        let recording = Recording::new(RATE, vec![trace.clone(), trace]).unwrap();
        let calculator = RhoECalculator::default();
        let natural = calculator.compute(&recording, None).unwrap();
        let short = calculator.compute(&recording, Some(0.0001)).unwrap();
        assert!((natural.coherence - 1.0).abs() < 1e-9);
        assert_eq!(short.coherence, natural.coherence);
        assert!(short.spike_rate > natural.spike_rate);
    }

    #[test]
    fn non_finite_duration_rejected() {
        let recording = Recording::new(RATE, vec![periodic_trace(10, 2000, 50.0); 2]).unwrap();
        let calculator = RhoECalculator::default();
        for hours in [f64::INFINITY, f64::NAN, 0.0, -1.0] {
            let err = calculator.compute(&recording, Some(hours)).unwrap_err();
            assert!(matches!(err, Error::InvalidInput(_)), "{} h", hours);
        }
    }

    #[test]
    fn flat_recording_is_dormant() {
        let recording = Recording::new(RATE, vec![vec![0.0; 2000]; 3]).unwrap();
        let result = RhoECalculator::default().compute(&recording, None).unwrap();
        assert_eq!(result.value, 0.0);
        assert_eq!(result.pattern, ActivityPattern::Dormant);
        assert_eq!(result.coherence, 0.0);
        assert!(result.warnings.iter().any(|w| w.starts_with("Critically low")));
    }

    #[test]
    fn samples_by_electrodes_layout() {
        let rows = vec![vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]];
        let recording = Recording::from_samples(RATE, &rows).unwrap();
        assert_eq!(recording.n_electrodes(), 2);
        assert_eq!(recording.n_samples(), 3);
        assert_eq!(recording.channel(1), Some(&[2.0, 4.0, 6.0][..]));
    }

    #[test]
    fn invalid_recordings_rejected() {
        assert!(Recording::new(0.0, vec![vec![0.0; 10]]).is_err());
        assert!(Recording::new(RATE, vec![vec![0.0; 10], vec![0.0; 9]]).is_err());
        assert!(Recording::from_samples(RATE, &[vec![1.0, 2.0], vec![1.0]]).is_err());
        let empty = Recording::new(RATE, vec![]).unwrap();
        assert!(RhoECalculator::default().compute(&empty, None).is_err());
    }

    #[test]
    fn dominant_frequency_of_slow_rhythm() {
        let train: Vec<SpikeEvent> = (0..12)
            .map(|i| SpikeEvent {
                timestamp: i as f64 * 20.0,
                amplitude: 30.0,
                duration: 0.03,
                electrode_id: 0,
                rise_time: 0.01,
                decay_time: 0.02,
            })
            .collect();
        assert!((RhoECalculator::dominant_frequency(&[train]) - 0.05).abs() < 1e-12);
        assert_eq!(RhoECalculator::dominant_frequency(&[]), 0.0);
    }

    #[test]
    fn pattern_classification() {
        assert_eq!(ActivityPattern::classify(&[1.0, 2.0], 0.9), ActivityPattern::Dormant);
        assert_eq!(ActivityPattern::classify(&[60.0, 60.0], 0.9), ActivityPattern::Burst);
        assert_eq!(ActivityPattern::classify(&[40.0, 0.0], 0.1), ActivityPattern::Stress);
        assert_eq!(ActivityPattern::classify(&[20.0, 22.0], 0.1), ActivityPattern::Normal);
    }
}
