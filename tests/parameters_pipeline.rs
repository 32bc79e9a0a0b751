//! Calculators feeding the composite scorer

use mnis::models::{Ensemble, EnsembleInputs, Predictor};
use mnis::parameters::{
    assemble, AbiCalculator, AbiInputs, BfsCalculator, BinaryImage, EaCalculator, EaInputs,
    EtaNwCalculator, EtaNwInputs, GradCCalculator, KTopoCalculator, Measurement, Point3,
    Recording, RhoECalculator, SerCalculator, SerInputs,
};
use mnis::{score, Biome, MnisClass, Parameter};

/// Triangular spikes every two seconds on every electrode
fn synthetic_recording(electrodes: usize) -> Recording {
    let rate = 1000.0;
    let mut trace = vec![0.0; 30_000];
    for at in (500..29_000).step_by(2000) {
        for d in 0..=20usize {
            trace[at - d] = 40.0 * (1.0 - d as f64 / 20.0);
        }
        for d in 1..=40usize {
            trace[at + d] = 40.0 * (1.0 - d as f64 / 40.0);
        }
    }
    Recording::new(rate, vec![trace; electrodes]).unwrap()
}

fn branching_image() -> BinaryImage {
    let mut image = BinaryImage::empty(64, 64);
    for i in 0..64 {
        image.set(32, i, true);
        image.set(i, 16, true);
        image.set(i, 48, true);
        image.set(i, i, true);
    }
    image
}

#[test]
fn test_calculators_assemble_into_a_scorable_set() {
    let biome = Biome::TemperateBroadleaf;

    let eta = EtaNwCalculator::new()
        .compute(&EtaNwInputs::new(0.6, 1.0, 1.0))
        .unwrap();
    let rho = RhoECalculator::default()
        .compute(&synthetic_recording(4), None)
        .unwrap();
    let track: Vec<Point3> = (0..12)
        .map(|i| Point3::planar(i as f64 * 8.0, (i % 2) as f64, i as f64 * 30.0))
        .collect();
    let grad = GradCCalculator::new().compute(&track, None);
    let ser = SerCalculator::new(biome)
        .compute(&SerInputs::new(1.2, 1.0))
        .unwrap();
    let k = KTopoCalculator::default().compute_from_image(&branching_image());
    let ea = EaCalculator::new()
        .compute(&EaInputs::new(120.0, 90.0))
        .unwrap();
    let abi = AbiCalculator::new(1_000).compute(&AbiInputs::new(
        vec![vec![12; 150], vec![9; 160]],
        vec![vec![40; 30]],
    ));
    let history = [0.42, 0.45, 0.41, 0.44, 0.43, 0.46, 0.44];
    let days: Vec<f64> = (0..history.len()).map(|i| i as f64 * 90.0).collect();
    let bfs = BfsCalculator::default().compute(&history, &days).unwrap();

    let measurements: [&dyn Measurement; 8] = [&eta, &rho, &grad, &ser, &k, &ea, &abi, &bfs];
    let set = assemble(measurements);
    assert!(set.missing().is_empty());
    for m in measurements {
        assert_eq!(set.get(m.parameter()), Some(m.value()));
    }

    let result = score(&set, biome).unwrap();
    assert!((0.0..=1.0).contains(&result.score));
    assert_eq!(MnisClass::from_score(result.score), Some(result.class));
}

#[test]
fn test_missing_calculator_is_reported_by_name() {
    let eta = EtaNwCalculator::new()
        .compute(&EtaNwInputs::new(0.6, 1.0, 1.0))
        .unwrap();
    let set = assemble([&eta as &dyn Measurement]);
    let err = score(&set, Biome::BorealConifer).unwrap_err();
    assert!(err.is_validation());
    assert!(err.to_string().contains("bfs"));
    assert_eq!(set.missing().len(), 7);
    assert!(!set.missing().contains(&Parameter::EtaNw));
}

struct MeanOfFeatures;

impl Predictor for MeanOfFeatures {
    fn name(&self) -> &str {
        "mean_of_features"
    }

    fn predict(&self, input: &[f64]) -> f64 {
        mnis::stats::mean(input).clamp(0.0, 1.0)
    }
}

#[test]
fn test_ensemble_over_scored_history() {
    let ensemble = Ensemble::default().with_temporal_predictor(MeanOfFeatures);
    let inputs = EnsembleInputs::default()
        .with_history(vec![0.3, 0.35, 0.4])
        .with_spikes(vec![1.0, 2.0]);
    let result = ensemble.predict(&inputs);

    let temporal = result.slot_prediction(mnis::models::Slot::Temporal).unwrap();
    assert!((temporal - 0.35).abs() < 1e-12);
    let expected = (0.5 * 0.38 + temporal * 0.30) / 0.68;
    assert!((result.prediction - expected).abs() < 1e-12);
    assert_eq!(
        result
            .warnings
            .iter()
            .filter(|w| w.contains("fallback"))
            .count(),
        1
    );
}
