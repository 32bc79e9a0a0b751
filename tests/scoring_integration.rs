//! End-to-end scoring through the public API

use mnis::{
    batch_score, compare_results, compute_mnis, normalize_named, score, Biome, MnisClass,
    Parameter, ParameterSet,
};
use pretty_assertions::assert_eq;

fn sample() -> ParameterSet {
    [
        ("eta_nw", 0.72),
        ("rho_e", 0.68),
        ("grad_c", 0.71),
        ("ser", 1.05),
        ("k_topo", 1.72),
        ("e_a", 0.65),
        ("abi", 1.84),
        ("bfs", 0.58),
    ]
    .into_iter()
    .collect()
}

#[test]
fn test_golden_scenario_through_crate_root() {
    let result = compute_mnis(&sample(), "temperate_broadleaf").unwrap();
    assert!((result.score - 0.7618493392572339).abs() < 1e-12);
    assert_eq!(result.class, MnisClass::Critical);
    assert_eq!(result.warnings, vec!["ser at maximum threshold".to_string()]);
}

#[test]
fn test_scoring_is_idempotent() {
    let first = score(&sample(), Biome::MediterraneanWoodland).unwrap();
    let second = score(&sample(), Biome::MediterraneanWoodland).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_biome_changes_normalization() {
    let scores: Vec<f64> = Biome::ALL
        .iter()
        .map(|&biome| score(&sample(), biome).unwrap().score)
        .collect();
    for s in &scores {
        assert!((0.0..=1.0).contains(s));
    }
    // Lower reference minimums mean the same raw values normalize higher
    assert!(scores[Biome::SubarcticBirch as usize] > scores[Biome::TropicalMontane as usize]);
}

#[test]
fn test_score_is_weighted_sum_of_normalized() {
    let result = score(&sample(), Biome::BorealConifer).unwrap();
    let recomputed: f64 = mnis::MNIS_WEIGHTS
        .iter()
        .map(|(p, w)| w * result.normalized_value(*p).unwrap())
        .sum();
    assert!((result.score - recomputed).abs() < 1e-12);
}

#[test]
fn test_normalize_named_rejects_unknown_keys() {
    assert!(normalize_named("eta_nw", 0.6, "temperate_broadleaf").is_ok());
    assert!(normalize_named("eta", 0.6, "temperate_broadleaf")
        .unwrap_err()
        .is_configuration());
    assert!(normalize_named("eta_nw", 0.6, "tundra")
        .unwrap_err()
        .is_configuration());
}

#[test]
fn test_json_round_trips_through_serde() {
    let result = score(&sample(), Biome::TemperateBroadleaf)
        .unwrap()
        .with_site_id("plot-7");
    let json = result.to_json().unwrap();
    let back: mnis::ScoreResult = serde_json::from_str(&json).unwrap();
    assert_eq!(back, result);
}

#[test]
fn test_compare_batch_results() {
    let sets = vec![
        sample(),
        sample().with("eta_nw", 0.32).with("rho_e", 0.30),
        sample().with("bfs", 0.85),
    ];
    let results = batch_score(&sets, Biome::TemperateBroadleaf).unwrap();
    let summary = compare_results(&results);

    assert_eq!(summary.count, 3);
    assert_eq!(summary.class_distribution.len(), MnisClass::ALL.len());
    assert_eq!(summary.class_distribution.values().sum::<usize>(), 3);
    assert!(summary.min <= summary.median && summary.median <= summary.max);
    assert_eq!(
        summary.max,
        results.iter().map(|r| r.score).fold(f64::MIN, f64::max)
    );
}

#[test]
fn test_parameter_set_from_json() {
    let set = ParameterSet::from_json(
        r#"{"eta_nw": 0.72, "rho_e": 0.68, "grad_c": 0.71, "ser": 1.05,
            "k_topo": 1.72, "e_a": 0.65, "abi": 1.84, "bfs": 0.58}"#,
    )
    .unwrap();
    assert_eq!(set.get(Parameter::KTopo), Some(1.72));
    assert_eq!(
        score(&set, Biome::TemperateBroadleaf).unwrap(),
        score(&sample(), Biome::TemperateBroadleaf).unwrap()
    );
}
