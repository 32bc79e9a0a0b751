//! Property-based tests for normalization and classification
//!
//! These tests verify invariants that should hold for all inputs:
//! - Normalized values stay in [0, 1]
//! - Linear parameters are monotone in the raw value
//! - The composite score stays in [0, 1] and lands in its class band
//! - Any missing subset of parameters is reported in full

use mnis::{
    biome_reference, classify, normalize, score, Biome, Error, MnisClass, Normalized, Parameter,
    ParameterSet, MNIS_WEIGHTS,
};
use proptest::prelude::*;

fn any_parameter() -> impl Strategy<Value = Parameter> {
    (0..Parameter::ALL.len()).prop_map(|i| Parameter::ALL[i])
}

fn any_biome() -> impl Strategy<Value = Biome> {
    (0..Biome::ALL.len()).prop_map(|i| Biome::ALL[i])
}

fn any_parameter_set() -> impl Strategy<Value = ParameterSet> {
    prop::collection::vec(-1.0f64..4.0, 8).prop_map(|values| {
        Parameter::ALL
            .iter()
            .zip(values)
            .map(|(&p, v)| (p, v))
            .collect()
    })
}

proptest! {
    #[test]
    fn prop_normalized_value_in_unit_interval(
        parameter in any_parameter(),
        biome in any_biome(),
        raw in -100.0f64..100.0
    ) {
        let n = normalize(parameter, raw, biome);
        prop_assert!((0.0..=1.0).contains(&n));
    }

    #[test]
    fn prop_linear_parameters_are_monotone(
        parameter in any_parameter(),
        biome in any_biome(),
        a in -5.0f64..5.0,
        b in -5.0f64..5.0
    ) {
        prop_assume!(biome_reference(biome).get(parameter).optimal.is_none());
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(normalize(parameter, lo, biome) <= normalize(parameter, hi, biome));
    }

    #[test]
    fn prop_optimal_band_scores_perfect(biome in any_biome(), t in 0.0f64..=1.0) {
        let band = biome_reference(biome)
            .get(Parameter::Ser)
            .optimal
            .expect("ser has an optimal band");
        let raw = (band.min + t * (band.max - band.min)).min(band.max);
        prop_assert_eq!(normalize(Parameter::Ser, raw, biome), 1.0);
    }

    #[test]
    fn prop_score_in_range_and_band(set in any_parameter_set(), biome in any_biome()) {
        let result = score(&set, biome).unwrap();
        prop_assert!((0.0..=1.0).contains(&result.score));
        prop_assert!(result.class.band().contains(result.score));
        prop_assert_eq!(Some(result.class), MnisClass::from_score(result.score));
    }

    #[test]
    fn prop_classify_matches_bands(value in 0.0f64..=1.0) {
        let class = classify(Normalized::new(value));
        prop_assert!(class.band().contains(value));
    }

    #[test]
    fn prop_missing_parameters_all_named(
        set in any_parameter_set(),
        dropped in prop::collection::vec(any::<bool>(), 8),
        biome in any_biome()
    ) {
        let mut partial = set.clone();
        let mut expected = Vec::new();
        for ((parameter, _), drop) in MNIS_WEIGHTS.iter().zip(&dropped) {
            if *drop {
                partial.remove(parameter.as_str());
                expected.push(parameter.as_str().to_string());
            }
        }

        match score(&partial, biome) {
            Err(Error::Validation { missing }) => prop_assert_eq!(missing, expected),
            Ok(_) => prop_assert!(expected.is_empty()),
            Err(other) => prop_assert!(false, "unexpected error {:?}", other),
        }
        prop_assert!(score(&set, biome).is_ok());
    }
}
