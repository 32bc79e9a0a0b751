//! Biome-aware parameter normalization.
//!
//! Standard parameters scale linearly between the biome's `min` and
//! `max_ref`. Parameters with an optimal band (SER) peak at 1.0 inside the
//! band and fall off linearly on both sides.

use crate::core::{Biome, Normalized, Parameter};
use crate::errors::Result;
use crate::reference::{biome_reference, OptimalBand, ParameterReference};

/// Normalize a raw value to [0, 1] against the biome's reference thresholds.
pub fn normalize(parameter: Parameter, raw_value: f64, biome: Biome) -> f64 {
    let reference = biome_reference(biome).get(parameter);
    normalize_with_reference(raw_value, reference).value()
}

/// String-keyed entry point. Unknown biomes and parameter keys are rejected
/// before anything is computed.
pub fn normalize_named(parameter_key: &str, raw_value: f64, biome: &str) -> Result<f64> {
    let biome: Biome = biome.parse()?;
    let parameter: Parameter = parameter_key.parse()?;
    Ok(normalize(parameter, raw_value, biome))
}

pub fn normalize_with_reference(value: f64, reference: &ParameterReference) -> Normalized {
    match reference.optimal {
        Some(band) => banded(value, reference, band),
        None => linear(value, reference.min, reference.max_ref),
    }
}

fn linear(value: f64, min: f64, max_ref: f64) -> Normalized {
    if value <= min {
        Normalized::MIN
    } else if value >= max_ref {
        Normalized::MAX
    } else {
        Normalized::new((value - min) / (max_ref - min))
    }
}

fn banded(value: f64, reference: &ParameterReference, band: OptimalBand) -> Normalized {
    if band.contains(value) {
        Normalized::MAX
    } else if value < band.min {
        // 0 at `min`, 1 at the lower edge of the band
        Normalized::new((value - reference.min) / (band.min - reference.min))
    } else {
        // 1 at the upper edge of the band, 0 at `max_ref`
        Normalized::new(1.0 - (value - band.max) / (reference.max_ref - band.max))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TB: Biome = Biome::TemperateBroadleaf;

    #[test]
    fn linear_within_range() {
        let norm = normalize(Parameter::EtaNw, 0.6, TB);
        assert!((norm - 0.5).abs() < 1e-12);
    }

    #[test]
    fn linear_saturates_at_both_ends() {
        assert_eq!(normalize(Parameter::EtaNw, 0.1, TB), 0.0);
        assert_eq!(normalize(Parameter::EtaNw, 0.32, TB), 0.0);
        assert_eq!(normalize(Parameter::EtaNw, 0.88, TB), 1.0);
        assert_eq!(normalize(Parameter::EtaNw, 1.0, TB), 1.0);
    }

    #[test]
    fn ser_inside_band_is_perfect() {
        assert_eq!(normalize(Parameter::Ser, 0.90, TB), 1.0);
        assert_eq!(normalize(Parameter::Ser, 1.0, TB), 1.0);
        assert_eq!(normalize(Parameter::Ser, 1.10, TB), 1.0);
    }

    #[test]
    fn ser_below_band_scales_from_min() {
        let norm = normalize(Parameter::Ser, 0.7, TB);
        assert!((norm - 0.25 / 0.45).abs() < 1e-12);
        assert_eq!(normalize(Parameter::Ser, 0.45, TB), 0.0);
        assert_eq!(normalize(Parameter::Ser, 0.2, TB), 0.0);
    }

    #[test]
    fn ser_above_band_decays_to_max_ref() {
        let norm = normalize(Parameter::Ser, 1.3, TB);
        assert!((norm - 0.6).abs() < 1e-12);
        assert_eq!(normalize(Parameter::Ser, 1.60, TB), 0.0);
        assert_eq!(normalize(Parameter::Ser, 2.0, TB), 0.0);
    }

    #[test]
    fn ser_band_differs_per_biome() {
        // 0.86 is inside the subarctic band but below the temperate one
        assert_eq!(normalize(Parameter::Ser, 0.86, Biome::SubarcticBirch), 1.0);
        assert!(normalize(Parameter::Ser, 0.86, TB) < 1.0);
    }

    #[test]
    fn named_rejects_unknown_biome() {
        let err = normalize_named("eta_nw", 0.5, "savanna").unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn named_rejects_unknown_parameter() {
        let err = normalize_named("psi", 0.5, "boreal_conifer").unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn named_matches_typed() {
        let named = normalize_named("k_topo", 1.6, "tropical_montane").unwrap();
        let typed = normalize(Parameter::KTopo, 1.6, Biome::TropicalMontane);
        assert_eq!(named, typed);
    }
}
