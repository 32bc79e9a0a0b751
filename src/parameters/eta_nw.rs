//! η_NW, natural weathering efficiency.
//!
//! `η_NW = dM/dt / (V_acid · A_contact · T)`, corrected for mineral type,
//! temperature (Arrhenius-style around 15 °C) and soil pH.

use crate::core::Parameter;
use crate::errors::{Error, Result};
use crate::parameters::{impl_measurement, report_warnings};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EtaNwInputs {
    /// µg/day
    pub dissolution_rate: f64,
    /// µL·cm⁻²·day⁻¹
    pub acid_production: f64,
    /// cm²
    pub contact_area: f64,
    /// days
    pub incubation_time: f64,
    pub mineral_type: String,
    /// °C
    pub temperature: f64,
    pub ph: f64,
}

impl EtaNwInputs {
    pub fn new(dissolution_rate: f64, acid_production: f64, contact_area: f64) -> Self {
        Self {
            dissolution_rate,
            acid_production,
            contact_area,
            incubation_time: 1.0,
            mineral_type: "apatite".to_string(),
            temperature: 15.0,
            ph: 5.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EtaNwResult {
    pub value: f64,
    pub mineral_type: String,
    pub dissolution_rate: f64,
    pub acid_production: f64,
    pub contact_area: f64,
    pub confidence: f64,
    pub warnings: Vec<String>,
}

impl_measurement!(EtaNwResult, Parameter::EtaNw);

#[derive(Debug, Clone)]
pub struct EtaNwCalculator {
    mineral_factors: BTreeMap<String, f64>,
}

impl Default for EtaNwCalculator {
    fn default() -> Self {
        let mineral_factors = [
            ("apatite", 1.0),
            ("feldspar", 0.85),
            ("biotite", 1.2),
            ("quartz", 0.3),
            ("calcite", 1.5),
            ("olivine", 1.1),
        ]
        .into_iter()
        .map(|(name, factor)| (name.to_string(), factor))
        .collect();
        Self { mineral_factors }
    }
}

impl EtaNwCalculator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override or add a mineral calibration factor
    pub fn with_mineral_factor(mut self, mineral: impl Into<String>, factor: f64) -> Self {
        self.mineral_factors.insert(mineral.into(), factor);
        self
    }

    /// Unknown minerals are treated as apatite-equivalent
    pub fn mineral_factor(&self, mineral: &str) -> f64 {
        self.mineral_factors.get(mineral).copied().unwrap_or(1.0)
    }

    pub fn compute(&self, inputs: &EtaNwInputs) -> Result<EtaNwResult> {
        let denominator = inputs.acid_production * inputs.contact_area * inputs.incubation_time;
        if denominator.is_nan() || denominator <= 0.0 {
            return Err(Error::invalid_input(format!(
                "eta_nw requires positive acid production, contact area and incubation time (got {:.3} x {:.3} x {:.3})",
                inputs.acid_production, inputs.contact_area, inputs.incubation_time
            )));
        }

        let temp_factor = (0.05 * (inputs.temperature - 15.0)).exp();
        let value = inputs.dissolution_rate / denominator
            * self.mineral_factor(&inputs.mineral_type)
            * temp_factor
            * ph_factor(inputs.ph);

        let positive = [
            inputs.dissolution_rate,
            inputs.acid_production,
            inputs.contact_area,
        ]
        .iter()
        .all(|&v| v > 0.0);
        let confidence = if positive { 0.95 } else { 0.7 };

        let mut warnings = Vec::new();
        if value < 0.3 {
            warnings.push("Very low weathering efficiency".to_string());
        } else if value > 2.5 {
            warnings.push("Exceptionally high weathering rate - verify measurements".to_string());
        }
        if inputs.ph < 4.0 {
            warnings.push("Extreme acidity - may inhibit fungal activity".to_string());
        } else if inputs.ph > 7.5 {
            warnings.push("Alkaline conditions - suboptimal for weathering".to_string());
        }
        report_warnings(Parameter::EtaNw, &warnings);

        Ok(EtaNwResult {
            value,
            mineral_type: inputs.mineral_type.clone(),
            dissolution_rate: inputs.dissolution_rate,
            acid_production: inputs.acid_production,
            contact_area: inputs.contact_area,
            confidence,
            warnings,
        })
    }

    /// Rough η_NW from bulk soil chemistry when no incubation data exists.
    /// Clamped to [0.3, 2.5].
    pub fn estimate_from_soil_chemistry(
        phosphorus: f64,
        _calcium: f64,
        organic_matter: f64,
        fungal_biomass: f64,
    ) -> f64 {
        let p_factor = if phosphorus > 0.0 {
            (-phosphorus / 100.0).exp()
        } else {
            2.0
        };
        let om_factor = 1.0 + 0.1 * organic_matter;
        let biomass_factor = if fungal_biomass > 0.0 {
            fungal_biomass / 100.0
        } else {
            1.0
        };
        (0.5 * p_factor * om_factor * biomass_factor).clamp(0.3, 2.5)
    }
}

/// 1.0 across the optimal 4.5-6.5 window, falling off outside it
fn ph_factor(ph: f64) -> f64 {
    if (4.5..=6.5).contains(&ph) {
        1.0
    } else {
        (1.0 - 0.2 * (ph - 5.5).abs()).max(0.5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_conditions() {
        let result = EtaNwCalculator::new()
            .compute(&EtaNwInputs::new(12.0, 2.0, 5.0))
            .unwrap();
        assert!((result.value - 1.2).abs() < 1e-12);
        assert_eq!(result.confidence, 0.95);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn mineral_and_ph_corrections() {
        let calc = EtaNwCalculator::new();
        let mut inputs = EtaNwInputs::new(10.0, 1.0, 10.0);
        inputs.mineral_type = "quartz".into();
        inputs.ph = 8.0;
        let result = calc.compute(&inputs).unwrap();
        // 1.0 * 0.3 * max(0.5, 1 - 0.5)
        assert!((result.value - 0.15).abs() < 1e-12);
        assert!(result.warnings.iter().any(|w| w.contains("Very low")));
        assert!(result.warnings.iter().any(|w| w.contains("Alkaline")));
    }

    #[test]
    fn unknown_mineral_defaults_to_one() {
        let calc = EtaNwCalculator::new().with_mineral_factor("gneiss", 0.9);
        assert_eq!(calc.mineral_factor("unobtainium"), 1.0);
        assert_eq!(calc.mineral_factor("gneiss"), 0.9);
    }

    #[test]
    fn warmer_soil_weathers_faster() {
        let calc = EtaNwCalculator::new();
        let mut warm = EtaNwInputs::new(10.0, 2.0, 5.0);
        warm.temperature = 25.0;
        let base = calc.compute(&EtaNwInputs::new(10.0, 2.0, 5.0)).unwrap();
        let warm = calc.compute(&warm).unwrap();
        assert!((warm.value / base.value - 0.5f64.exp()).abs() < 1e-12);
    }

    #[test]
    fn zero_denominator_rejected() {
        let err = EtaNwCalculator::new()
            .compute(&EtaNwInputs::new(10.0, 0.0, 5.0))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn soil_chemistry_estimate_is_clamped() {
        let low = EtaNwCalculator::estimate_from_soil_chemistry(500.0, 0.0, 0.0, 10.0);
        assert_eq!(low, 0.3);
        let high = EtaNwCalculator::estimate_from_soil_chemistry(0.0, 0.0, 50.0, 1000.0);
        assert_eq!(high, 2.5);
    }
}
