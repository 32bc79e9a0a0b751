//! SER, symbiotic exchange ratio.
//!
//! Carbon delivered to the fungus per unit phosphorus returned to the host,
//! relative to the biome's equilibrium stoichiometry:
//! `SER = (Φ_C / Φ_P) / optimal · Q10 / Ψ`.

use crate::core::{Biome, Parameter};
use crate::errors::{Error, Result};
use crate::parameters::{impl_measurement, report_warnings};
use serde::{Deserialize, Serialize};

/// Value reported when the phosphorus flux has stopped entirely
const COLLAPSED_SER: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExchangeClass {
    Balanced,
    Stressed,
    Parasitic,
    PlantDominant,
}

impl ExchangeClass {
    pub fn from_value(ser: f64) -> Self {
        if (0.9..=1.1).contains(&ser) {
            ExchangeClass::Balanced
        } else if ser > 1.35 {
            ExchangeClass::Parasitic
        } else if ser >= 0.75 {
            ExchangeClass::Stressed
        } else {
            ExchangeClass::PlantDominant
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerInputs {
    /// µg C · g root⁻¹ · day⁻¹
    pub carbon_flux: f64,
    /// µg P · g root⁻¹ · day⁻¹
    pub phosphorus_flux: f64,
    pub temperature: f64,
    pub n_measurements: u32,
}

impl SerInputs {
    pub fn new(carbon_flux: f64, phosphorus_flux: f64) -> Self {
        Self {
            carbon_flux,
            phosphorus_flux,
            temperature: 15.0,
            n_measurements: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerResult {
    pub value: f64,
    pub exchange: ExchangeClass,
    pub carbon_flux: f64,
    pub phosphorus_flux: f64,
    /// Infinite when no phosphorus is delivered
    pub c_p_ratio: f64,
    pub optimal_ratio: f64,
    pub deviation_percent: f64,
    pub n_measurements: u32,
    pub warnings: Vec<String>,
}

impl_measurement!(SerResult, Parameter::Ser);

#[derive(Debug, Clone)]
pub struct SerCalculator {
    biome: Biome,
}

impl Default for SerCalculator {
    fn default() -> Self {
        Self::new(Biome::default())
    }
}

impl SerCalculator {
    pub fn new(biome: Biome) -> Self {
        Self { biome }
    }

    /// Equilibrium C:P exchange ratio for the biome
    pub fn optimal_ratio(&self) -> f64 {
        match self.biome {
            Biome::TemperateBroadleaf => 0.85,
            Biome::BorealConifer => 0.90,
            Biome::TropicalMontane => 0.80,
            Biome::MediterraneanWoodland => 0.88,
            Biome::SubarcticBirch => 0.95,
        }
    }

    /// Host-symbiont compatibility coefficient Ψ
    pub fn compatibility(&self) -> f64 {
        match self.biome {
            Biome::TemperateBroadleaf => 1.05,
            Biome::BorealConifer => 1.10,
            Biome::TropicalMontane => 0.95,
            Biome::MediterraneanWoodland => 1.02,
            Biome::SubarcticBirch => 1.15,
        }
    }

    pub fn compute(&self, inputs: &SerInputs) -> Result<SerResult> {
        if inputs.carbon_flux.is_nan() || inputs.phosphorus_flux.is_nan() {
            return Err(Error::invalid_input("ser flux measurements must be numbers"));
        }
        let optimal = self.optimal_ratio();

        if inputs.phosphorus_flux <= 0.0 {
            let warnings = vec!["Zero phosphorus flux - network collapse".to_string()];
            report_warnings(Parameter::Ser, &warnings);
            return Ok(SerResult {
                value: COLLAPSED_SER,
                exchange: ExchangeClass::Parasitic,
                carbon_flux: inputs.carbon_flux,
                phosphorus_flux: inputs.phosphorus_flux,
                c_p_ratio: f64::INFINITY,
                optimal_ratio: optimal,
                deviation_percent: 100.0,
                n_measurements: inputs.n_measurements,
                warnings,
            });
        }

        let c_p_ratio = inputs.carbon_flux / inputs.phosphorus_flux;
        let q10 = 2f64.powf((inputs.temperature - 15.0) / 10.0);
        let value = c_p_ratio / optimal * q10 / self.compatibility();
        let deviation = (value - 1.0).abs() * 100.0;

        let mut warnings = Vec::new();
        if value > 1.35 {
            warnings.push(format!(
                "Parasitic exchange (SER={:.2}) - fungus extracting excess carbon",
                value
            ));
        } else if value < 0.75 {
            warnings.push(format!(
                "Plant-dominant exchange (SER={:.2}) - nutrient delivery suppressed",
                value
            ));
        } else if value > 1.1 {
            warnings.push("Elevated SER - possible nitrogen saturation".to_string());
        } else if value < 0.9 {
            warnings.push("Reduced SER - possible fungal stress".to_string());
        }
        if deviation > 50.0 {
            warnings.push(format!(
                "Extreme deviation ({:.1}%) from optimal stoichiometry",
                deviation
            ));
        }
        report_warnings(Parameter::Ser, &warnings);

        Ok(SerResult {
            value,
            exchange: ExchangeClass::from_value(value),
            carbon_flux: inputs.carbon_flux,
            phosphorus_flux: inputs.phosphorus_flux,
            c_p_ratio,
            optimal_ratio: optimal,
            deviation_percent: deviation,
            n_measurements: inputs.n_measurements.max(1),
            warnings,
        })
    }

    /// SER proxy from standing biomass and soil phosphorus. Clamped to
    /// [0.5, 2.0].
    pub fn estimate_from_biomass(
        fungal_biomass: f64,
        plant_biomass: f64,
        soil_phosphorus: f64,
        n_stress: f64,
    ) -> f64 {
        let fp_ratio = fungal_biomass / plant_biomass.max(1.0);
        let p_factor = (-soil_phosphorus / 100.0).exp();
        let estimated = 1.0 + 0.5 * (fp_ratio - 0.2) + 0.3 * (p_factor - 1.0) + 0.2 * n_stress;
        estimated.clamp(0.5, 2.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn balanced_exchange_at_equilibrium() {
        let calc = SerCalculator::new(Biome::TemperateBroadleaf);
        // C:P chosen so that SER == 1.0
        let cp = 0.85 * 1.05;
        let result = calc.compute(&SerInputs::new(cp * 10.0, 10.0)).unwrap();
        assert!((result.value - 1.0).abs() < 1e-12);
        assert_eq!(result.exchange, ExchangeClass::Balanced);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn zero_phosphorus_is_collapse() {
        let result = SerCalculator::default()
            .compute(&SerInputs::new(120.0, 0.0))
            .unwrap();
        assert_eq!(result.value, 2.0);
        assert_eq!(result.exchange, ExchangeClass::Parasitic);
        assert!(result.c_p_ratio.is_infinite());
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn biome_changes_the_ratio() {
        let inputs = SerInputs::new(100.0, 100.0);
        let temperate = SerCalculator::new(Biome::TemperateBroadleaf).compute(&inputs).unwrap();
        let subarctic = SerCalculator::new(Biome::SubarcticBirch).compute(&inputs).unwrap();
        assert!(subarctic.value < temperate.value);
    }

    #[test]
    fn q10_doubles_per_ten_degrees() {
        let calc = SerCalculator::default();
        let mut warm = SerInputs::new(50.0, 60.0);
        warm.temperature = 25.0;
        let base = calc.compute(&SerInputs::new(50.0, 60.0)).unwrap();
        let warm = calc.compute(&warm).unwrap();
        assert!((warm.value / base.value - 2.0).abs() < 1e-12);
    }

    #[test]
    fn exchange_classes() {
        assert_eq!(ExchangeClass::from_value(1.0), ExchangeClass::Balanced);
        assert_eq!(ExchangeClass::from_value(1.2), ExchangeClass::Stressed);
        assert_eq!(ExchangeClass::from_value(0.8), ExchangeClass::Stressed);
        assert_eq!(ExchangeClass::from_value(1.5), ExchangeClass::Parasitic);
        assert_eq!(ExchangeClass::from_value(0.6), ExchangeClass::PlantDominant);
    }

    #[test]
    fn parasitic_exchange_warns() {
        let result = SerCalculator::default()
            .compute(&SerInputs::new(200.0, 100.0))
            .unwrap();
        assert_eq!(result.exchange, ExchangeClass::Parasitic);
        assert!(result.warnings[0].starts_with("Parasitic exchange"));
        assert!(result.warnings[1].starts_with("Extreme deviation"));
    }

    #[test]
    fn biomass_estimate_is_clamped() {
        assert_eq!(SerCalculator::estimate_from_biomass(1000.0, 10.0, 0.0, 1.0), 2.0);
        let mid = SerCalculator::estimate_from_biomass(20.0, 100.0, 0.0, 0.0);
        assert!((mid - 1.0).abs() < 1e-12);
    }
}
