//! Parameter keys, biomes and the raw parameter set fed to the scorer.

use crate::errors::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// One of the eight MNIS bio-physical parameters.
///
/// Variants are declared in weight-table order, so `Ord` (and every
/// `BTreeMap<Parameter, _>`) iterates the same way the composite sum does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Parameter {
    /// Natural Weathering Efficiency
    #[serde(rename = "eta_nw")]
    EtaNw,
    /// Adaptive Resilience Index
    #[serde(rename = "e_a")]
    EA,
    /// Bioelectrical Pulse Density
    #[serde(rename = "rho_e")]
    RhoE,
    /// Chemotropic Navigation Accuracy
    #[serde(rename = "grad_c")]
    GradC,
    /// Symbiotic Exchange Ratio
    #[serde(rename = "ser")]
    Ser,
    /// Topological Expansion Rate
    #[serde(rename = "k_topo")]
    KTopo,
    /// Biodiversity Amplification Index
    #[serde(rename = "abi")]
    Abi,
    /// Biological Field Stability
    #[serde(rename = "bfs")]
    Bfs,
}

impl Parameter {
    /// All parameters in weight-table order.
    pub const ALL: [Parameter; 8] = [
        Parameter::EtaNw,
        Parameter::EA,
        Parameter::RhoE,
        Parameter::GradC,
        Parameter::Ser,
        Parameter::KTopo,
        Parameter::Abi,
        Parameter::Bfs,
    ];

    /// Stable key used in parameter sets and serialized output
    pub fn as_str(&self) -> &'static str {
        match self {
            Parameter::EtaNw => "eta_nw",
            Parameter::EA => "e_a",
            Parameter::RhoE => "rho_e",
            Parameter::GradC => "grad_c",
            Parameter::Ser => "ser",
            Parameter::KTopo => "k_topo",
            Parameter::Abi => "abi",
            Parameter::Bfs => "bfs",
        }
    }

    /// Conventional symbol
    pub fn symbol(&self) -> &'static str {
        match self {
            Parameter::EtaNw => "η_NW",
            Parameter::EA => "E_a",
            Parameter::RhoE => "ρ_e",
            Parameter::GradC => "∇C",
            Parameter::Ser => "SER",
            Parameter::KTopo => "K_topo",
            Parameter::Abi => "ABI",
            Parameter::Bfs => "BFS",
        }
    }

    /// Measurement unit of the raw value
    pub fn unit(&self) -> &'static str {
        match self {
            Parameter::EtaNw => "μg·μL⁻¹·cm⁻²·day⁻¹",
            Parameter::EA => "dimensionless",
            Parameter::RhoE => "normalized",
            Parameter::GradC => "normalized",
            Parameter::Ser => "dimensionless",
            Parameter::KTopo => "D_f",
            Parameter::Abi => "ratio",
            Parameter::Bfs => "1/CV",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Parameter::EtaNw => "Natural Weathering Efficiency",
            Parameter::EA => "Adaptive Resilience Index",
            Parameter::RhoE => "Bioelectrical Pulse Density",
            Parameter::GradC => "Chemotropic Navigation Accuracy",
            Parameter::Ser => "Symbiotic Exchange Ratio",
            Parameter::KTopo => "Topological Expansion Rate",
            Parameter::Abi => "Biodiversity Amplification Index",
            Parameter::Bfs => "Biological Field Stability",
        }
    }

    /// Whether the parameter scores best inside a band rather than at its maximum
    pub fn has_optimal_band(&self) -> bool {
        matches!(self, Parameter::Ser)
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Parameter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Parameter::ALL
            .iter()
            .copied()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| Error::configuration(format!("Unknown parameter: {}", s)))
    }
}

/// Ecological category selecting the reference thresholds
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Biome {
    #[default]
    TemperateBroadleaf,
    BorealConifer,
    TropicalMontane,
    MediterraneanWoodland,
    SubarcticBirch,
}

impl Biome {
    pub const ALL: [Biome; 5] = [
        Biome::TemperateBroadleaf,
        Biome::BorealConifer,
        Biome::TropicalMontane,
        Biome::MediterraneanWoodland,
        Biome::SubarcticBirch,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Biome::TemperateBroadleaf => "temperate_broadleaf",
            Biome::BorealConifer => "boreal_conifer",
            Biome::TropicalMontane => "tropical_montane",
            Biome::MediterraneanWoodland => "mediterranean_woodland",
            Biome::SubarcticBirch => "subarctic_birch",
        }
    }
}

impl fmt::Display for Biome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Biome {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Biome::ALL
            .iter()
            .copied()
            .find(|b| b.as_str() == s)
            .ok_or_else(|| {
                let known: Vec<&str> = Biome::ALL.iter().map(Biome::as_str).collect();
                Error::configuration(format!(
                    "Unknown biome: {}. Must be one of {:?}",
                    s, known
                ))
            })
    }
}

/// Raw parameter values keyed by parameter name.
///
/// Kept as a plain key -> value mapping so loaders can hand over whatever
/// they read; completeness is checked by the scorer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterSet {
    values: BTreeMap<String, f64>,
}

impl ParameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: f64) -> Self {
        self.values.insert(key.into(), value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: f64) -> Option<f64> {
        self.values.insert(key.into(), value)
    }

    pub fn remove(&mut self, key: &str) -> Option<f64> {
        self.values.remove(key)
    }

    /// Raw value of a known parameter, if present
    pub fn get(&self, parameter: Parameter) -> Option<f64> {
        self.values.get(parameter.as_str()).copied()
    }

    pub fn get_named(&self, key: &str) -> Option<f64> {
        self.values.get(key).copied()
    }

    /// Required parameters absent from this set, in weight-table order
    pub fn missing(&self) -> Vec<Parameter> {
        Parameter::ALL
            .iter()
            .copied()
            .filter(|p| !self.values.contains_key(p.as_str()))
            .collect()
    }

    /// Keys that are not MNIS parameters
    pub fn unrecognized_keys(&self) -> Vec<&str> {
        self.values
            .keys()
            .map(String::as_str)
            .filter(|k| k.parse::<Parameter>().is_err())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Parse a JSON object of `key -> number`
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for ParameterSet {
    fn from_iter<T: IntoIterator<Item = (K, f64)>>(iter: T) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

impl FromIterator<(Parameter, f64)> for ParameterSet {
    fn from_iter<T: IntoIterator<Item = (Parameter, f64)>>(iter: T) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(p, v)| (p.as_str().to_string(), v))
                .collect(),
        }
    }
}
