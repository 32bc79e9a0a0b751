//! Mycelial Network Intelligence Score (MNIS).
//!
//! Eight raw parameters describing a mycelial network are normalized
//! against biome-specific reference thresholds, combined with fixed weights
//! into a score in [0, 1] and mapped to a class band (lower is healthier).
//!
//! ```ignore
//! use mnis::{score, Biome, ParameterSet};
//!
//! let params: ParameterSet = [
//!     ("eta_nw", 0.72), ("rho_e", 0.68), ("grad_c", 0.81), ("ser", 1.08),
//!     ("k_topo", 1.72), ("e_a", 0.78), ("abi", 1.68), ("bfs", 0.45),
//! ].into_iter().collect();
//! let result = score(&params, Biome::TemperateBroadleaf)?;
//! println!("{:.3} {}", result.score, result.class);
//! ```

// Export modules for library usage
pub mod config;
pub mod core;
pub mod errors;
pub mod models;
pub mod observability;
pub mod parameters;
pub mod reference;
pub mod scoring;
pub mod stats;

// Re-export commonly used types
pub use crate::core::{Biome, Normalized, Parameter, ParameterSet};

pub use crate::errors::{Error, Result, ResultExt};

pub use crate::scoring::{
    batch_score, classify, compare_results, compute_mnis, normalize, normalize_named, score,
    ClassBand, ComparisonSummary, MnisClass, MnisScorer, ScoreResult, CLASS_BANDS,
};

pub use crate::reference::{biome_reference, BiomeReference, OptimalBand, MNIS_WEIGHTS};

pub use crate::parameters::{assemble, Measurement};

pub use crate::config::{load_config, MnisConfig};

pub use crate::models::{Ensemble, EnsembleInputs, EnsembleResult, Predictor};
