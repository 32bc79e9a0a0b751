//! Core domain types shared by every MNIS component

pub mod score_types;
pub mod types;

pub use score_types::Normalized;
pub use types::{Biome, Parameter, ParameterSet};
