//! Prediction ensemble combining spike-train, tabular and time-series
//! predictors into one MNIS estimate.
//!
//! No trained models ship with the crate. Each slot holds a
//! [`FallbackPredictor`] until a real [`Predictor`] is attached.

pub mod ensemble;

pub use ensemble::{
    Ensemble, EnsembleInputs, EnsembleResult, FallbackPredictor, Predictor, Slot,
};
