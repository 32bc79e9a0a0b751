//! Calculators deriving each raw MNIS parameter from field or lab measurements.
//!
//! Every calculator produces a result carrying the parameter value plus its
//! own diagnostics. Results implement [`Measurement`] so a full set can be
//! assembled into a [`ParameterSet`] for scoring.

pub mod abi;
pub mod bfs;
pub mod e_a;
pub mod eta_nw;
pub mod grad_c;
pub mod k_topo;
pub mod rho_e;
pub mod ser;

pub use abi::{AbiCalculator, AbiInputs, AbiResult};
pub use bfs::{BfsCalculator, BfsResult, StabilityClass, TippingPointIndicators};
pub use e_a::{EaCalculator, EaInputs, EaResult, ResilienceClass};
pub use eta_nw::{EtaNwCalculator, EtaNwInputs, EtaNwResult};
pub use grad_c::{GradCCalculator, GradCResult, GradientField, Point3};
pub use k_topo::{BinaryImage, BinaryVolume, KTopoCalculator, KTopoResult, NetworkClass};
pub use rho_e::{
    ActivityPattern, Recording, RhoECalculator, RhoEResult, SpikeDetection, SpikeEvent,
};
pub use ser::{ExchangeClass, SerCalculator, SerInputs, SerResult};

use crate::core::{Parameter, ParameterSet};
use tracing::warn;

/// A computed parameter value with its quality warnings
pub trait Measurement {
    fn parameter(&self) -> Parameter;
    fn value(&self) -> f64;
    fn warnings(&self) -> &[String];
}

/// Collect measurements into a parameter set. Later entries for the same
/// parameter replace earlier ones.
pub fn assemble<'a, I>(measurements: I) -> ParameterSet
where
    I: IntoIterator<Item = &'a dyn Measurement>,
{
    measurements
        .into_iter()
        .map(|m| (m.parameter(), m.value()))
        .collect()
}

pub(crate) fn report_warnings(parameter: Parameter, warnings: &[String]) {
    for message in warnings {
        warn!(parameter = %parameter, "{}", message);
    }
}

macro_rules! impl_measurement {
    ($result:ty, $parameter:expr) => {
        impl $crate::parameters::Measurement for $result {
            fn parameter(&self) -> $crate::core::Parameter {
                $parameter
            }

            fn value(&self) -> f64 {
                self.value
            }

            fn warnings(&self) -> &[String] {
                &self.warnings
            }
        }
    };
}
pub(crate) use impl_measurement;
