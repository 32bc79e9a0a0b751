//! MNIS class bands
//!
//! Five ordinal bands partition [0, 1]. Bands are half-open `[lower, upper)`
//! and scanned lowest-first; the top band is closed so a score of exactly
//! 1.0 still lands in COLLAPSE.

use crate::core::Normalized;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Ordinal network-state class, from healthiest to collapsed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MnisClass {
    Excellent,
    Good,
    Moderate,
    Critical,
    Collapse,
}

impl MnisClass {
    pub const ALL: [MnisClass; 5] = [
        MnisClass::Excellent,
        MnisClass::Good,
        MnisClass::Moderate,
        MnisClass::Critical,
        MnisClass::Collapse,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            MnisClass::Excellent => "EXCELLENT",
            MnisClass::Good => "GOOD",
            MnisClass::Moderate => "MODERATE",
            MnisClass::Critical => "CRITICAL",
            MnisClass::Collapse => "COLLAPSE",
        }
    }

    /// Band covering this class
    pub fn band(&self) -> &'static ClassBand {
        &CLASS_BANDS[*self as usize]
    }

    /// Class for a raw score; `None` outside [0, 1] or for NaN.
    pub fn from_score(score: f64) -> Option<MnisClass> {
        CLASS_BANDS
            .iter()
            .find(|band| band.contains(score))
            .map(|band| band.class)
    }
}

impl fmt::Display for MnisClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One entry of the band table
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClassBand {
    pub class: MnisClass,
    pub lower: f64,
    pub upper: f64,
    pub upper_inclusive: bool,
}

impl ClassBand {
    pub fn contains(&self, score: f64) -> bool {
        self.lower <= score
            && (score < self.upper || (self.upper_inclusive && score <= self.upper))
    }
}

/// Band table, ordered lowest-first
pub const CLASS_BANDS: [ClassBand; 5] = [
    ClassBand {
        class: MnisClass::Excellent,
        lower: 0.00,
        upper: 0.25,
        upper_inclusive: false,
    },
    ClassBand {
        class: MnisClass::Good,
        lower: 0.25,
        upper: 0.44,
        upper_inclusive: false,
    },
    ClassBand {
        class: MnisClass::Moderate,
        lower: 0.44,
        upper: 0.62,
        upper_inclusive: false,
    },
    ClassBand {
        class: MnisClass::Critical,
        lower: 0.62,
        upper: 0.80,
        upper_inclusive: false,
    },
    ClassBand {
        class: MnisClass::Collapse,
        lower: 0.80,
        upper: 1.00,
        upper_inclusive: true,
    },
];

/// Classify a composite score. Total over [0, 1].
pub fn classify(score: Normalized) -> MnisClass {
    // The bands cover [0, 1] without gaps, so the fallback is never taken
    MnisClass::from_score(score.value()).unwrap_or(MnisClass::Collapse)
}
