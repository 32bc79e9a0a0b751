pub mod classification;
pub mod comparison;
pub mod composite;
pub mod normalizer;

pub use classification::{classify, ClassBand, MnisClass, CLASS_BANDS};
pub use comparison::{compare_results, ComparisonSummary};
pub use composite::{batch_score, compute_mnis, score, MnisScorer, ScoreResult};
pub use normalizer::{normalize, normalize_named, normalize_with_reference};
