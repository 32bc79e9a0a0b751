//! `.mnis.toml` configuration.
//!
//! Every section is optional; missing keys take their defaults. The file is
//! looked up in the working directory and up to nine of its ancestors.

mod accessors;
mod core;
mod loader;

pub use accessors::get_config;
pub use self::core::{
    default_artifact_rejection, default_batch_size, default_cnn_weight, default_lstm_weight,
    default_min_interval, default_sampling_rate, default_sequencing_depth, default_threshold,
    default_threshold_sigma, default_window_years, default_xgb_weight, AbiConfig,
    ElectrophysiologyConfig, EnsembleConfig, MnisConfig, StabilityConfig,
};
pub use loader::{
    directory_ancestors, find_config_from, load_config, load_config_from_path,
    parse_and_validate_config, CONFIG_FILE_NAME,
};
