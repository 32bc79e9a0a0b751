use std::fs;
use std::path::{Path, PathBuf};

use super::core::{
    AbiConfig, ElectrophysiologyConfig, EnsembleConfig, MnisConfig, StabilityConfig,
};
use crate::errors::{Error, Result, ResultExt};

pub const CONFIG_FILE_NAME: &str = ".mnis.toml";

/// Parse a TOML document. Sections holding invalid values are replaced by
/// their defaults with a warning; syntax errors and unknown biomes fail.
pub fn parse_and_validate_config(contents: &str) -> Result<MnisConfig> {
    let mut config = toml::from_str::<MnisConfig>(contents)
        .map_err(Error::from)
        .context(format!("Failed to parse {}", CONFIG_FILE_NAME))?;

    if let Err(e) = config.ensemble.validate() {
        log::warn!("Invalid ensemble weights: {}. Using defaults.", e);
        config.ensemble = EnsembleConfig::default();
    }
    if let Err(e) = config.stability.validate() {
        log::warn!("Invalid stability settings: {}. Using defaults.", e);
        config.stability = StabilityConfig::default();
    }
    if let Err(e) = config.electrophysiology.validate() {
        log::warn!("Invalid electrophysiology settings: {}. Using defaults.", e);
        config.electrophysiology = ElectrophysiologyConfig::default();
    }
    if let Err(e) = config.abi.validate() {
        log::warn!("Invalid ABI settings: {}. Using defaults.", e);
        config.abi = AbiConfig::default();
    }

    Ok(config)
}

/// Load one config file, reporting read and parse failures
pub fn load_config_from_path(config_path: &Path) -> Result<MnisConfig> {
    let contents = fs::read_to_string(config_path)
        .map_err(Error::from)
        .context(format!("Failed to read {}", config_path.display()))?;
    let config = parse_and_validate_config(&contents)?;
    log::debug!("Loaded config from {}", config_path.display());
    Ok(config)
}

pub(crate) fn try_load_config_from_path(config_path: &Path) -> Option<MnisConfig> {
    let contents = match fs::read_to_string(config_path) {
        Ok(contents) => contents,
        Err(e) => {
            handle_read_error(config_path, &e);
            return None;
        }
    };

    match parse_and_validate_config(&contents) {
        Ok(config) => {
            log::debug!("Loaded config from {}", config_path.display());
            Some(config)
        }
        Err(e) => {
            log::warn!("{}. Using defaults.", e);
            None
        }
    }
}

pub(crate) fn handle_read_error(config_path: &Path, error: &std::io::Error) {
    // A missing file just means "keep looking"
    if error.kind() != std::io::ErrorKind::NotFound {
        log::warn!(
            "Failed to read config file {}: {}",
            config_path.display(),
            error
        );
    }
}

/// `start` followed by its ancestors, at most `max_depth` directories
pub fn directory_ancestors(start: PathBuf, max_depth: usize) -> impl Iterator<Item = PathBuf> {
    std::iter::successors(Some(start), |dir| {
        let mut parent = dir.clone();
        if parent.pop() {
            Some(parent)
        } else {
            None
        }
    })
    .take(max_depth)
}

/// First readable `.mnis.toml` found walking up from `start`
pub fn find_config_from(start: PathBuf) -> Option<MnisConfig> {
    const MAX_TRAVERSAL_DEPTH: usize = 10;

    directory_ancestors(start, MAX_TRAVERSAL_DEPTH)
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .find_map(|path| try_load_config_from_path(&path))
}

pub fn load_config() -> MnisConfig {
    let current = match std::env::current_dir() {
        Ok(dir) => dir,
        Err(e) => {
            log::warn!(
                "Failed to get current directory: {}. Using default config.",
                e
            );
            return MnisConfig::default();
        }
    };

    find_config_from(current).unwrap_or_else(|| {
        log::debug!("No {} found. Using default config.", CONFIG_FILE_NAME);
        MnisConfig::default()
    })
}
