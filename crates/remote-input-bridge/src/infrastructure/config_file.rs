//! TOML persistence for [`BridgeConfig`].

use std::path::Path;

use tracing::{debug, info};

use crate::domain::{BridgeConfig, ConfigError};

/// Reads and validates a config file.
///
/// # Errors
///
/// - [`ConfigError::Io`] if the file cannot be read.
/// - [`ConfigError::Parse`] if the TOML is malformed.
/// - [`ConfigError::InvalidPortRange`] if the range is unusable.
pub fn load_config(path: &Path) -> Result<BridgeConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config: BridgeConfig = toml::from_str(&content)?;
    config.validate()?;
    info!("loaded config from {}", path.display());
    Ok(config)
}

/// Loads `path` if given, otherwise returns the defaults.
///
/// An explicitly requested file that does not exist is an error; silently
/// ignoring it would hide a typo on the command line.
///
/// # Errors
///
/// See [`load_config`].
pub fn load_config_or_default(path: Option<&Path>) -> Result<BridgeConfig, ConfigError> {
    match path {
        Some(path) => load_config(path),
        None => {
            debug!("no config file given; using defaults");
            Ok(BridgeConfig::default())
        }
    }
}
