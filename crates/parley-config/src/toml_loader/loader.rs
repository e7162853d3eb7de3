//! Reading `ParleyConfig` from disk.

use std::io::ErrorKind;
use std::path::Path;

use parley_common::ConfigError;
use tracing::{info, warn};

use super::paths::{create_default_config, default_config_path};
use crate::schema::ParleyConfig;
use crate::validation;

/// Parse the TOML file at `path`. Absent keys take their defaults.
///
/// Out-of-range values are reported with `warn!` but do not fail the load;
/// use [`crate::load_config`] to reject them.
pub fn load_from_path(path: &Path) -> Result<ParleyConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => ConfigError::FileNotFound(path.to_path_buf()),
        _ => ConfigError::ParseError(format!("cannot read {}: {e}", path.display())),
    })?;

    let config: ParleyConfig = toml::from_str(&content)
        .map_err(|e| ConfigError::ParseError(format!("{}: {e}", path.display())))?;

    if let Err(e) = validation::validate(&config) {
        warn!(path = %path.display(), "config has out-of-range values: {e}");
    }

    info!(path = %path.display(), "config loaded");
    Ok(config)
}

/// Load `<config dir>/parley/config.toml`, writing the commented template
/// there on first run.
pub fn load_default() -> Result<ParleyConfig, ConfigError> {
    let path = default_config_path()?;

    match load_from_path(&path) {
        Err(ConfigError::FileNotFound(_)) => {
            create_default_config(&path)?;
            Ok(ParleyConfig::default())
        }
        loaded => loaded,
    }
}
