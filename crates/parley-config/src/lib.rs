//! Parley configuration system.
//!
//! TOML-based configuration for the chat client: API endpoint and
//! credentials, session budget, rate limiting, retry backoff and logging.
//! All sections use defaults so partial configs work out of the box.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use parley_config::{load_config, config_to_json};
//!
//! let config = load_config().expect("failed to load config");
//! let json = config_to_json(&config);
//! println!("{json}");
//! ```

pub mod schema;
pub mod toml_loader;
pub mod validation;

pub use schema::{ParleyConfig, CONFIG_SCHEMA_VERSION};
pub use toml_loader::{load_default, load_from_path};

use parley_common::ConfigError;

/// Load config from the platform default path and validate it strictly.
///
/// Unlike [`load_default`], a config that fails validation is an error here.
pub fn load_config() -> Result<ParleyConfig, ConfigError> {
    let config = toml_loader::load_default()?;
    validation::validate(&config)?;
    Ok(config)
}

/// Serialize a config to a pretty-printed JSON string.
///
/// The API key is masked.
pub fn config_to_json(config: &ParleyConfig) -> String {
    let mut redacted = config.clone();
    if !redacted.api.api_key.is_empty() {
        redacted.api.api_key = "[REDACTED]".into();
    }
    serde_json::to_string_pretty(&redacted)
        .unwrap_or_else(|e| format!("{{\"error\": \"failed to serialize config: {e}\"}}"))
}
