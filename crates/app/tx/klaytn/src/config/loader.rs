//! YAML loading of the offline chain context.

use std::path::Path;

use crate::config::errors::ConfigError;
use crate::config::types::ChainContextConfig;
use crate::config::validation::validate_config;

/// Read `path` and return its validated chain context.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<ChainContextConfig, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::FileRead {
        path: path.display().to_string(),
        source,
    })?;
    load_config_from_str(&content, &path.display().to_string())
}

/// Parse a chain context from YAML text. `source_name` only labels errors.
pub fn load_config_from_str(
    content: &str,
    source_name: &str,
) -> Result<ChainContextConfig, ConfigError> {
    let config: ChainContextConfig =
        serde_yaml::from_str(content).map_err(|source| ConfigError::Parse {
            source_name: source_name.to_owned(),
            source,
        })?;
    validate_config(&config)?;
    tracing::debug!(
        source_name,
        chain_id = config.chain.chain_id,
        accounts = config.accounts.len(),
        "loaded chain context"
    );
    Ok(config)
}
