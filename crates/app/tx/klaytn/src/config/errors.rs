//! Errors raised while reading an offline chain context.

use alloy_primitives::Address;
use klay_keys::KeyError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read chain context '{path}': {source}")]
    FileRead {
        path: String,
        source: std::io::Error,
    },

    /// Malformed YAML, a missing section or a key the schema does not know.
    #[error("invalid chain context '{source_name}': {source}")]
    Parse {
        source_name: String,
        source: serde_yaml::Error,
    },

    /// Every rule the parsed values broke, one line each.
    #[error("chain context rejected:\n{}", .0.join("\n"))]
    ValidationFailed(Vec<String>),

    /// A registered account key that does not decode.
    #[error("account {address} has an undecodable account key: {source}")]
    AccountKey {
        address: Address,
        source: KeyError,
    },
}
