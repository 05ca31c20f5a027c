//! Offline chain-context configuration.
//!
//! A YAML file names the chain, its fee defaults and the accounts a signer
//! knows about; [`StaticChainContext::from_config`] serves it to the builder.

mod errors;
mod loader;
pub mod types;
mod validation;

use std::collections::BTreeMap;

use alloy_primitives::Address;
use klay_keys::AccountKey;

use crate::context::{AccountState, StaticChainContext};

pub use errors::ConfigError;
pub use loader::{load_config, load_config_from_str};
pub use types::{AccountConfig, ChainConfig, ChainContextConfig, FeeConfig};
pub use validation::validate_config;

impl StaticChainContext {
    /// Build a context serving the values of `config`.
    pub fn from_config(config: &ChainContextConfig) -> Result<Self, ConfigError> {
        let accounts: BTreeMap<Address, AccountState> = config
            .accounts
            .iter()
            .map(|account| {
                let account_key = account
                    .account_key
                    .as_deref()
                    .map(AccountKey::from_hex)
                    .transpose()
                    .map_err(|source| ConfigError::AccountKey {
                        address: account.address,
                        source,
                    })?;
                Ok::<(Address, AccountState), ConfigError>((
                    account.address,
                    AccountState {
                        nonce: account.nonce,
                        account_key,
                    },
                ))
            })
            .collect::<Result<_, ConfigError>>()?;

        Ok(Self {
            chain_id: config.chain.chain_id,
            gas_price: u128::from(config.fees.gas_price),
            max_priority_fee_per_gas: u128::from(config.fees.max_priority_fee_per_gas),
            base_fee_per_gas: u128::from(config.fees.base_fee_per_gas),
            accounts,
        })
    }
}
