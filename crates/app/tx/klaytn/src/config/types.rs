//! Configuration types for offline signing.

use alloy_primitives::Address;
use serde::Deserialize;

/// Root configuration of an offline chain context.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChainContextConfig {
    /// Chain-specific configuration.
    pub chain: ChainConfig,

    /// Fee values used when a transaction leaves them unset.
    #[serde(default)]
    pub fees: FeeConfig,

    /// Known accounts.
    #[serde(default)]
    pub accounts: Vec<AccountConfig>,
}

/// Chain-specific configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChainConfig {
    /// Unique chain identifier. Must be > 0.
    pub chain_id: u64,
}

/// Fee values, in the chain's smallest unit.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FeeConfig {
    #[serde(default = "FeeConfig::default_gas_price")]
    pub gas_price: u64,
    #[serde(default = "FeeConfig::default_max_priority_fee_per_gas")]
    pub max_priority_fee_per_gas: u64,
    #[serde(default = "FeeConfig::default_base_fee_per_gas")]
    pub base_fee_per_gas: u64,
}

impl Default for FeeConfig {
    fn default() -> Self {
        Self {
            gas_price: Self::default_gas_price(),
            max_priority_fee_per_gas: Self::default_max_priority_fee_per_gas(),
            base_fee_per_gas: Self::default_base_fee_per_gas(),
        }
    }
}

impl FeeConfig {
    /// 25 gkei.
    const fn default_gas_price() -> u64 {
        25_000_000_000
    }

    const fn default_max_priority_fee_per_gas() -> u64 {
        25_000_000_000
    }

    const fn default_base_fee_per_gas() -> u64 {
        25_000_000_000
    }
}

/// One account known to the offline context.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AccountConfig {
    pub address: Address,

    /// Next nonce to use.
    #[serde(default)]
    pub nonce: u64,

    /// Hex encoding of the registered account key. Unset means unknown.
    #[serde(default)]
    pub account_key: Option<String>,
}
