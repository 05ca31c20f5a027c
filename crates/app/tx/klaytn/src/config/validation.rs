//! Checks on a parsed chain context. Every broken rule is reported.

use std::collections::BTreeSet;

use klay_keys::AccountKey;

use crate::config::errors::ConfigError;
use crate::config::types::{AccountConfig, ChainContextConfig, FeeConfig};

/// Reject a zero chain id, zero fees, and account entries that are zero,
/// repeated or carry an undecodable key.
pub fn validate_config(config: &ChainContextConfig) -> Result<(), ConfigError> {
    let mut errors = Vec::new();

    if config.chain.chain_id == 0 {
        errors.push("chain.chain_id must be greater than 0".to_string());
    }
    validate_fee_config(&config.fees, &mut errors);
    validate_accounts(&config.accounts, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationFailed(errors))
    }
}

fn validate_fee_config(config: &FeeConfig, errors: &mut Vec<String>) {
    if config.gas_price == 0 {
        errors.push("fees.gas_price must be greater than 0".to_string());
    }
    if config.base_fee_per_gas == 0 {
        errors.push("fees.base_fee_per_gas must be greater than 0".to_string());
    }
}

fn validate_accounts(accounts: &[AccountConfig], errors: &mut Vec<String>) {
    let mut seen = BTreeSet::new();
    for (i, account) in accounts.iter().enumerate() {
        if account.address.is_zero() {
            errors.push(format!("accounts[{i}].address cannot be the zero address"));
        }
        if !seen.insert(account.address) {
            errors.push(format!(
                "accounts[{i}].address {} is listed more than once",
                account.address
            ));
        }
        if let Some(encoded) = &account.account_key {
            if let Err(e) = AccountKey::from_hex(encoded) {
                errors.push(format!("accounts[{i}].account_key is invalid: {e}"));
            }
        }
    }
}
