//! KlaytnWalletKey import/export.
//!
//! The format is `0x{private key}0x00{0x-prefixed address}`, kept exactly as
//! older wallets produce it. Only single-key keyrings can be expressed.

use std::fmt;
use std::str::FromStr;

use alloy_primitives::Address;

use crate::crypto::PrivateKey;
use crate::error::{KeyError, KeyResult};

use super::SingleKeyring;

/// Private key plus the address it signs for, in the legacy wallet format.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KlaytnWalletKey {
    key: PrivateKey,
    address: Address,
}

impl KlaytnWalletKey {
    pub fn new(key: PrivateKey, address: Address) -> Self {
        Self { key, address }
    }

    pub fn parse(value: &str) -> KeyResult<Self> {
        let body = value.strip_prefix("0x").unwrap_or(value);
        let parts: Vec<&str> = body.split("0x").collect();
        let [key, flag, address] = parts.as_slice() else {
            return Err(KeyError::InvalidWalletKey(format!(
                "expected three 0x-separated parts, got {}",
                parts.len()
            )));
        };
        if key.len() != 64 || *flag != "00" || address.len() != 40 {
            return Err(KeyError::InvalidWalletKey(
                "expected 64 hex key digits, a 00 flag and 40 hex address digits".to_string(),
            ));
        }

        let key = PrivateKey::from_hex(key)
            .map_err(|e| KeyError::InvalidWalletKey(e.to_string()))?;
        let address = Address::from_str(address)
            .map_err(|e| KeyError::InvalidWalletKey(e.to_string()))?;
        Ok(Self { key, address })
    }

    pub fn key(&self) -> &PrivateKey {
        &self.key
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn into_keyring(self) -> SingleKeyring {
        SingleKeyring::new(self.address, self.key)
    }
}

impl From<&SingleKeyring> for KlaytnWalletKey {
    fn from(keyring: &SingleKeyring) -> Self {
        Self::new(keyring.key().clone(), keyring.address())
    }
}

impl FromStr for KlaytnWalletKey {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for KlaytnWalletKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}0x00{:#x}", self.key.to_hex(), self.address)
    }
}
