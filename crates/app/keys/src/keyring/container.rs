use std::collections::BTreeMap;

use alloy_primitives::Address;
use k256::elliptic_curve::rand_core::CryptoRngCore;

use crate::error::{KeyError, KeyResult};

use super::{Keyring, SingleKeyring};

/// In-memory keyrings indexed by address.
#[derive(Clone, Debug, Default)]
pub struct KeyringContainer {
    keyrings: BTreeMap<Address, Keyring>,
}

impl KeyringContainer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a keyring. Fails if its address is already present.
    pub fn add(&mut self, keyring: impl Into<Keyring>) -> KeyResult<&Keyring> {
        let keyring = keyring.into();
        let address = keyring.address();
        if self.keyrings.contains_key(&address) {
            return Err(KeyError::DuplicateKeyring(address));
        }
        Ok(self.keyrings.entry(address).or_insert(keyring))
    }

    /// Replace the keyring registered for the same address.
    pub fn update(&mut self, keyring: impl Into<Keyring>) -> KeyResult<Keyring> {
        let keyring = keyring.into();
        let address = keyring.address();
        match self.keyrings.get_mut(&address) {
            Some(slot) => Ok(std::mem::replace(slot, keyring)),
            None => Err(KeyError::UnknownKeyring(address)),
        }
    }

    pub fn get(&self, address: &Address) -> Option<&Keyring> {
        self.keyrings.get(address)
    }

    pub fn remove(&mut self, address: &Address) -> Option<Keyring> {
        self.keyrings.remove(address)
    }

    pub fn contains(&self, address: &Address) -> bool {
        self.keyrings.contains_key(address)
    }

    /// Generate `count` coupled single-key keyrings and register them.
    pub fn generate(&mut self, count: usize, rng: &mut impl CryptoRngCore) -> Vec<Address> {
        let mut added = Vec::with_capacity(count);
        while added.len() < count {
            let keyring = SingleKeyring::generate(rng);
            let address = keyring.address();
            if self.add(keyring).is_ok() {
                added.push(address);
            }
        }
        added
    }

    pub fn addresses(&self) -> impl Iterator<Item = &Address> {
        self.keyrings.keys()
    }

    pub fn len(&self) -> usize {
        self.keyrings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keyrings.is_empty()
    }
}
