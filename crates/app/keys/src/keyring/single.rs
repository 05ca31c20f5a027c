use alloy_primitives::Address;
use k256::elliptic_curve::rand_core::CryptoRngCore;

use crate::account_key::AccountKey;
use crate::crypto::PrivateKey;

/// One private key signing every role for an address.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SingleKeyring {
    address: Address,
    key: PrivateKey,
}

impl SingleKeyring {
    /// Bind `key` to `address`. The address need not derive from the key.
    pub fn new(address: Address, key: PrivateKey) -> Self {
        Self { address, key }
    }

    /// Keyring whose address is derived from `key`.
    pub fn from_private_key(key: PrivateKey) -> Self {
        Self {
            address: key.address(),
            key,
        }
    }

    pub fn generate(rng: &mut impl CryptoRngCore) -> Self {
        Self::from_private_key(PrivateKey::random(rng))
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn key(&self) -> &PrivateKey {
        &self.key
    }

    pub fn is_decoupled(&self) -> bool {
        self.key.address() != self.address
    }

    /// The `Public` key to register for this keyring.
    pub fn to_account_key(&self) -> AccountKey {
        AccountKey::Public(self.key.public_key())
    }
}
