use alloy_primitives::Address;
use k256::elliptic_curve::rand_core::CryptoRngCore;

use crate::account_key::{AccountKey, WeightedMultiSigOptions};
use crate::crypto::PrivateKey;
use crate::error::KeyResult;

/// Several private keys, each signing every role for an address.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MultipleKeyring {
    address: Address,
    keys: Vec<PrivateKey>,
}

impl MultipleKeyring {
    pub fn new(address: Address, keys: Vec<PrivateKey>) -> Self {
        Self { address, keys }
    }

    pub fn generate(address: Address, count: usize, rng: &mut impl CryptoRngCore) -> Self {
        let keys = (0..count).map(|_| PrivateKey::random(rng)).collect();
        Self::new(address, keys)
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn keys(&self) -> &[PrivateKey] {
        &self.keys
    }

    /// The weighted multisig key to register for this keyring.
    pub fn to_account_key(&self, options: &WeightedMultiSigOptions) -> KeyResult<AccountKey> {
        let public = self.keys.iter().map(PrivateKey::public_key).collect();
        options.apply(public).map(AccountKey::WeightedMultiSig)
    }
}
