use alloy_primitives::Address;
use k256::elliptic_curve::rand_core::CryptoRngCore;

use crate::account_key::{AccountKey, RoleBasedKey, RoleKey, WeightedMultiSigOptions};
use crate::crypto::PrivateKey;
use crate::error::KeyResult;
use crate::role::Role;

/// Separate key lists per role for an address.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoleBasedKeyring {
    address: Address,
    transaction: Vec<PrivateKey>,
    update: Vec<PrivateKey>,
    fee_payer: Vec<PrivateKey>,
}

impl RoleBasedKeyring {
    pub fn new(
        address: Address,
        transaction: Vec<PrivateKey>,
        update: Vec<PrivateKey>,
        fee_payer: Vec<PrivateKey>,
    ) -> Self {
        Self {
            address,
            transaction,
            update,
            fee_payer,
        }
    }

    /// Generate fresh keys, `counts` giving the number per role in on-chain order.
    pub fn generate(address: Address, counts: [usize; 3], rng: &mut impl CryptoRngCore) -> Self {
        let [transaction, update, fee_payer] =
            counts.map(|n| (0..n).map(|_| PrivateKey::random(rng)).collect::<Vec<_>>());
        Self::new(address, transaction, update, fee_payer)
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn keys(&self, role: Role) -> &[PrivateKey] {
        match role {
            Role::Transaction => &self.transaction,
            Role::AccountUpdate => &self.update,
            Role::FeePayer => &self.fee_payer,
        }
    }

    /// The role-based key to register for this keyring.
    ///
    /// A role with no keys maps to `Nil`, one key to `Public` unless options
    /// are given for it, and several keys to a weighted multisig key.
    pub fn to_account_key(
        &self,
        options: &[Option<WeightedMultiSigOptions>; 3],
    ) -> KeyResult<AccountKey> {
        let [transaction, update, fee_payer] = [
            role_key(self.keys(Role::Transaction), options[0].as_ref())?,
            role_key(self.keys(Role::AccountUpdate), options[1].as_ref())?,
            role_key(self.keys(Role::FeePayer), options[2].as_ref())?,
        ];
        Ok(AccountKey::RoleBased(RoleBasedKey::new(
            transaction,
            update,
            fee_payer,
        )))
    }
}

fn role_key(keys: &[PrivateKey], options: Option<&WeightedMultiSigOptions>) -> KeyResult<RoleKey> {
    let public: Vec<_> = keys.iter().map(PrivateKey::public_key).collect();
    if public.is_empty() {
        return Ok(RoleKey::Nil);
    }
    match options {
        Some(options) => Ok(RoleKey::WeightedMultiSig(options.apply(public)?)),
        None if public.len() == 1 => Ok(public
            .into_iter()
            .next()
            .map_or(RoleKey::Nil, RoleKey::Public)),
        None => {
            let options = WeightedMultiSigOptions::uniform(public.len());
            Ok(RoleKey::WeightedMultiSig(options.apply(public)?))
        }
    }
}
