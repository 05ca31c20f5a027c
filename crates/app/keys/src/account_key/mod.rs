//! On-chain account authority.
//!
//! [`AccountKey`] is what an account has registered on chain. It decides
//! which recovered public keys count towards a valid signature for each
//! [`Role`], and how much weight they carry.

mod codec;
mod role_based;
mod weighted;

use alloy_primitives::Address;

use crate::crypto::PublicKey;
use crate::role::Role;

pub use codec::key_type;
pub use role_based::{RoleBasedKey, RoleKey, RoleKeyRef};
pub use weighted::{
    WeightedMultiSigKey, WeightedMultiSigOptions, WeightedPublicKey, MAX_WEIGHTED_KEYS,
};

/// The authority structure registered for an account.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum AccountKey {
    /// Signatures must come from the key the address was derived from.
    #[default]
    Legacy,
    /// A single public key, independent of the address.
    Public(PublicKey),
    /// The account can never sign.
    Fail,
    /// Threshold multisig.
    WeightedMultiSig(WeightedMultiSigKey),
    /// Separate authority per role.
    RoleBased(RoleBasedKey),
}

/// Outcome of weighing recovered signers against an account key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SignatureWeight {
    pub weight: u64,
    pub threshold: u64,
    pub satisfied: bool,
}

impl SignatureWeight {
    fn single(satisfied: bool) -> Self {
        Self {
            weight: u64::from(satisfied),
            threshold: 1,
            satisfied,
        }
    }
}

impl AccountKey {
    /// The authority that applies to `role`.
    ///
    /// Non role-based keys answer every role with themselves.
    pub fn key_for_role(&self, role: Role) -> RoleKeyRef<'_> {
        match self {
            AccountKey::Legacy => RoleKeyRef::Legacy,
            AccountKey::Public(key) => RoleKeyRef::Public(key),
            AccountKey::Fail => RoleKeyRef::Fail,
            AccountKey::WeightedMultiSig(key) => RoleKeyRef::WeightedMultiSig(key),
            AccountKey::RoleBased(key) => key.get(role).view(),
        }
    }

    /// Weight that `signers` carry for `role` on the account at `address`.
    pub fn signing_weight(
        &self,
        address: Address,
        role: Role,
        signers: &[PublicKey],
    ) -> SignatureWeight {
        self.key_for_role(role).signing_weight(address, signers)
    }

    pub fn is_satisfied_by(&self, address: Address, role: Role, signers: &[PublicKey]) -> bool {
        self.signing_weight(address, role, signers).satisfied
    }
}

impl RoleKeyRef<'_> {
    pub fn signing_weight(&self, address: Address, signers: &[PublicKey]) -> SignatureWeight {
        match self {
            RoleKeyRef::Nil | RoleKeyRef::Fail => SignatureWeight::single(false),
            RoleKeyRef::Legacy => {
                SignatureWeight::single(signers.iter().any(|key| key.address() == address))
            }
            RoleKeyRef::Public(expected) => SignatureWeight::single(signers.contains(*expected)),
            RoleKeyRef::WeightedMultiSig(key) => {
                let weight = key.matched_weight(signers);
                let threshold = u64::from(key.threshold());
                SignatureWeight {
                    weight,
                    threshold,
                    satisfied: weight >= threshold,
                }
            }
        }
    }

    /// Whether `key` is an authorised signer under this role key.
    ///
    /// `Legacy` accepts only the key whose address is `address`.
    pub fn accepts(&self, address: Address, key: &PublicKey) -> bool {
        match self {
            RoleKeyRef::Nil | RoleKeyRef::Fail => false,
            RoleKeyRef::Legacy => key.address() == address,
            RoleKeyRef::Public(expected) => *expected == key,
            RoleKeyRef::WeightedMultiSig(multisig) => multisig.contains(key),
        }
    }
}
