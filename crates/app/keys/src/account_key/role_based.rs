//! Per-role authority of a role-based account.

use crate::crypto::PublicKey;
use crate::role::Role;

use super::weighted::WeightedMultiSigKey;

/// Authority for a single role of a role-based account.
///
/// Unlike [`super::AccountKey`] it cannot itself be role-based.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum RoleKey {
    /// No authority for this role. Inside an account update it leaves the
    /// role unchanged.
    #[default]
    Nil,
    Legacy,
    Public(PublicKey),
    Fail,
    WeightedMultiSig(WeightedMultiSigKey),
}

impl RoleKey {
    pub fn view(&self) -> RoleKeyRef<'_> {
        match self {
            RoleKey::Nil => RoleKeyRef::Nil,
            RoleKey::Legacy => RoleKeyRef::Legacy,
            RoleKey::Public(key) => RoleKeyRef::Public(key),
            RoleKey::Fail => RoleKeyRef::Fail,
            RoleKey::WeightedMultiSig(key) => RoleKeyRef::WeightedMultiSig(key),
        }
    }
}

/// Borrowed view of the authority that applies to one role.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RoleKeyRef<'a> {
    Nil,
    Legacy,
    Public(&'a PublicKey),
    Fail,
    WeightedMultiSig(&'a WeightedMultiSigKey),
}

/// Separate authority for transactions, account updates and fee payment.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct RoleBasedKey {
    pub transaction: RoleKey,
    pub update: RoleKey,
    pub fee_payer: RoleKey,
}

impl RoleBasedKey {
    pub fn new(transaction: RoleKey, update: RoleKey, fee_payer: RoleKey) -> Self {
        Self {
            transaction,
            update,
            fee_payer,
        }
    }

    pub fn get(&self, role: Role) -> &RoleKey {
        match role {
            Role::Transaction => &self.transaction,
            Role::AccountUpdate => &self.update,
            Role::FeePayer => &self.fee_payer,
        }
    }

    /// Role keys in on-chain order.
    pub fn entries(&self) -> [&RoleKey; 3] {
        [&self.transaction, &self.update, &self.fee_payer]
    }
}
