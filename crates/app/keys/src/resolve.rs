//! Selection of the private keys that must sign for a role.

use crate::account_key::{AccountKey, RoleKeyRef};
use crate::crypto::PrivateKey;
use crate::error::{KeyError, KeyResult};
use crate::keyring::Keyring;
use crate::role::Role;

/// What to do when a `Legacy` account key meets a decoupled keyring.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LegacyKeyPolicy {
    /// Fail with [`KeyError::AmbiguousLegacyKey`].
    #[default]
    RequireCoupled,
    /// Sign with the keyring's keys anyway.
    AllowDecoupled,
}

/// Constraints on signer resolution.
#[derive(Clone, Copy, Debug, Default)]
pub struct SignerQuery<'a> {
    /// On-chain key of the account, when known.
    pub account_key: Option<&'a AccountKey>,
    /// Restrict signing to the key at this position.
    pub index: Option<usize>,
    pub legacy_policy: LegacyKeyPolicy,
}

impl<'a> SignerQuery<'a> {
    pub fn with_account_key(account_key: &'a AccountKey) -> Self {
        Self {
            account_key: Some(account_key),
            ..Self::default()
        }
    }
}

/// Keys from `keyring` that should sign for `role`.
///
/// Without an account key every candidate key signs. With one, only the keys
/// that key accepts do; a role the account key cannot satisfy at all yields
/// [`KeyError::NoKeyForRole`].
pub fn resolve_signers<'k>(
    keyring: &'k Keyring,
    role: Role,
    query: &SignerQuery<'_>,
) -> KeyResult<Vec<&'k PrivateKey>> {
    let address = keyring.address();
    let candidates = keyring.select_keys(role, query.index)?;
    let no_key = || KeyError::NoKeyForRole { address, role };

    let Some(account_key) = query.account_key else {
        return Ok(candidates.iter().collect());
    };

    let selected: Vec<&PrivateKey> = match account_key.key_for_role(role) {
        RoleKeyRef::Nil | RoleKeyRef::Fail => return Err(no_key()),
        RoleKeyRef::Legacy => {
            if keyring.is_decoupled() && query.legacy_policy == LegacyKeyPolicy::RequireCoupled {
                return Err(KeyError::AmbiguousLegacyKey { address });
            }
            candidates.iter().collect()
        }
        RoleKeyRef::Public(expected) => candidates
            .iter()
            .filter(|key| key.public_key() == *expected)
            .collect(),
        RoleKeyRef::WeightedMultiSig(multisig) => candidates
            .iter()
            .filter(|key| multisig.contains(&key.public_key()))
            .collect(),
    };

    tracing::debug!(
        %address,
        %role,
        candidates = candidates.len(),
        selected = selected.len(),
        "resolved signers"
    );

    if selected.is_empty() {
        return Err(no_key());
    }
    Ok(selected)
}
