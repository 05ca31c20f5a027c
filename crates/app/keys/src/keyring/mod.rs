//! Private key holders bound to an account address.

mod container;
mod multiple;
mod role_based;
mod single;
mod wallet_key;

use alloy_primitives::{Address, B256};
use k256::elliptic_curve::rand_core::CryptoRngCore;

use crate::account_key::{AccountKey, WeightedMultiSigOptions};
use crate::crypto::PrivateKey;
use crate::error::{KeyError, KeyResult};
use crate::message::{hash_message, SignedMessage};
use crate::role::Role;
use crate::signature::{RecoveryEncoding, SignatureData};

pub use container::KeyringContainer;
pub use multiple::MultipleKeyring;
pub use role_based::RoleBasedKeyring;
pub use single::SingleKeyring;
pub use wallet_key::KlaytnWalletKey;

/// Private key material for one account.
///
/// Keyrings are not checked against on-chain state: the address may be
/// decoupled from the keys, and it is the account key registered on chain
/// that decides which of them count.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Keyring {
    Single(SingleKeyring),
    Multiple(MultipleKeyring),
    RoleBased(RoleBasedKeyring),
}

impl Keyring {
    /// A fresh keyring whose address is derived from a random key.
    pub fn generate(rng: &mut impl CryptoRngCore) -> Self {
        Keyring::Single(SingleKeyring::generate(rng))
    }

    pub fn address(&self) -> Address {
        match self {
            Keyring::Single(k) => k.address(),
            Keyring::Multiple(k) => k.address(),
            Keyring::RoleBased(k) => k.address(),
        }
    }

    /// Keys usable for `role`, in keyring order.
    pub fn keys_for_role(&self, role: Role) -> &[PrivateKey] {
        match self {
            Keyring::Single(k) => std::slice::from_ref(k.key()),
            Keyring::Multiple(k) => k.keys(),
            Keyring::RoleBased(k) => k.keys(role),
        }
    }

    /// Whether the address is not the one derived from the keyring's key.
    ///
    /// Multiple and role-based keyrings are always decoupled.
    pub fn is_decoupled(&self) -> bool {
        match self {
            Keyring::Single(k) => k.is_decoupled(),
            Keyring::Multiple(_) | Keyring::RoleBased(_) => true,
        }
    }

    /// Keys for `role`, or only the one at `index`.
    pub fn select_keys(&self, role: Role, index: Option<usize>) -> KeyResult<&[PrivateKey]> {
        let keys = self.keys_for_role(role);
        if keys.is_empty() {
            return Err(KeyError::NoKeyForRole {
                address: self.address(),
                role,
            });
        }
        match index {
            None => Ok(keys),
            Some(index) => keys
                .get(index..=index)
                .ok_or(KeyError::KeyIndexOutOfRange {
                    role,
                    index,
                    len: keys.len(),
                }),
        }
    }

    /// Sign `hash` with every key for `role`, or only the one at `index`.
    pub fn sign_hash(
        &self,
        hash: B256,
        encoding: RecoveryEncoding,
        role: Role,
        index: Option<usize>,
    ) -> KeyResult<Vec<SignatureData>> {
        self.select_keys(role, index)?
            .iter()
            .map(|key| key.sign(hash, encoding))
            .collect()
    }

    /// Sign an arbitrary message with the signed-message prefix.
    pub fn sign_message(
        &self,
        message: &[u8],
        role: Role,
        index: Option<usize>,
    ) -> KeyResult<SignedMessage> {
        let message_hash = hash_message(message);
        let signatures = self.sign_hash(message_hash, RecoveryEncoding::Message, role, index)?;
        Ok(SignedMessage {
            message: message.to_vec(),
            message_hash,
            signatures,
        })
    }

    /// The account key to register for this keyring, with default weights.
    pub fn to_account_key(&self) -> KeyResult<AccountKey> {
        match self {
            Keyring::Single(k) => Ok(k.to_account_key()),
            Keyring::Multiple(k) => {
                k.to_account_key(&WeightedMultiSigOptions::uniform(k.keys().len()))
            }
            Keyring::RoleBased(k) => k.to_account_key(&[None, None, None]),
        }
    }

    /// Export in the legacy wallet-key format. Single keyrings only.
    pub fn to_wallet_key(&self) -> KeyResult<KlaytnWalletKey> {
        match self {
            Keyring::Single(k) => Ok(KlaytnWalletKey::from(k)),
            _ => Err(KeyError::InvalidWalletKey(
                "only single-key keyrings have a wallet key".to_string(),
            )),
        }
    }
}

impl From<SingleKeyring> for Keyring {
    fn from(keyring: SingleKeyring) -> Self {
        Keyring::Single(keyring)
    }
}

impl From<MultipleKeyring> for Keyring {
    fn from(keyring: MultipleKeyring) -> Self {
        Keyring::Multiple(keyring)
    }
}

impl From<RoleBasedKeyring> for Keyring {
    fn from(keyring: RoleBasedKeyring) -> Self {
        Keyring::RoleBased(keyring)
    }
}

impl From<KlaytnWalletKey> for Keyring {
    fn from(key: KlaytnWalletKey) -> Self {
        Keyring::Single(key.into_keyring())
    }
}

#[cfg(test)]
#[allow(clippy::indexing_slicing, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::account_key::{RoleBasedKey, RoleKey};
    use crate::crypto::recover_address;
    use alloy_primitives::keccak256;
    use rand::rngs::OsRng;

    #[test]
    fn test_single_keyring_coupling() {
        let coupled = Keyring::generate(&mut OsRng);
        assert!(!coupled.is_decoupled());

        let decoupled = Keyring::from(SingleKeyring::new(
            Address::repeat_byte(0x42),
            PrivateKey::random(&mut OsRng),
        ));
        assert!(decoupled.is_decoupled());
    }

    #[test]
    fn test_sign_hash_all_and_indexed() {
        let keyring = Keyring::from(MultipleKeyring::generate(
            Address::repeat_byte(0x01),
            3,
            &mut OsRng,
        ));
        let hash = keccak256(b"multi");
        let encoding = RecoveryEncoding::Eip155 { chain_id: 1001 };

        let all = keyring.sign_hash(hash, encoding, Role::Transaction, None).unwrap();
        assert_eq!(all.len(), 3);

        let second = keyring
            .sign_hash(hash, encoding, Role::Transaction, Some(1))
            .unwrap();
        assert_eq!(second, vec![all[1]]);
        assert_eq!(
            recover_address(hash, &second[0]).unwrap(),
            keyring.keys_for_role(Role::Transaction)[1].address()
        );

        assert_eq!(
            keyring
                .sign_hash(hash, encoding, Role::Transaction, Some(3))
                .unwrap_err(),
            KeyError::KeyIndexOutOfRange {
                role: Role::Transaction,
                index: 3,
                len: 3
            }
        );
    }

    #[test]
    fn test_role_based_empty_role() {
        let keyring = Keyring::from(RoleBasedKeyring::generate(
            Address::repeat_byte(0x02),
            [1, 2, 0],
            &mut OsRng,
        ));
        assert_eq!(keyring.keys_for_role(Role::AccountUpdate).len(), 2);
        assert!(matches!(
            keyring.sign_hash(
                keccak256(b"x"),
                RecoveryEncoding::YParity,
                Role::FeePayer,
                None
            ),
            Err(KeyError::NoKeyForRole {
                role: Role::FeePayer,
                ..
            })
        ));
    }

    #[test]
    fn test_to_account_key() {
        let single = SingleKeyring::generate(&mut OsRng);
        assert_eq!(
            Keyring::from(single.clone()).to_account_key().unwrap(),
            AccountKey::Public(single.key().public_key())
        );

        let multiple = Keyring::from(MultipleKeyring::generate(
            Address::repeat_byte(0x03),
            2,
            &mut OsRng,
        ));
        match multiple.to_account_key().unwrap() {
            AccountKey::WeightedMultiSig(key) => {
                assert_eq!(key.threshold(), 1);
                assert_eq!(key.keys().len(), 2);
            }
            other => panic!("unexpected key {other:?}"),
        }

        let role_based = RoleBasedKeyring::generate(Address::repeat_byte(0x04), [1, 3, 0], &mut OsRng);
        let options = [
            None,
            Some(WeightedMultiSigOptions {
                threshold: 2,
                weights: vec![1, 1, 1],
            }),
            None,
        ];
        match role_based.to_account_key(&options).unwrap() {
            AccountKey::RoleBased(RoleBasedKey {
                transaction: RoleKey::Public(_),
                update: RoleKey::WeightedMultiSig(update),
                fee_payer: RoleKey::Nil,
            }) => assert_eq!(update.threshold(), 2),
            other => panic!("unexpected key {other:?}"),
        }
    }

    #[test]
    fn test_sign_message() {
        let keyring = Keyring::generate(&mut OsRng);
        let signed = keyring.sign_message(b"hello", Role::Transaction, None).unwrap();
        assert_eq!(signed.message_hash, hash_message(b"hello"));
        assert_eq!(
            recover_address(signed.message_hash, &signed.signatures[0]).unwrap(),
            keyring.address()
        );
    }

    #[test]
    fn test_wallet_key_only_for_single() {
        let single = Keyring::generate(&mut OsRng);
        let exported = single.to_wallet_key().unwrap().to_string();
        assert_eq!(Keyring::from(KlaytnWalletKey::parse(&exported).unwrap()), single);

        let multiple = Keyring::from(MultipleKeyring::generate(
            Address::repeat_byte(0x05),
            2,
            &mut OsRng,
        ));
        assert!(multiple.to_wallet_key().is_err());
    }
}
