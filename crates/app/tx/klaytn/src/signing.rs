//! Sender and fee-payer signing.
//!
//! Signatures are always produced on a copy of the transaction and only
//! written back once every key has signed, so a failing call leaves the
//! transaction untouched.

use alloy_primitives::{keccak256, Address, B256};
use klay_keys::{
    recover_public_key, resolve_signers, AccountKey, KeyError, Keyring, KeyringContainer,
    LegacyKeyPolicy, PublicKey, RecoveryEncoding, Role, RoleKeyRef, SignatureData, SignerQuery,
};

use crate::envelope::Transaction;
use crate::error::{TxError, TxResult};
use crate::traits::TypedTransaction;

/// Options shared by the signing entry points.
#[derive(Clone, Copy, Debug, Default)]
pub struct SignOptions<'a> {
    /// Sign with only the key at this position for the role.
    pub index: Option<usize>,
    /// On-chain key of the signing account, when known.
    pub account_key: Option<&'a AccountKey>,
    pub legacy_policy: LegacyKeyPolicy,
}

impl<'a> SignOptions<'a> {
    pub fn with_index(index: usize) -> Self {
        Self {
            index: Some(index),
            ..Self::default()
        }
    }

    pub fn with_account_key(account_key: &'a AccountKey) -> Self {
        Self {
            account_key: Some(account_key),
            ..Self::default()
        }
    }

    fn query(&self, account_key: Option<&'a AccountKey>) -> SignerQuery<'a> {
        SignerQuery {
            account_key,
            index: self.index,
            legacy_policy: self.legacy_policy,
        }
    }
}

/// Implied authority of types that are only validated by address recovery.
static IMPLIED_LEGACY_KEY: AccountKey = AccountKey::Legacy;

static REJECTING_KEY: AccountKey = AccountKey::Fail;

/// The key a single-signature type is checked against.
///
/// Those types are only accepted from accounts whose key for `role` is
/// `Legacy`, which is also assumed when the account key is unknown. Any
/// other account key can never authorize them.
pub(crate) fn single_signature_key(
    account_key: Option<&AccountKey>,
    role: Role,
) -> &'static AccountKey {
    match account_key.map(|key| key.key_for_role(role)) {
        None | Some(RoleKeyRef::Legacy) => &IMPLIED_LEGACY_KEY,
        Some(_) => &REJECTING_KEY,
    }
}

fn sign_hash(
    keyring: &Keyring,
    role: Role,
    query: &SignerQuery<'_>,
    hash: B256,
    encoding: RecoveryEncoding,
) -> TxResult<Vec<SignatureData>> {
    let signatures = resolve_signers(keyring, role, query)?
        .into_iter()
        .map(|key| key.sign(hash, encoding))
        .collect::<Result<Vec<_>, KeyError>>()?;
    Ok(signatures)
}

fn unset(address: Option<Address>) -> bool {
    address.map_or(true, |address| address.is_zero())
}

impl Transaction {
    /// Sign as the sender and append the new signatures.
    ///
    /// The keyring address must be the transaction's `from`; legacy and
    /// Ethereum-style transactions without one adopt it.
    pub fn sign(&mut self, keyring: &Keyring, options: &SignOptions<'_>) -> TxResult<()> {
        let address = keyring.address();
        let mut next = self.clone();
        match next.sender() {
            Some(from) if from != address => {
                return Err(TxError::AddressMismatch {
                    expected: from,
                    actual: address,
                })
            }
            Some(_) => {}
            None => next.set_sender(address),
        }

        let role = next.signing_role();
        let account_key = if next.single_signature() {
            Some(single_signature_key(options.account_key, role))
        } else {
            options.account_key
        };
        let hash = keccak256(next.rlp_encoding_for_signature()?);
        let encoding = next.recovery_encoding()?;
        let signatures = sign_hash(keyring, role, &options.query(account_key), hash, encoding)?;
        next.append_signatures(&signatures)?;

        tracing::debug!(
            tx_type = %next.tx_type(),
            %address,
            %role,
            added = signatures.len(),
            total = next.signatures().len(),
            "signed transaction"
        );
        *self = next;
        Ok(())
    }

    /// Co-sign as the fee payer and append the new fee-payer signatures.
    ///
    /// An unset (or zero) fee payer becomes the keyring address; a different
    /// one is rejected.
    pub fn sign_as_fee_payer(
        &mut self,
        keyring: &Keyring,
        options: &SignOptions<'_>,
    ) -> TxResult<()> {
        let address = keyring.address();
        let mut next = self.clone();
        let encoding = next.recovery_encoding()?;
        let delegated = next.fee_delegated_mut()?;
        match delegated.fee_payer() {
            payer if unset(payer) => delegated.set_fee_payer(Some(address)),
            Some(payer) if payer != address => {
                return Err(TxError::AddressMismatch {
                    expected: payer,
                    actual: address,
                })
            }
            _ => {}
        }

        let hash = keccak256(delegated.rlp_encoding_for_fee_payer_signature()?);
        let signatures = sign_hash(
            keyring,
            Role::FeePayer,
            &options.query(options.account_key),
            hash,
            encoding,
        )?;
        delegated.append_fee_payer_signatures(&signatures);

        tracing::debug!(
            tx_type = %next.tx_type(),
            fee_payer = %address,
            added = signatures.len(),
            total = next.fee_payer_signatures().len(),
            "signed transaction as fee payer"
        );
        *self = next;
        Ok(())
    }

    /// Append fee-payer signatures, dropping placeholders and duplicates.
    pub fn append_fee_payer_signatures(&mut self, signatures: &[SignatureData]) -> TxResult<()> {
        self.fee_delegated_mut()?
            .append_fee_payer_signatures(signatures);
        Ok(())
    }

    /// Public keys behind the sender signatures, in signature order.
    pub fn recover_public_keys(&self) -> TxResult<Vec<PublicKey>> {
        let hash = keccak256(self.rlp_encoding_for_signature()?);
        recover_all(hash, self.signatures())
    }

    /// Public keys behind the fee-payer signatures, in signature order.
    pub fn recover_fee_payer_public_keys(&self) -> TxResult<Vec<PublicKey>> {
        let delegated = self.fee_delegated()?;
        let hash = keccak256(delegated.rlp_encoding_for_fee_payer_signature()?);
        recover_all(hash, delegated.fee_payer_signatures())
    }

    /// Sign with the keyring registered for `from` in `container`.
    pub fn sign_with_container(
        &mut self,
        container: &KeyringContainer,
        options: &SignOptions<'_>,
    ) -> TxResult<()> {
        let from = self
            .sender()
            .ok_or(TxError::MissingRequiredField("from"))?;
        let keyring = container
            .get(&from)
            .ok_or(KeyError::UnknownKeyring(from))?;
        self.sign(keyring, options)
    }

    /// Fee-payer sign with a keyring from `container`.
    ///
    /// Uses `fee_payer` when given, otherwise the fee payer already named by
    /// the transaction.
    pub fn sign_as_fee_payer_with_container(
        &mut self,
        container: &KeyringContainer,
        fee_payer: Option<Address>,
        options: &SignOptions<'_>,
    ) -> TxResult<()> {
        let fee_payer = fee_payer
            .or_else(|| self.fee_payer().filter(|payer| !payer.is_zero()))
            .ok_or(TxError::MissingRequiredField("feePayer"))?;
        let keyring = container
            .get(&fee_payer)
            .ok_or(KeyError::UnknownKeyring(fee_payer))?;
        self.sign_as_fee_payer(keyring, options)
    }
}

fn recover_all(hash: B256, signatures: &[SignatureData]) -> TxResult<Vec<PublicKey>> {
    signatures
        .iter()
        .map(|signature| recover_public_key(hash, signature).map_err(TxError::from))
        .collect()
}
