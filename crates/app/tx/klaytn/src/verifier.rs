//! Signature verification against on-chain account keys.

use alloy_primitives::Address;
use klay_keys::{AccountKey, PublicKey, RecoveryEncoding, Role, SignatureData};

use crate::envelope::Transaction;
use crate::error::{TxError, TxResult};
use crate::signing::single_signature_key;
use crate::traits::TypedTransaction;

/// Outcome of checking one signature list against an account key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerificationReport {
    pub role: Role,
    /// Keys recovered from the signatures, in signature order.
    pub signers: Vec<PublicKey>,
    pub weight: u64,
    pub threshold: u64,
    pub satisfied: bool,
}

/// Signature verifier for all transaction types.
///
/// Verifies that:
/// 1. The chain ID matches the expected value, both on the transaction and
///    inside every EIP-155 `v`
/// 2. The keys recovered from the signatures carry enough weight under the
///    account key for the signing role
#[derive(Clone, Debug)]
pub struct SignatureVerifier {
    /// Expected chain ID for replay protection.
    chain_id: u64,
    /// Whether to require chain ID (reject legacy txs without EIP-155).
    require_chain_id: bool,
}

impl SignatureVerifier {
    /// Create a new verifier with the expected chain ID.
    pub fn new(chain_id: u64) -> Self {
        Self {
            chain_id,
            require_chain_id: true,
        }
    }

    /// Create a verifier that allows legacy transactions without chain ID.
    pub fn new_permissive(chain_id: u64) -> Self {
        Self {
            chain_id,
            require_chain_id: false,
        }
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Verify chain ID matches for a transaction and its signatures.
    pub fn verify_chain_id_for_tx(&self, tx: &Transaction) -> TxResult<()> {
        self.verify_chain_id(tx.chain_id())?;
        let eip155 = matches!(tx.recovery_encoding(), Ok(RecoveryEncoding::Eip155 { .. }));
        if !eip155 {
            return Ok(());
        }
        tx.signatures()
            .iter()
            .chain(tx.fee_payer_signatures())
            .try_for_each(|signature| self.verify_signature_chain_id(signature))
    }

    /// Verify chain ID matches.
    fn verify_chain_id(&self, tx_chain_id: Option<u64>) -> TxResult<()> {
        match tx_chain_id {
            Some(id) if id == self.chain_id => Ok(()),
            None if !self.require_chain_id => Ok(()),
            actual => Err(TxError::InvalidChainId {
                expected: self.chain_id,
                actual,
            }),
        }
    }

    fn verify_signature_chain_id(&self, signature: &SignatureData) -> TxResult<()> {
        match signature.eip155_chain_id() {
            Some(id) if id == self.chain_id => Ok(()),
            // Pre-EIP-155 legacy `v`.
            None if !self.require_chain_id => Ok(()),
            actual => Err(TxError::InvalidChainId {
                expected: self.chain_id,
                actual,
            }),
        }
    }

    /// Weigh the sender signatures against the sender's account key.
    ///
    /// Legacy and Ethereum-compatible types are only satisfied when the
    /// account key for the role is [`AccountKey::Legacy`]; they are then
    /// checked by address recovery.
    pub fn verify_sender(
        &self,
        tx: &Transaction,
        account_key: &AccountKey,
    ) -> TxResult<VerificationReport> {
        self.verify_chain_id_for_tx(tx)?;
        let from = tx.sender().ok_or(TxError::MissingRequiredField("from"))?;
        let role = tx.signing_role();
        let account_key = if tx.single_signature() {
            single_signature_key(Some(account_key), role)
        } else {
            account_key
        };
        let signers = tx.recover_public_keys()?;
        Ok(report(from, role, account_key, signers))
    }

    /// Weigh the fee-payer signatures against the fee payer's account key.
    pub fn verify_fee_payer(
        &self,
        tx: &Transaction,
        account_key: &AccountKey,
    ) -> TxResult<VerificationReport> {
        self.verify_chain_id_for_tx(tx)?;
        let fee_payer = tx
            .fee_delegated()?
            .fee_payer()
            .filter(|payer| !payer.is_zero())
            .ok_or(TxError::MissingRequiredField("feePayer"))?;
        let signers = tx.recover_fee_payer_public_keys()?;
        Ok(report(fee_payer, Role::FeePayer, account_key, signers))
    }
}

fn report(
    address: Address,
    role: Role,
    account_key: &AccountKey,
    signers: Vec<PublicKey>,
) -> VerificationReport {
    let weight = account_key.signing_weight(address, role, &signers);
    tracing::debug!(
        %address,
        %role,
        weight = weight.weight,
        threshold = weight.threshold,
        satisfied = weight.satisfied,
        "verified signatures"
    );
    VerificationReport {
        role,
        signers,
        weight: weight.weight,
        threshold: weight.threshold,
        satisfied: weight.satisfied,
    }
}
