//! Merging independently signed copies of one transaction.

use klay_keys::{RecoveryEncoding, SignatureSet};

use crate::envelope::Transaction;
use crate::error::{TxError, TxResult};
use crate::traits::TypedTransaction;

/// The transaction with its signatures and fee payer removed. Two inputs are
/// the same logical transaction exactly when their skeletons encode
/// identically.
fn skeleton(tx: &Transaction) -> TxResult<Vec<u8>> {
    let mut bare = tx.clone();
    bare.signatures_mut().clear();
    if let Some(delegated) = bare.as_fee_delegated_mut() {
        delegated.set_fee_payer(None);
        delegated.fee_payer_signatures_mut().clear();
    }
    bare.rlp_encoding()
}

/// Merge the signatures of several copies of one transaction.
///
/// Sender and fee-payer signatures are unioned separately and kept in
/// canonical order, so the result does not depend on input order. The fee
/// payer is taken from whichever input names one; two different fee payers
/// are a mismatch, and so are copies signed for different chains.
pub fn combine(transactions: &[Transaction]) -> TxResult<Transaction> {
    let (first, rest) = transactions
        .split_first()
        .ok_or(TxError::MissingRequiredField("transactions"))?;
    let reference = skeleton(first)?;

    let mut combined = first.clone();
    let mut signatures = first.signatures().clone().sorted();
    let mut fee_payer_signatures =
        SignatureSet::from_wire(first.fee_payer_signatures().iter().copied()).sorted();

    for (position, tx) in rest.iter().enumerate() {
        if skeleton(tx)? != reference {
            tracing::warn!(
                position = position + 1,
                tx_type = %tx.tx_type(),
                "combine input is a different transaction"
            );
            return Err(TxError::TransactionMismatch);
        }

        match (combined.chain_id(), tx.chain_id()) {
            (Some(ours), Some(theirs)) if ours != theirs => {
                tracing::warn!(ours, theirs, "combine inputs target different chains");
                return Err(TxError::TransactionMismatch);
            }
            (None, Some(theirs)) => combined.set_chain_id(theirs),
            _ => {}
        }
        if combined.sender().is_none() {
            if let Some(sender) = tx.sender() {
                combined.set_sender(sender);
            }
        }
        merge_fee_payer(&mut combined, tx)?;

        signatures = signatures.union(tx.signatures());
        fee_payer_signatures = fee_payer_signatures.union(&SignatureSet::from_wire(
            tx.fee_payer_signatures().iter().copied(),
        ));
    }

    if combined.single_signature() && signatures.len() > 1 {
        tracing::warn!(
            tx_type = %combined.tx_type(),
            signatures = signatures.len(),
            "combine inputs carry different signatures for a single-signature type"
        );
        return Err(TxError::SingleSignatureOnly);
    }

    check_signature_chain_ids(&combined, &signatures, &fee_payer_signatures)?;

    *combined.signatures_mut() = signatures;
    if let Some(delegated) = combined.as_fee_delegated_mut() {
        *delegated.fee_payer_signatures_mut() = fee_payer_signatures;
    }

    tracing::debug!(
        tx_type = %combined.tx_type(),
        inputs = transactions.len(),
        signatures = combined.signatures().len(),
        fee_payer_signatures = combined.fee_payer_signatures().len(),
        "combined transactions"
    );
    Ok(combined)
}

/// Every EIP-155 `v` must name the chain the merged transaction targets.
fn check_signature_chain_ids(
    combined: &Transaction,
    signatures: &SignatureSet,
    fee_payer_signatures: &SignatureSet,
) -> TxResult<()> {
    let Some(chain_id) = combined.chain_id() else {
        return Ok(());
    };
    if !matches!(
        combined.recovery_encoding(),
        Ok(RecoveryEncoding::Eip155 { .. })
    ) {
        return Ok(());
    }
    let foreign = signatures
        .iter()
        .chain(fee_payer_signatures.iter())
        .find_map(|signature| {
            signature
                .eip155_chain_id()
                .filter(|signed_for| *signed_for != chain_id)
        });
    match foreign {
        Some(signed_for) => {
            tracing::warn!(
                chain_id,
                signed_for,
                "combine input carries a signature for another chain"
            );
            Err(TxError::TransactionMismatch)
        }
        None => Ok(()),
    }
}

fn merge_fee_payer(combined: &mut Transaction, tx: &Transaction) -> TxResult<()> {
    let Some(theirs) = tx.fee_payer().filter(|payer| !payer.is_zero()) else {
        return Ok(());
    };
    let Some(delegated) = combined.as_fee_delegated_mut() else {
        return Ok(());
    };
    match delegated.fee_payer().filter(|payer| !payer.is_zero()) {
        None => delegated.set_fee_payer(Some(theirs)),
        Some(ours) if ours != theirs => {
            tracing::warn!(%ours, %theirs, "combine inputs name different fee payers");
            return Err(TxError::TransactionMismatch);
        }
        Some(_) => {}
    }
    Ok(())
}

/// Decode raw transactions, combine them and return the merged raw hex.
pub fn combine_signed_raw_transactions<S: AsRef<str>>(raw_transactions: &[S]) -> TxResult<String> {
    let transactions = raw_transactions
        .iter()
        .map(|raw| Transaction::decode_hex(raw.as_ref()))
        .collect::<Result<Vec<_>, _>>()?;
    combine(&transactions)?.raw_transaction()
}

#[cfg(test)]
#[allow(clippy::indexing_slicing, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::klaytn::{FeeDelegated, KlaytnTx, ValueTransferFields};
    use crate::signing::SignOptions;
    use alloy_primitives::{Address, U256};
    use klay_keys::{Keyring, MultipleKeyring, PrivateKey, SingleKeyring};

    fn key(byte: u8) -> PrivateKey {
        PrivateKey::from_bytes(&[byte; 32]).unwrap()
    }

    fn unsigned(from: Address) -> Transaction {
        KlaytnTx::new(
            from,
            50_000,
            ValueTransferFields {
                to: Address::repeat_byte(0x75),
                value: U256::from(5u64),
            },
            FeeDelegated::new(),
        )
        .with_nonce(7)
        .with_gas_price(25)
        .with_chain_id(1001)
        .into()
    }

    fn multisig_parts() -> (Transaction, Transaction, Transaction) {
        let address = Address::repeat_byte(0x42);
        let keyring: Keyring = MultipleKeyring::new(address, vec![key(1), key(2), key(3)]).into();
        let mut parts = (0..3).map(|index| {
            let mut tx = unsigned(address);
            tx.sign(&keyring, &SignOptions::with_index(index)).unwrap();
            tx
        });
        (
            parts.next().unwrap(),
            parts.next().unwrap(),
            parts.next().unwrap(),
        )
    }

    #[test]
    fn test_combine_unions_signatures() {
        let (a, b, c) = multisig_parts();
        let combined = combine(&[a.clone(), b.clone(), c.clone()]).unwrap();
        assert_eq!(combined.signatures().len(), 3);
        assert_eq!(combine(&[c, b, a]).unwrap(), combined);
    }

    #[test]
    fn test_combine_is_idempotent() {
        let (a, _, _) = multisig_parts();
        let combined = combine(&[a.clone(), a.clone()]).unwrap();
        assert_eq!(combined.signatures(), a.signatures());
    }

    #[test]
    fn test_combine_adopts_fee_payer() {
        let sender: Keyring = SingleKeyring::from_private_key(key(1)).into();
        let payer: Keyring = SingleKeyring::from_private_key(key(2)).into();
        let mut signed = unsigned(sender.address());
        signed.sign(&sender, &SignOptions::default()).unwrap();
        let mut cosigned = signed.clone();
        cosigned
            .sign_as_fee_payer(&payer, &SignOptions::default())
            .unwrap();

        let combined = combine(&[signed, cosigned.clone()]).unwrap();
        assert_eq!(combined.fee_payer(), Some(payer.address()));
        assert_eq!(combined.fee_payer_signatures(), cosigned.fee_payer_signatures());
    }

    #[test]
    fn test_combine_rejects_different_transactions() {
        let a = unsigned(Address::repeat_byte(1));
        let mut b = a.clone();
        b.set_nonce(8);
        assert_eq!(combine(&[a, b]).unwrap_err(), TxError::TransactionMismatch);
        assert_eq!(
            combine(&[]).unwrap_err(),
            TxError::MissingRequiredField("transactions")
        );
    }

    #[test]
    fn test_combine_rejects_other_chain() {
        let sender: Keyring = SingleKeyring::from_private_key(key(1)).into();
        let mut ours = unsigned(sender.address());
        ours.sign(&sender, &SignOptions::default()).unwrap();
        let mut theirs = unsigned(sender.address());
        theirs.set_chain_id(1);
        theirs.sign(&sender, &SignOptions::default()).unwrap();

        assert_eq!(
            combine(&[ours.clone(), theirs.clone()]).unwrap_err(),
            TxError::TransactionMismatch
        );
        assert_eq!(
            combine(&[theirs, ours]).unwrap_err(),
            TxError::TransactionMismatch
        );
    }

    #[test]
    fn test_combine_raw_hex() {
        let (a, b, _) = multisig_parts();
        let raw = combine_signed_raw_transactions(&[
            a.raw_transaction().unwrap(),
            b.raw_transaction().unwrap(),
        ])
        .unwrap();
        let decoded = Transaction::decode_hex(&raw).unwrap();
        assert_eq!(decoded.signatures().len(), 2);
        assert!(combine_signed_raw_transactions(&["0x0b"]).is_err());
    }
}
