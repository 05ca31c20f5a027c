//! Ethereum-compatible transaction types.
//!
//! These carry a single `v, r, s` triple inline instead of a signature list,
//! and can only be validated by address recovery, so they always sign against
//! an implied legacy account key.

mod access_list;
mod dynamic_fee;
mod legacy;

pub use access_list::AccessListTransaction;
pub use dynamic_fee::DynamicFeeTransaction;
pub use legacy::LegacyTransaction;

use alloy_primitives::{keccak256, Address, U256};
use klay_keys::encoding::{FieldReader, RlpList};
use klay_keys::{recover_address, SignatureData, SignatureSet};

use crate::error::{DecodeError, DecodeResult};
use crate::traits::TypedTransaction;

/// Append the inline `v, r, s` of a single-signature transaction.
///
/// Unsigned transactions write the placeholder triple.
pub(crate) fn push_signature(list: &mut RlpList, signatures: &SignatureSet) {
    let signature = signatures
        .first()
        .copied()
        .unwrap_or(SignatureData::PLACEHOLDER);
    list.push(&signature.v).push(&signature.r).push(&signature.s);
}

/// Read an inline `v, r, s` triple into a set (empty for the placeholder).
pub(crate) fn read_signature(reader: &mut FieldReader<'_>) -> DecodeResult<SignatureSet> {
    let v: u64 = reader.next("v")?;
    let r: U256 = reader.next("r")?;
    let s: U256 = reader.next("s")?;
    Ok(SignatureSet::from_wire([SignatureData::new(v, r, s)]))
}

/// Typed Ethereum transactions carry a bare y-parity in `v`.
pub(crate) fn check_y_parity(signatures: &SignatureSet) -> DecodeResult<()> {
    match signatures.iter().find(|sig| sig.v > 1) {
        Some(sig) => Err(DecodeError::InvalidField {
            field: "v",
            reason: format!("expected y-parity 0 or 1, got {}", sig.v),
        }),
        None => Ok(()),
    }
}

/// Sender address recovered from the transaction's own signature.
///
/// `None` when unsigned or when the signing preimage cannot be built (a
/// pre-EIP-155 legacy signature carries no chain id).
pub(crate) fn recover_sender(tx: &dyn TypedTransaction) -> DecodeResult<Option<Address>> {
    let Some(signature) = tx.signatures().first().copied() else {
        return Ok(None);
    };
    let Ok(preimage) = tx.rlp_encoding_for_signature() else {
        return Ok(None);
    };
    recover_address(keccak256(preimage), &signature)
        .map(Some)
        .map_err(|err| DecodeError::InvalidField {
            field: "signature",
            reason: err.to_string(),
        })
}

/// `prefix || payload`.
pub(crate) fn prefixed(prefix: &[u8], payload: Vec<u8>) -> Vec<u8> {
    let mut out = Vec::with_capacity(prefix.len() + payload.len());
    out.extend_from_slice(prefix);
    out.extend(payload);
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_unsigned_triple_is_placeholder() {
        let mut list = RlpList::new();
        push_signature(&mut list, &SignatureSet::new());
        assert_eq!(list.finish(), vec![0xc3, 0x01, 0x80, 0x80]);
    }

    #[test]
    fn test_read_signature_drops_placeholder() {
        let encoded = RlpList::new().push(&1u64).push(&U256::ZERO).push(&U256::ZERO).finish();
        let mut reader = FieldReader::new(&encoded).unwrap();
        assert!(read_signature(&mut reader).unwrap().is_empty());
    }
}
