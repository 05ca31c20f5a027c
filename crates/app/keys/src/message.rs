//! Signed message hashing and recovery.

use alloy_primitives::{keccak256, Address, B256};

use crate::crypto::recover_address;
use crate::error::{KeyError, KeyResult};
use crate::signature::SignatureData;

const MESSAGE_PREFIX: &str = "\x19Klaytn Signed Message:\n";

/// `keccak256("\x19Klaytn Signed Message:\n" ‖ len(message) ‖ message)`.
pub fn hash_message(message: &[u8]) -> B256 {
    let mut preimage = Vec::with_capacity(MESSAGE_PREFIX.len() + 20 + message.len());
    preimage.extend_from_slice(MESSAGE_PREFIX.as_bytes());
    preimage.extend_from_slice(message.len().to_string().as_bytes());
    preimage.extend_from_slice(message);
    keccak256(preimage)
}

/// A message together with the signatures a keyring produced over it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignedMessage {
    pub message: Vec<u8>,
    pub message_hash: B256,
    pub signatures: Vec<SignatureData>,
}

/// Recover the signer of `message`.
///
/// With `prehashed` set, `message` must already be the 32-byte message hash.
pub fn recover_message(
    message: &[u8],
    signature: &SignatureData,
    prehashed: bool,
) -> KeyResult<Address> {
    let hash = if prehashed {
        B256::try_from(message).map_err(|_| KeyError::SignatureRecovery)?
    } else {
        hash_message(message)
    };
    recover_address(hash, signature)
}
