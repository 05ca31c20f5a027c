//! Key, keyring and signature error types.

use alloy_primitives::Address;
use thiserror::Error;

use crate::account_key::MAX_WEIGHTED_KEYS;
use crate::encoding::FieldError;
use crate::role::Role;

/// Errors raised while building keys, resolving signers or handling signatures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    /// The keyring cannot sign for the requested role.
    #[error("keyring {address} holds no usable key for the {role} role")]
    NoKeyForRole { address: Address, role: Role },

    /// A decoupled key was offered where only the address-derived key is valid.
    #[error("keyring {address} is decoupled from its address; legacy signing needs the key the address was derived from")]
    AmbiguousLegacyKey { address: Address },

    /// A key index was requested that the keyring does not hold.
    #[error("key index {index} out of range for the {role} role ({len} keys)")]
    KeyIndexOutOfRange { role: Role, index: usize, len: usize },

    /// A `v`, `r` or `s` component is not a well-formed hex quantity.
    #[error("invalid signature shape: {0}")]
    InvalidSignatureShape(String),

    /// Private key bytes are not a valid secp256k1 scalar.
    #[error("invalid private key: {0}")]
    InvalidPrivateKey(String),

    /// Public key bytes are not a valid SEC1 point.
    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    /// Account key bytes or parameters are malformed.
    #[error("invalid account key: {0}")]
    InvalidAccountKey(String),

    /// Weighted multisig threshold is zero or above the total weight.
    #[error("invalid threshold {threshold}: total weight is {total_weight}")]
    InvalidThreshold { threshold: u32, total_weight: u64 },

    /// Weighted multisig key lists more keys than the chain accepts.
    #[error("weighted multisig key holds {0} keys, at most {MAX_WEIGHTED_KEYS} allowed")]
    TooManyKeys(usize),

    /// The same public key appears twice in a weighted multisig key.
    #[error("duplicate public key in weighted multisig key")]
    DuplicateKey,

    /// A keyring for this address is already registered.
    #[error("keyring for {0} already exists")]
    DuplicateKeyring(Address),

    /// No keyring is registered for this address.
    #[error("no keyring registered for {0}")]
    UnknownKeyring(Address),

    /// Public key recovery failed.
    #[error("failed to recover signer from signature")]
    SignatureRecovery,

    /// KlaytnWalletKey string is malformed.
    #[error("invalid KlaytnWalletKey: {0}")]
    InvalidWalletKey(String),

    /// Malformed RLP inside an encoded key.
    #[error(transparent)]
    Field(#[from] FieldError),
}

/// Result type for key operations.
pub type KeyResult<T> = Result<T, KeyError>;
