//! Transaction error types.

use alloy_primitives::Address;
use klay_keys::encoding::FieldError;
use klay_keys::KeyError;
use thiserror::Error;

/// Errors raised while decoding a raw transaction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("empty transaction input")]
    EmptyInput,

    #[error("invalid hex input: {0}")]
    InvalidHex(String),

    #[error("unknown transaction type {0:#x}")]
    UnknownType(u16),

    #[error("transaction type {0:#x} is not accepted by this decoder")]
    DisallowedType(u16),

    #[error("{tx_type} expects {expected} fields, got {actual}")]
    FieldCount {
        tx_type: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error(transparent)]
    Field(#[from] FieldError),

    #[error("invalid `{field}`: {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("{0} trailing bytes after transaction")]
    TrailingBytes(usize),
}

/// Errors raised while building, signing or combining transactions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TxError {
    /// A field is forbidden, malformed or out of range for the transaction type.
    #[error("field `{field}`: {reason}")]
    SchemaViolation { field: String, reason: String },

    /// An encoding needs a field that has not been set yet.
    #[error("missing required field `{0}`")]
    MissingRequiredField(&'static str),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Key(#[from] KeyError),

    /// Combined transactions differ outside of their signatures.
    #[error("transactions differ in more than their signatures")]
    TransactionMismatch,

    /// The signer's address does not match the one the transaction names.
    #[error("address mismatch: transaction names {expected}, signer is {actual}")]
    AddressMismatch { expected: Address, actual: Address },

    /// Legacy and Ethereum-style transactions carry exactly one signature.
    #[error("transaction type accepts a single signature")]
    SingleSignatureOnly,

    /// A fee-payer operation on a transaction without fee delegation.
    #[error("transaction type {0} is not fee-delegated")]
    NotFeeDelegated(&'static str),

    /// The transaction or one of its signatures targets another chain.
    #[error("chain id mismatch: expected {expected}, got {actual:?}")]
    InvalidChainId { expected: u64, actual: Option<u64> },

    /// The injected chain context failed.
    #[error("chain context: {0}")]
    Context(String),
}

impl TxError {
    pub fn schema(field: impl Into<String>, reason: impl Into<String>) -> Self {
        TxError::SchemaViolation {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl From<FieldError> for TxError {
    fn from(err: FieldError) -> Self {
        TxError::Decode(DecodeError::Field(err))
    }
}

/// Result type for decoding.
pub type DecodeResult<T> = Result<T, DecodeError>;

/// Result type for transaction operations.
pub type TxResult<T> = Result<T, TxError>;
