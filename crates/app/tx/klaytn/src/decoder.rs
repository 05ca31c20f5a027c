//! Decoder with a configurable set of accepted transaction types.

use std::collections::BTreeSet;

use crate::envelope::Transaction;
use crate::error::{DecodeError, DecodeResult};
use crate::tx_type::TxType;

/// Configurable decoder for typed transactions.
///
/// Allows restricting which transaction types are accepted, e.g. to reject
/// Ethereum-compatible types on a network that has not enabled them.
#[derive(Clone, Debug)]
pub struct TypedTxDecoder {
    /// Set of allowed transaction types.
    allowed_types: BTreeSet<TxType>,
}

impl TypedTxDecoder {
    /// Accept legacy and every chain-native type, but no Ethereum-compatible type.
    pub fn native() -> Self {
        Self::with_types(TxType::ALL.iter().copied().filter(|ty| !ty.is_ethereum()))
    }

    /// Accept specific transaction types.
    pub fn with_types(types: impl IntoIterator<Item = TxType>) -> Self {
        Self {
            allowed_types: types.into_iter().collect(),
        }
    }

    /// Accept every type the codec understands.
    pub fn permissive() -> Self {
        Self::with_types(TxType::ALL.iter().copied())
    }

    /// Add a transaction type to the allowed set.
    pub fn allow_type(&mut self, tx_type: TxType) -> &mut Self {
        self.allowed_types.insert(tx_type);
        self
    }

    /// Remove a transaction type from the allowed set.
    pub fn deny_type(&mut self, tx_type: TxType) -> &mut Self {
        self.allowed_types.remove(&tx_type);
        self
    }

    pub fn is_allowed(&self, tx_type: TxType) -> bool {
        self.allowed_types.contains(&tx_type)
    }

    /// Decode `bytes`, rejecting disallowed types before the body is parsed.
    pub fn decode(&self, bytes: &[u8]) -> DecodeResult<Transaction> {
        let tx_type = Transaction::peek_type(bytes)?;
        if !self.is_allowed(tx_type) {
            tracing::debug!(%tx_type, "rejected transaction type");
            return Err(DecodeError::DisallowedType(tx_type.tag()));
        }
        Transaction::decode(bytes)
    }

    pub fn decode_hex(&self, raw: &str) -> DecodeResult<Transaction> {
        let digits = raw.strip_prefix("0x").unwrap_or(raw);
        let bytes = hex::decode(digits).map_err(|err| DecodeError::InvalidHex(err.to_string()))?;
        self.decode(&bytes)
    }
}

impl Default for TypedTxDecoder {
    fn default() -> Self {
        Self::permissive()
    }
}
