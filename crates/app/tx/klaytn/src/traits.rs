//! Core traits for typed transactions.

use std::fmt;

use alloy_primitives::{keccak256, Address, B256, U256};
use klay_keys::{RecoveryEncoding, Role, SignatureData, SignatureSet};

use crate::error::{TxError, TxResult};
use crate::fields::FeeRatio;
use crate::tx_type::TxType;

/// Interface shared by every transaction type.
///
/// Encodings that need a field which has not been filled in yet (nonce, gas
/// price, chain id) fail with [`TxError::MissingRequiredField`].
pub trait TypedTransaction: fmt::Debug + Send + Sync {
    fn tx_type(&self) -> TxType;

    /// The sending account. Always present for chain-native types; legacy and
    /// Ethereum-style transactions learn it when signed.
    fn sender(&self) -> Option<Address>;

    fn set_sender(&mut self, sender: Address);

    fn nonce(&self) -> Option<u64>;

    fn set_nonce(&mut self, nonce: u64);

    /// Gas limit.
    fn gas(&self) -> u64;

    /// Single gas price. Dynamic-fee transactions have none and ignore
    /// [`TypedTransaction::set_gas_price`].
    fn gas_price(&self) -> Option<u128>;

    fn set_gas_price(&mut self, gas_price: u128);

    fn chain_id(&self) -> Option<u64>;

    fn set_chain_id(&mut self, chain_id: u64);

    /// Recipient, if the type has one.
    fn to(&self) -> Option<Address> {
        None
    }

    fn value(&self) -> U256 {
        U256::ZERO
    }

    fn input(&self) -> &[u8] {
        &[]
    }

    /// Role whose keys produce the sender signatures.
    fn signing_role(&self) -> Role {
        Role::Transaction
    }

    /// Whether only one sender signature is allowed (legacy and Ethereum types).
    fn single_signature(&self) -> bool {
        false
    }

    /// How the recovery id is folded into `v` for this type.
    fn recovery_encoding(&self) -> TxResult<RecoveryEncoding> {
        let chain_id = self
            .chain_id()
            .ok_or(TxError::MissingRequiredField("chainId"))?;
        Ok(RecoveryEncoding::Eip155 { chain_id })
    }

    fn signatures(&self) -> &SignatureSet;

    fn signatures_mut(&mut self) -> &mut SignatureSet;

    /// Add sender signatures, dropping placeholders and duplicates.
    fn append_signatures(&mut self, signatures: &[SignatureData]) -> TxResult<()> {
        if self.single_signature() {
            let mut merged = self.signatures().clone();
            merged.extend(signatures.iter().copied());
            if merged.len() > 1 {
                return Err(TxError::SingleSignatureOnly);
            }
        }
        self.signatures_mut().extend(signatures.iter().copied());
        Ok(())
    }

    /// Bytes the sender signs (before hashing).
    fn rlp_encoding_for_signature(&self) -> TxResult<Vec<u8>>;

    /// Full wire encoding, type prefix included.
    fn rlp_encoding(&self) -> TxResult<Vec<u8>>;

    /// `0x`-prefixed lowercase hex of [`TypedTransaction::rlp_encoding`].
    fn raw_transaction(&self) -> TxResult<String> {
        Ok(format!("0x{}", hex::encode(self.rlp_encoding()?)))
    }

    fn transaction_hash(&self) -> TxResult<B256> {
        Ok(keccak256(self.rlp_encoding()?))
    }

    /// Hash of the transaction as the sender sees it, before fee-payer data.
    fn sender_tx_hash(&self) -> TxResult<B256> {
        self.transaction_hash()
    }

    fn as_fee_delegated(&self) -> Option<&dyn FeeDelegatedTransaction> {
        None
    }

    fn as_fee_delegated_mut(&mut self) -> Option<&mut dyn FeeDelegatedTransaction> {
        None
    }
}

/// Fee-payer side of fee-delegated transactions.
pub trait FeeDelegatedTransaction: TypedTransaction {
    /// Fee payer address; `None` until a fee payer is named.
    fn fee_payer(&self) -> Option<Address>;

    fn set_fee_payer(&mut self, fee_payer: Option<Address>);

    /// Fee share carried by the fee payer, for the `WithRatio` types.
    fn fee_ratio(&self) -> Option<FeeRatio>;

    fn fee_payer_signatures(&self) -> &SignatureSet;

    fn fee_payer_signatures_mut(&mut self) -> &mut SignatureSet;

    fn append_fee_payer_signatures(&mut self, signatures: &[SignatureData]) {
        self.fee_payer_signatures_mut()
            .extend(signatures.iter().copied());
    }

    /// Bytes the fee payer signs (before hashing).
    fn rlp_encoding_for_fee_payer_signature(&self) -> TxResult<Vec<u8>>;
}
