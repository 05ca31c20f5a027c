//! Transaction envelope over every supported type.

use alloy_primitives::{Address, B256, U256};
use klay_keys::encoding::FieldError;
use klay_keys::{RecoveryEncoding, Role, SignatureData, SignatureSet};

use crate::error::{DecodeError, DecodeResult, TxError, TxResult};
use crate::ethereum::{AccessListTransaction, DynamicFeeTransaction, LegacyTransaction};
use crate::fields::FeeRatio;
use crate::klaytn::*;
use crate::traits::{FeeDelegatedTransaction, TypedTransaction};
use crate::tx_type::{TxType, ETHEREUM_TX_TYPE_PREFIX};

/// Map list-level failures, reporting bytes after the list as trailing
/// transaction bytes.
pub(crate) fn list_error(err: FieldError) -> DecodeError {
    match err {
        FieldError::TrailingBytes(count) => DecodeError::TrailingBytes(count),
        other => DecodeError::Field(other),
    }
}

macro_rules! transactions {
    ($($variant:ident($ty:ty),)*) => {
        /// A transaction of any supported type.
        ///
        /// Variants are named after their [`TxType`].
        #[derive(Clone, Debug, PartialEq, Eq)]
        pub enum Transaction {
            $($variant($ty),)*
        }

        impl Transaction {
            pub fn as_typed(&self) -> &dyn TypedTransaction {
                match self {
                    $(Transaction::$variant(tx) => tx,)*
                }
            }

            pub fn as_typed_mut(&mut self) -> &mut dyn TypedTransaction {
                match self {
                    $(Transaction::$variant(tx) => tx,)*
                }
            }

            /// Decode the body that follows the type prefix.
            fn decode_body(tx_type: TxType, body: &[u8]) -> DecodeResult<Self> {
                match tx_type {
                    $(TxType::$variant => Ok(Transaction::$variant(<$ty>::decode_fields(body)?)),)*
                }
            }
        }

        $(
            impl From<$ty> for Transaction {
                fn from(tx: $ty) -> Self {
                    Transaction::$variant(tx)
                }
            }
        )*
    };
}

transactions! {
    Legacy(LegacyTransaction),
    ValueTransfer(ValueTransfer),
    FeeDelegatedValueTransfer(FeeDelegatedValueTransfer),
    FeeDelegatedValueTransferWithRatio(FeeDelegatedValueTransferWithRatio),
    ValueTransferMemo(ValueTransferMemo),
    FeeDelegatedValueTransferMemo(FeeDelegatedValueTransferMemo),
    FeeDelegatedValueTransferMemoWithRatio(FeeDelegatedValueTransferMemoWithRatio),
    AccountUpdate(AccountUpdate),
    FeeDelegatedAccountUpdate(FeeDelegatedAccountUpdate),
    FeeDelegatedAccountUpdateWithRatio(FeeDelegatedAccountUpdateWithRatio),
    SmartContractDeploy(SmartContractDeploy),
    FeeDelegatedSmartContractDeploy(FeeDelegatedSmartContractDeploy),
    FeeDelegatedSmartContractDeployWithRatio(FeeDelegatedSmartContractDeployWithRatio),
    SmartContractExecution(SmartContractExecution),
    FeeDelegatedSmartContractExecution(FeeDelegatedSmartContractExecution),
    FeeDelegatedSmartContractExecutionWithRatio(FeeDelegatedSmartContractExecutionWithRatio),
    Cancel(Cancel),
    FeeDelegatedCancel(FeeDelegatedCancel),
    FeeDelegatedCancelWithRatio(FeeDelegatedCancelWithRatio),
    ChainDataAnchoring(ChainDataAnchoring),
    FeeDelegatedChainDataAnchoring(FeeDelegatedChainDataAnchoring),
    FeeDelegatedChainDataAnchoringWithRatio(FeeDelegatedChainDataAnchoringWithRatio),
    EthereumAccessList(AccessListTransaction),
    EthereumDynamicFee(DynamicFeeTransaction),
}

impl Transaction {
    /// Decode a raw transaction.
    ///
    /// # Transaction Format
    ///
    /// - Legacy: RLP list starting with 0xc0-0xff
    /// - Ethereum-compatible: `0x78`, the EIP-2718 type byte, then the RLP payload
    /// - Chain-native: type byte followed by the RLP payload
    pub fn decode(bytes: &[u8]) -> DecodeResult<Self> {
        let (&first, rest) = bytes.split_first().ok_or(DecodeError::EmptyInput)?;

        // RLP list prefixes start at 0xc0
        if first >= 0xc0 {
            return Ok(Transaction::Legacy(LegacyTransaction::decode_fields(bytes)?));
        }

        let (tag, body) = if first == ETHEREUM_TX_TYPE_PREFIX {
            let (&envelope_type, body) = rest
                .split_first()
                .ok_or(DecodeError::UnknownType(u16::from(first)))?;
            (u16::from_be_bytes([first, envelope_type]), body)
        } else {
            (u16::from(first), rest)
        };

        let tx_type = TxType::from_tag(tag)
            .filter(|ty| *ty != TxType::Legacy)
            .ok_or(DecodeError::UnknownType(tag))?;
        Self::decode_body(tx_type, body)
    }

    /// Decode a `0x`-prefixed (or bare) hex string.
    pub fn decode_hex(raw: &str) -> DecodeResult<Self> {
        let digits = raw.strip_prefix("0x").unwrap_or(raw);
        let bytes = hex::decode(digits).map_err(|err| DecodeError::InvalidHex(err.to_string()))?;
        Self::decode(&bytes)
    }

    /// Peek at the type of a raw transaction without decoding its body.
    pub fn peek_type(bytes: &[u8]) -> DecodeResult<TxType> {
        let (&first, rest) = bytes.split_first().ok_or(DecodeError::EmptyInput)?;
        if first >= 0xc0 {
            return Ok(TxType::Legacy);
        }
        let tag = if first == ETHEREUM_TX_TYPE_PREFIX {
            let envelope_type = rest
                .first()
                .copied()
                .ok_or(DecodeError::UnknownType(u16::from(first)))?;
            u16::from_be_bytes([first, envelope_type])
        } else {
            u16::from(first)
        };
        TxType::from_tag(tag)
            .filter(|ty| *ty != TxType::Legacy)
            .ok_or(DecodeError::UnknownType(tag))
    }

    pub fn is_fee_delegated(&self) -> bool {
        self.as_typed().as_fee_delegated().is_some()
    }

    /// Fee-payer view, or [`TxError::NotFeeDelegated`].
    pub fn fee_delegated(&self) -> TxResult<&dyn FeeDelegatedTransaction> {
        let tx_type = self.tx_type();
        self.as_fee_delegated()
            .ok_or(TxError::NotFeeDelegated(tx_type.name()))
    }

    pub fn fee_delegated_mut(&mut self) -> TxResult<&mut dyn FeeDelegatedTransaction> {
        let tx_type = self.tx_type();
        self.as_typed_mut()
            .as_fee_delegated_mut()
            .ok_or(TxError::NotFeeDelegated(tx_type.name()))
    }

    pub fn fee_payer(&self) -> Option<Address> {
        self.as_fee_delegated().and_then(|tx| tx.fee_payer())
    }

    pub fn fee_ratio(&self) -> Option<FeeRatio> {
        self.as_fee_delegated().and_then(|tx| tx.fee_ratio())
    }

    /// Fee-payer signatures; empty for types without fee delegation.
    pub fn fee_payer_signatures(&self) -> &[SignatureData] {
        match self.as_fee_delegated() {
            Some(tx) => tx.fee_payer_signatures(),
            None => &[],
        }
    }

    pub fn rlp_encoding_for_fee_payer_signature(&self) -> TxResult<Vec<u8>> {
        self.fee_delegated()?.rlp_encoding_for_fee_payer_signature()
    }
}

impl TypedTransaction for Transaction {
    fn tx_type(&self) -> TxType {
        self.as_typed().tx_type()
    }

    fn sender(&self) -> Option<Address> {
        self.as_typed().sender()
    }

    fn set_sender(&mut self, sender: Address) {
        self.as_typed_mut().set_sender(sender)
    }

    fn nonce(&self) -> Option<u64> {
        self.as_typed().nonce()
    }

    fn set_nonce(&mut self, nonce: u64) {
        self.as_typed_mut().set_nonce(nonce)
    }

    fn gas(&self) -> u64 {
        self.as_typed().gas()
    }

    fn gas_price(&self) -> Option<u128> {
        self.as_typed().gas_price()
    }

    fn set_gas_price(&mut self, gas_price: u128) {
        self.as_typed_mut().set_gas_price(gas_price)
    }

    fn chain_id(&self) -> Option<u64> {
        self.as_typed().chain_id()
    }

    fn set_chain_id(&mut self, chain_id: u64) {
        self.as_typed_mut().set_chain_id(chain_id)
    }

    fn to(&self) -> Option<Address> {
        self.as_typed().to()
    }

    fn value(&self) -> U256 {
        self.as_typed().value()
    }

    fn input(&self) -> &[u8] {
        self.as_typed().input()
    }

    fn signing_role(&self) -> Role {
        self.as_typed().signing_role()
    }

    fn single_signature(&self) -> bool {
        self.as_typed().single_signature()
    }

    fn recovery_encoding(&self) -> TxResult<RecoveryEncoding> {
        self.as_typed().recovery_encoding()
    }

    fn signatures(&self) -> &SignatureSet {
        self.as_typed().signatures()
    }

    fn signatures_mut(&mut self) -> &mut SignatureSet {
        self.as_typed_mut().signatures_mut()
    }

    fn append_signatures(&mut self, signatures: &[SignatureData]) -> TxResult<()> {
        self.as_typed_mut().append_signatures(signatures)
    }

    fn rlp_encoding_for_signature(&self) -> TxResult<Vec<u8>> {
        self.as_typed().rlp_encoding_for_signature()
    }

    fn rlp_encoding(&self) -> TxResult<Vec<u8>> {
        self.as_typed().rlp_encoding()
    }

    fn transaction_hash(&self) -> TxResult<B256> {
        self.as_typed().transaction_hash()
    }

    fn sender_tx_hash(&self) -> TxResult<B256> {
        self.as_typed().sender_tx_hash()
    }

    fn as_fee_delegated(&self) -> Option<&dyn FeeDelegatedTransaction> {
        self.as_typed().as_fee_delegated()
    }

    fn as_fee_delegated_mut(&mut self) -> Option<&mut dyn FeeDelegatedTransaction> {
        self.as_typed_mut().as_fee_delegated_mut()
    }
}
