//! Chain-native transactions.
//!
//! Every chain-native variant is a [`KlaytnTx`] over a body ([`Payload`]) and
//! a fee arrangement ([`FeeMode`]); the type tag follows from the pair, so a
//! fee ratio on a type without one cannot be expressed.
//!
//! # Wire format
//!
//! ```text
//! common    = rlp([tag, nonce, gasPrice, gas, body...])
//! sender    = rlp([common, chainId, 0x, 0x])
//! fee payer = rlp([common, feePayer, chainId, 0x, 0x])
//! raw       = tag || rlp([nonce, gasPrice, gas, body..., sigs, (feePayer, feePayerSigs)])
//! ```

mod fee;
mod payload;

use alloy_primitives::{keccak256, Address, B256, U256};
use klay_keys::encoding::{FieldReader, RlpList};
use klay_keys::{Role, SignatureSet};

use crate::error::{DecodeError, DecodeResult, TxError, TxResult};
use crate::fields::FeeRatio;
use crate::traits::{FeeDelegatedTransaction, TypedTransaction};
use crate::tx_type::TxType;

pub use fee::{
    DelegatedFee, FeeDelegated, FeeDelegatedWithRatio, FeeMode, FeePayer, SenderPaid,
};
pub use payload::{
    AccountUpdateFields, CancelFields, ChainDataAnchoringFields, Payload,
    SmartContractDeployFields, SmartContractExecutionFields, TypeFamily, ValueTransferFields,
    ValueTransferMemoFields,
};

/// A chain-native transaction with body `P` and fee mode `F`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KlaytnTx<P, F> {
    pub from: Address,
    pub nonce: Option<u64>,
    pub gas_price: Option<u128>,
    pub gas: u64,
    pub chain_id: Option<u64>,
    pub payload: P,
    pub fee: F,
    pub signatures: SignatureSet,
}

pub type ValueTransfer = KlaytnTx<ValueTransferFields, SenderPaid>;
pub type FeeDelegatedValueTransfer = KlaytnTx<ValueTransferFields, FeeDelegated>;
pub type FeeDelegatedValueTransferWithRatio = KlaytnTx<ValueTransferFields, FeeDelegatedWithRatio>;
pub type ValueTransferMemo = KlaytnTx<ValueTransferMemoFields, SenderPaid>;
pub type FeeDelegatedValueTransferMemo = KlaytnTx<ValueTransferMemoFields, FeeDelegated>;
pub type FeeDelegatedValueTransferMemoWithRatio =
    KlaytnTx<ValueTransferMemoFields, FeeDelegatedWithRatio>;
pub type AccountUpdate = KlaytnTx<AccountUpdateFields, SenderPaid>;
pub type FeeDelegatedAccountUpdate = KlaytnTx<AccountUpdateFields, FeeDelegated>;
pub type FeeDelegatedAccountUpdateWithRatio = KlaytnTx<AccountUpdateFields, FeeDelegatedWithRatio>;
pub type SmartContractDeploy = KlaytnTx<SmartContractDeployFields, SenderPaid>;
pub type FeeDelegatedSmartContractDeploy = KlaytnTx<SmartContractDeployFields, FeeDelegated>;
pub type FeeDelegatedSmartContractDeployWithRatio =
    KlaytnTx<SmartContractDeployFields, FeeDelegatedWithRatio>;
pub type SmartContractExecution = KlaytnTx<SmartContractExecutionFields, SenderPaid>;
pub type FeeDelegatedSmartContractExecution = KlaytnTx<SmartContractExecutionFields, FeeDelegated>;
pub type FeeDelegatedSmartContractExecutionWithRatio =
    KlaytnTx<SmartContractExecutionFields, FeeDelegatedWithRatio>;
pub type Cancel = KlaytnTx<CancelFields, SenderPaid>;
pub type FeeDelegatedCancel = KlaytnTx<CancelFields, FeeDelegated>;
pub type FeeDelegatedCancelWithRatio = KlaytnTx<CancelFields, FeeDelegatedWithRatio>;
pub type ChainDataAnchoring = KlaytnTx<ChainDataAnchoringFields, SenderPaid>;
pub type FeeDelegatedChainDataAnchoring = KlaytnTx<ChainDataAnchoringFields, FeeDelegated>;
pub type FeeDelegatedChainDataAnchoringWithRatio =
    KlaytnTx<ChainDataAnchoringFields, FeeDelegatedWithRatio>;

impl<P: Payload, F: FeeMode> KlaytnTx<P, F> {
    /// Items after `nonce, gasPrice, gas` and before the signatures.
    const BODY_ITEMS: usize = P::FIELD_COUNT + F::WITH_RATIO as usize;

    /// An unsigned transaction with nonce, gas price and chain id left to fill.
    pub fn new(from: Address, gas: u64, payload: P, fee: F) -> Self {
        Self {
            from,
            nonce: None,
            gas_price: None,
            gas,
            chain_id: None,
            payload,
            fee,
            signatures: SignatureSet::new(),
        }
    }

    pub fn with_nonce(mut self, nonce: u64) -> Self {
        self.nonce = Some(nonce);
        self
    }

    pub fn with_gas_price(mut self, gas_price: u128) -> Self {
        self.gas_price = Some(gas_price);
        self
    }

    pub fn with_chain_id(mut self, chain_id: u64) -> Self {
        self.chain_id = Some(chain_id);
        self
    }

    /// Number of items in the wire list.
    pub const fn wire_field_count() -> usize {
        3 + Self::BODY_ITEMS + 1 + if F::DELEGATED { 2 } else { 0 }
    }

    fn type_tag(&self) -> u8 {
        // Chain-native tags fit in one byte.
        F::tx_type(P::FAMILY).tag() as u8
    }

    /// `nonce, gasPrice, gas, body...`, optionally led by the type tag.
    fn fields(&self, with_tag: bool) -> TxResult<RlpList> {
        let nonce = self.nonce.ok_or(TxError::MissingRequiredField("nonce"))?;
        let gas_price = self
            .gas_price
            .ok_or(TxError::MissingRequiredField("gasPrice"))?;

        let mut list = RlpList::new();
        if with_tag {
            list.push(&self.type_tag());
        }
        list.push(&nonce).push(&gas_price).push(&self.gas);
        self.payload
            .encode_fields(&self.from, self.fee.ratio(), &mut list);
        Ok(list)
    }

    fn require_chain_id(&self) -> TxResult<u64> {
        self.chain_id
            .ok_or(TxError::MissingRequiredField("chainId"))
    }

    fn tagged(&self, list: &RlpList) -> Vec<u8> {
        let body = list.finish();
        let mut out = Vec::with_capacity(body.len() + 1);
        out.push(self.type_tag());
        out.extend_from_slice(&body);
        out
    }

    /// Decode the RLP list that follows the type tag.
    pub fn decode_fields(input: &[u8]) -> DecodeResult<Self> {
        let tx_type = F::tx_type(P::FAMILY);
        let mut reader = FieldReader::new(input).map_err(crate::envelope::list_error)?;
        let expected = Self::wire_field_count();
        if reader.len() != expected {
            return Err(DecodeError::FieldCount {
                tx_type: tx_type.name(),
                expected,
                actual: reader.len(),
            });
        }

        let nonce = reader.next("nonce")?;
        let gas_price = reader.next("gasPrice")?;
        let gas = reader.next("gas")?;
        let (from, payload, ratio) = P::decode_fields(&mut reader, F::WITH_RATIO)?;
        let signatures: SignatureSet = reader.next("signatures")?;
        let payer = if F::DELEGATED {
            let address = reader.next_optional_address("feePayer")?;
            let signatures = reader.next("feePayerSignatures")?;
            Some(FeePayer {
                address,
                signatures,
            })
        } else {
            None
        };
        reader.finish()?;

        let chain_id = signatures
            .first()
            .and_then(|sig| sig.eip155_chain_id())
            .or_else(|| {
                payer
                    .as_ref()
                    .and_then(|p| p.signatures.first())
                    .and_then(|sig| sig.eip155_chain_id())
            });

        Ok(Self {
            from,
            nonce: Some(nonce),
            gas_price: Some(gas_price),
            gas,
            chain_id,
            payload,
            fee: F::from_wire(ratio, payer)?,
            signatures,
        })
    }
}

impl<P: Payload, F: FeeMode> TypedTransaction for KlaytnTx<P, F> {
    fn tx_type(&self) -> TxType {
        F::tx_type(P::FAMILY)
    }

    fn sender(&self) -> Option<Address> {
        Some(self.from)
    }

    fn set_sender(&mut self, sender: Address) {
        self.from = sender;
    }

    fn nonce(&self) -> Option<u64> {
        self.nonce
    }

    fn set_nonce(&mut self, nonce: u64) {
        self.nonce = Some(nonce);
    }

    fn gas(&self) -> u64 {
        self.gas
    }

    fn gas_price(&self) -> Option<u128> {
        self.gas_price
    }

    fn set_gas_price(&mut self, gas_price: u128) {
        self.gas_price = Some(gas_price);
    }

    fn chain_id(&self) -> Option<u64> {
        self.chain_id
    }

    fn set_chain_id(&mut self, chain_id: u64) {
        self.chain_id = Some(chain_id);
    }

    fn to(&self) -> Option<Address> {
        self.payload.to()
    }

    fn value(&self) -> U256 {
        self.payload.value()
    }

    fn input(&self) -> &[u8] {
        self.payload.input()
    }

    fn signing_role(&self) -> Role {
        self.payload.signing_role()
    }

    fn signatures(&self) -> &SignatureSet {
        &self.signatures
    }

    fn signatures_mut(&mut self) -> &mut SignatureSet {
        &mut self.signatures
    }

    fn rlp_encoding_for_signature(&self) -> TxResult<Vec<u8>> {
        let common = self.fields(true)?.finish();
        let chain_id = self.require_chain_id()?;
        Ok(RlpList::new()
            .push_bytes(&common)
            .push(&chain_id)
            .push_empty()
            .push_empty()
            .finish())
    }

    fn rlp_encoding(&self) -> TxResult<Vec<u8>> {
        let mut list = self.fields(false)?;
        list.push(&self.signatures);
        if let Some(payer) = self.fee.payer() {
            list.push_optional_address(payer.address.as_ref())
                .push(&payer.signatures);
        }
        Ok(self.tagged(&list))
    }

    fn sender_tx_hash(&self) -> TxResult<B256> {
        let mut list = self.fields(false)?;
        list.push(&self.signatures);
        Ok(keccak256(self.tagged(&list)))
    }

    fn as_fee_delegated(&self) -> Option<&dyn FeeDelegatedTransaction> {
        F::as_delegated(self)
    }

    fn as_fee_delegated_mut(&mut self) -> Option<&mut dyn FeeDelegatedTransaction> {
        F::as_delegated_mut(self)
    }
}

impl<P: Payload, F: DelegatedFee> FeeDelegatedTransaction for KlaytnTx<P, F> {
    fn fee_payer(&self) -> Option<Address> {
        self.fee.fee_payer().address
    }

    fn set_fee_payer(&mut self, fee_payer: Option<Address>) {
        self.fee.fee_payer_mut().address = fee_payer;
    }

    fn fee_ratio(&self) -> Option<FeeRatio> {
        self.fee.ratio()
    }

    fn fee_payer_signatures(&self) -> &SignatureSet {
        &self.fee.fee_payer().signatures
    }

    fn fee_payer_signatures_mut(&mut self) -> &mut SignatureSet {
        &mut self.fee.fee_payer_mut().signatures
    }

    fn rlp_encoding_for_fee_payer_signature(&self) -> TxResult<Vec<u8>> {
        let common = self.fields(true)?.finish();
        let fee_payer = self
            .fee
            .fee_payer()
            .address
            .ok_or(TxError::MissingRequiredField("feePayer"))?;
        let chain_id = self.require_chain_id()?;
        Ok(RlpList::new()
            .push_bytes(&common)
            .push(&fee_payer)
            .push(&chain_id)
            .push_empty()
            .push_empty()
            .finish())
    }
}

#[cfg(test)]
#[allow(clippy::indexing_slicing, clippy::unwrap_used)]
mod tests {
    use super::*;
    use alloy_primitives::address;
    use klay_keys::{AccountKey, SignatureData};

    fn sig(v: u64, r: u64, s: u64) -> SignatureData {
        SignatureData::new(v, U256::from(r), U256::from(s))
    }

    fn transfer() -> FeeDelegatedValueTransferWithRatio {
        KlaytnTx::new(
            address!("90b3e9a3770481345a7f17f22f16d020bccfd33e"),
            0x3b9a_c9ff,
            ValueTransferFields {
                to: address!("75c3098be5e4b63fbac05838daaee378dd48098d"),
                value: U256::from(0x98_9680u64),
            },
            FeeDelegatedWithRatio::new(FeeRatio::new(20).unwrap()),
        )
        .with_nonce(3)
        .with_gas_price(0x19)
        .with_chain_id(1)
    }

    #[test]
    fn test_type_tags_follow_fee_mode() {
        assert_eq!(transfer().tx_type(), TxType::FeeDelegatedValueTransferWithRatio);
        let cancel = Cancel::new(Address::ZERO, 21_000, CancelFields, SenderPaid);
        assert_eq!(cancel.tx_type(), TxType::Cancel);
        assert!(cancel.as_fee_delegated().is_none());
        let delegated =
            FeeDelegatedCancel::new(Address::ZERO, 21_000, CancelFields, FeeDelegated::new());
        assert!(delegated.as_fee_delegated().is_some());
    }

    #[test]
    fn test_field_counts() {
        assert_eq!(ValueTransfer::wire_field_count(), 7);
        assert_eq!(FeeDelegatedValueTransfer::wire_field_count(), 9);
        assert_eq!(FeeDelegatedValueTransferWithRatio::wire_field_count(), 10);
        assert_eq!(FeeDelegatedSmartContractDeployWithRatio::wire_field_count(), 13);
        assert_eq!(Cancel::wire_field_count(), 5);
    }

    #[test]
    fn test_sender_preimage_layout() {
        let preimage = transfer().rlp_encoding_for_signature().unwrap();
        let mut reader = FieldReader::new(&preimage).unwrap();
        assert_eq!(reader.len(), 4);
        let common = reader.next_bytes("common").unwrap();
        // The common part is itself a list led by the type tag.
        let mut inner = FieldReader::new(common).unwrap();
        assert_eq!(inner.next::<u8>("type").unwrap(), 0x0a);
        assert_eq!(inner.len(), 8);
        assert_eq!(reader.next::<u64>("chainId").unwrap(), 1);
    }

    #[test]
    fn test_fee_payer_preimage_binds_payer() {
        let mut tx = transfer();
        assert!(matches!(
            tx.rlp_encoding_for_fee_payer_signature(),
            Err(TxError::MissingRequiredField("feePayer"))
        ));
        tx.set_fee_payer(Some(Address::repeat_byte(0x33)));
        let preimage = tx.rlp_encoding_for_fee_payer_signature().unwrap();
        let mut reader = FieldReader::new(&preimage).unwrap();
        assert_eq!(reader.len(), 5);
        reader.next_raw("common").unwrap();
        assert_eq!(
            reader.next::<Address>("feePayer").unwrap(),
            Address::repeat_byte(0x33)
        );
    }

    #[test]
    fn test_missing_fields_are_reported() {
        let mut tx = transfer();
        tx.nonce = None;
        assert!(matches!(
            tx.rlp_encoding(),
            Err(TxError::MissingRequiredField("nonce"))
        ));
        let mut tx = transfer();
        tx.chain_id = None;
        assert!(tx.rlp_encoding().is_ok());
        assert!(matches!(
            tx.rlp_encoding_for_signature(),
            Err(TxError::MissingRequiredField("chainId"))
        ));
    }

    #[test]
    fn test_decode_restores_chain_id_and_fields() {
        let mut tx = transfer();
        tx.signatures.push(sig(2037, 11, 12));
        tx.set_fee_payer(Some(Address::repeat_byte(0x33)));
        tx.fee_payer_signatures_mut().push(sig(2038, 13, 14));
        let raw = tx.rlp_encoding().unwrap();
        assert_eq!(raw[0], 0x0a);

        let decoded = FeeDelegatedValueTransferWithRatio::decode_fields(&raw[1..]).unwrap();
        assert_eq!(decoded.chain_id, Some(1001));
        assert_eq!(decoded.from, tx.from);
        assert_eq!(decoded.fee, tx.fee);
        assert_eq!(decoded.signatures, tx.signatures);
    }

    #[test]
    fn test_unsigned_sender_only_decode() {
        let tx = transfer();
        let raw = tx.rlp_encoding().unwrap();
        let decoded = FeeDelegatedValueTransferWithRatio::decode_fields(&raw[1..]).unwrap();
        assert_eq!(decoded.fee_payer(), None);
        assert!(decoded.fee_payer_signatures().is_empty());
        assert_eq!(
            decoded.fee_payer_signatures().wire_entries(),
            vec![SignatureData::PLACEHOLDER]
        );
        assert_eq!(decoded.chain_id, None);
    }

    #[test]
    fn test_sender_tx_hash_ignores_fee_payer() {
        let mut tx = transfer();
        tx.signatures.push(sig(37, 1, 2));
        let before = tx.sender_tx_hash().unwrap();
        let tx_hash_before = tx.transaction_hash().unwrap();
        tx.set_fee_payer(Some(Address::repeat_byte(0x33)));
        tx.fee_payer_signatures_mut().push(sig(38, 3, 4));
        assert_eq!(tx.sender_tx_hash().unwrap(), before);
        assert_ne!(tx.transaction_hash().unwrap(), tx_hash_before);

        let plain = ValueTransfer::new(
            tx.from,
            tx.gas,
            tx.payload.clone(),
            SenderPaid,
        )
        .with_nonce(3)
        .with_gas_price(0x19);
        assert_eq!(plain.sender_tx_hash().unwrap(), plain.transaction_hash().unwrap());
    }

    #[test]
    fn test_wrong_field_count_is_rejected() {
        let raw = transfer().rlp_encoding().unwrap();
        assert!(matches!(
            FeeDelegatedValueTransfer::decode_fields(&raw[1..]),
            Err(DecodeError::FieldCount {
                expected: 9,
                actual: 10,
                ..
            })
        ));
    }

    #[test]
    fn test_account_update_carries_key_bytes() {
        let tx = AccountUpdate::new(
            Address::repeat_byte(7),
            90_000,
            AccountUpdateFields {
                account_key: AccountKey::Fail,
            },
            SenderPaid,
        )
        .with_nonce(0)
        .with_gas_price(25);
        let raw = tx.rlp_encoding().unwrap();
        let decoded = AccountUpdate::decode_fields(&raw[1..]).unwrap();
        assert_eq!(decoded.payload.account_key, AccountKey::Fail);
        assert_eq!(decoded.signing_role(), Role::AccountUpdate);
    }
}
