//! Legacy (pre-EIP-2718) transaction type.

use alloy_primitives::{Address, Bytes, U256};
use klay_keys::encoding::{FieldReader, RlpList};
use klay_keys::SignatureSet;

use crate::error::{DecodeError, DecodeResult, TxError, TxResult};
use crate::ethereum::{push_signature, read_signature, recover_sender};
use crate::traits::TypedTransaction;
use crate::tx_type::TxType;

/// A legacy transaction with EIP-155 replay protection.
///
/// Legacy transactions have no type prefix on the wire.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LegacyTransaction {
    /// Set when signed, or recovered from the signature on decode.
    pub from: Option<Address>,
    pub nonce: Option<u64>,
    pub gas_price: Option<u128>,
    pub gas: u64,
    /// `None` creates a contract.
    pub to: Option<Address>,
    pub value: U256,
    pub input: Bytes,
    pub chain_id: Option<u64>,
    pub signatures: SignatureSet,
}

impl LegacyTransaction {
    const FIELD_COUNT: usize = 9;

    fn fields(&self) -> TxResult<RlpList> {
        let nonce = self.nonce.ok_or(TxError::MissingRequiredField("nonce"))?;
        let gas_price = self
            .gas_price
            .ok_or(TxError::MissingRequiredField("gasPrice"))?;
        let mut list = RlpList::new();
        list.push(&nonce)
            .push(&gas_price)
            .push(&self.gas)
            .push_optional_address(self.to.as_ref())
            .push(&self.value)
            .push_bytes(&self.input);
        Ok(list)
    }

    /// Decode a legacy RLP list.
    pub fn decode_fields(input: &[u8]) -> DecodeResult<Self> {
        let mut reader = FieldReader::new(input).map_err(crate::envelope::list_error)?;
        if reader.len() != Self::FIELD_COUNT {
            return Err(DecodeError::FieldCount {
                tx_type: TxType::Legacy.name(),
                expected: Self::FIELD_COUNT,
                actual: reader.len(),
            });
        }

        let mut tx = Self {
            nonce: Some(reader.next("nonce")?),
            gas_price: Some(reader.next("gasPrice")?),
            gas: reader.next("gas")?,
            to: reader.next_optional_address("to")?,
            value: reader.next("value")?,
            input: Bytes::copy_from_slice(reader.next_bytes("input")?),
            ..Self::default()
        };
        tx.signatures = read_signature(&mut reader)?;
        reader.finish()?;

        tx.chain_id = tx.signatures.first().and_then(|sig| sig.eip155_chain_id());
        tx.from = recover_sender(&tx)?;
        Ok(tx)
    }
}

impl TypedTransaction for LegacyTransaction {
    fn tx_type(&self) -> TxType {
        TxType::Legacy
    }

    fn sender(&self) -> Option<Address> {
        self.from
    }

    fn set_sender(&mut self, sender: Address) {
        self.from = Some(sender);
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
        self.to
    }

    fn value(&self) -> U256 {
        self.value
    }

    fn input(&self) -> &[u8] {
        &self.input
    }

    fn single_signature(&self) -> bool {
        true
    }

    fn signatures(&self) -> &SignatureSet {
        &self.signatures
    }

    fn signatures_mut(&mut self) -> &mut SignatureSet {
        &mut self.signatures
    }

    fn rlp_encoding_for_signature(&self) -> TxResult<Vec<u8>> {
        let chain_id = self
            .chain_id
            .ok_or(TxError::MissingRequiredField("chainId"))?;
        let mut list = self.fields()?;
        list.push(&chain_id).push_empty().push_empty();
        Ok(list.finish())
    }

    fn rlp_encoding(&self) -> TxResult<Vec<u8>> {
        let mut list = self.fields()?;
        push_signature(&mut list, &self.signatures);
        Ok(list.finish())
    }
}
