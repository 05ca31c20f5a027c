//! EIP-2930 access-list transaction, wrapped for the chain.

use alloy_primitives::{keccak256, Address, Bytes, B256, U256};
use klay_keys::encoding::{FieldReader, RlpList};
use klay_keys::{RecoveryEncoding, SignatureSet};

use crate::error::{DecodeError, DecodeResult, TxError, TxResult};
use crate::ethereum::{
    check_y_parity, prefixed, push_signature, read_signature, recover_sender,
};
use crate::fields::AccessList;
use crate::traits::TypedTransaction;
use crate::tx_type::{TxType, ETHEREUM_TX_TYPE_PREFIX};

/// EIP-2718 type byte of the inner Ethereum envelope.
const ENVELOPE_TYPE: u8 = 0x01;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AccessListTransaction {
    pub from: Option<Address>,
    pub chain_id: Option<u64>,
    pub nonce: Option<u64>,
    pub gas_price: Option<u128>,
    pub gas: u64,
    pub to: Option<Address>,
    pub value: U256,
    pub input: Bytes,
    pub access_list: AccessList,
    pub signatures: SignatureSet,
}

impl AccessListTransaction {
    const FIELD_COUNT: usize = 11;

    /// `chainId, nonce, gasPrice, gas, to, value, data, accessList`.
    fn fields(&self) -> TxResult<RlpList> {
        let chain_id = self
            .chain_id
            .ok_or(TxError::MissingRequiredField("chainId"))?;
        let nonce = self.nonce.ok_or(TxError::MissingRequiredField("nonce"))?;
        let gas_price = self
            .gas_price
            .ok_or(TxError::MissingRequiredField("gasPrice"))?;
        let mut list = RlpList::new();
        list.push(&chain_id)
            .push(&nonce)
            .push(&gas_price)
            .push(&self.gas)
            .push_optional_address(self.to.as_ref())
            .push(&self.value)
            .push_bytes(&self.input)
            .push(&self.access_list);
        Ok(list)
    }

    /// The signed Ethereum envelope (`0x01 || rlp(...)`), as hashed by the chain.
    pub fn ethereum_envelope(&self) -> TxResult<Vec<u8>> {
        let mut list = self.fields()?;
        push_signature(&mut list, &self.signatures);
        Ok(prefixed(&[ENVELOPE_TYPE], list.finish()))
    }

    /// Decode the RLP list that follows `0x78 0x01`.
    pub fn decode_fields(input: &[u8]) -> DecodeResult<Self> {
        let mut reader = FieldReader::new(input).map_err(crate::envelope::list_error)?;
        if reader.len() != Self::FIELD_COUNT {
            return Err(DecodeError::FieldCount {
                tx_type: TxType::EthereumAccessList.name(),
                expected: Self::FIELD_COUNT,
                actual: reader.len(),
            });
        }

        let mut tx = Self {
            chain_id: Some(reader.next("chainId")?),
            nonce: Some(reader.next("nonce")?),
            gas_price: Some(reader.next("gasPrice")?),
            gas: reader.next("gas")?,
            to: reader.next_optional_address("to")?,
            value: reader.next("value")?,
            input: Bytes::copy_from_slice(reader.next_bytes("data")?),
            access_list: reader.next("accessList")?,
            ..Self::default()
        };
        tx.signatures = read_signature(&mut reader)?;
        reader.finish()?;
        check_y_parity(&tx.signatures)?;
        tx.from = recover_sender(&tx)?;
        Ok(tx)
    }
}

impl TypedTransaction for AccessListTransaction {
    fn tx_type(&self) -> TxType {
        TxType::EthereumAccessList
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

    fn recovery_encoding(&self) -> TxResult<RecoveryEncoding> {
        Ok(RecoveryEncoding::YParity)
    }

    fn signatures(&self) -> &SignatureSet {
        &self.signatures
    }

    fn signatures_mut(&mut self) -> &mut SignatureSet {
        &mut self.signatures
    }

    fn rlp_encoding_for_signature(&self) -> TxResult<Vec<u8>> {
        Ok(prefixed(&[ENVELOPE_TYPE], self.fields()?.finish()))
    }

    fn rlp_encoding(&self) -> TxResult<Vec<u8>> {
        Ok(prefixed(&[ETHEREUM_TX_TYPE_PREFIX], self.ethereum_envelope()?))
    }

    fn transaction_hash(&self) -> TxResult<B256> {
        Ok(keccak256(self.ethereum_envelope()?))
    }
}

#[cfg(test)]
#[allow(clippy::indexing_slicing, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::fields::AccessListItem;

    fn sample() -> AccessListTransaction {
        AccessListTransaction {
            chain_id: Some(8217),
            nonce: Some(4),
            gas_price: Some(25_000_000_000),
            gas: 90_000,
            to: Some(Address::repeat_byte(0x55)),
            value: U256::from(10u64),
            access_list: vec![AccessListItem {
                address: Address::repeat_byte(0x66),
                storage_keys: vec![B256::repeat_byte(0x01)],
            }],
            ..AccessListTransaction::default()
        }
    }

    #[test]
    fn test_wire_prefix_and_hash_domain() {
        let tx = sample();
        let raw = tx.rlp_encoding().unwrap();
        assert_eq!(&raw[..2], &[0x78, 0x01]);
        // The hash covers the inner Ethereum envelope only.
        assert_eq!(tx.transaction_hash().unwrap(), keccak256(&raw[1..]));
        assert_eq!(tx.sender_tx_hash().unwrap(), tx.transaction_hash().unwrap());
        assert_eq!(tx.rlp_encoding_for_signature().unwrap()[0], 0x01);
    }

    #[test]
    fn test_decode_roundtrip_unsigned() {
        let tx = sample();
        let raw = tx.rlp_encoding().unwrap();
        let decoded = AccessListTransaction::decode_fields(&raw[2..]).unwrap();
        assert_eq!(decoded, tx);
    }

    #[test]
    fn test_chain_id_required() {
        let tx = AccessListTransaction {
            chain_id: None,
            ..sample()
        };
        assert!(matches!(
            tx.rlp_encoding_for_signature(),
            Err(TxError::MissingRequiredField("chainId"))
        ));
    }
}
