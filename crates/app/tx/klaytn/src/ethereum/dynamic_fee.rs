//! EIP-1559 dynamic-fee transaction, wrapped for the chain.

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

const ENVELOPE_TYPE: u8 = 0x02;

/// Dynamic-fee transaction. It has no single gas price: the sender bids
/// `max_fee_per_gas` and tips `max_priority_fee_per_gas`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DynamicFeeTransaction {
    pub from: Option<Address>,
    pub chain_id: Option<u64>,
    pub nonce: Option<u64>,
    pub max_priority_fee_per_gas: Option<u128>,
    pub max_fee_per_gas: Option<u128>,
    pub gas: u64,
    pub to: Option<Address>,
    pub value: U256,
    pub input: Bytes,
    pub access_list: AccessList,
    pub signatures: SignatureSet,
}

impl DynamicFeeTransaction {
    const FIELD_COUNT: usize = 12;

    /// `chainId, nonce, maxPriorityFeePerGas, maxFeePerGas, gas, to, value, data, accessList`.
    fn fields(&self) -> TxResult<RlpList> {
        let chain_id = self
            .chain_id
            .ok_or(TxError::MissingRequiredField("chainId"))?;
        let nonce = self.nonce.ok_or(TxError::MissingRequiredField("nonce"))?;
        let priority = self
            .max_priority_fee_per_gas
            .ok_or(TxError::MissingRequiredField("maxPriorityFeePerGas"))?;
        let max_fee = self
            .max_fee_per_gas
            .ok_or(TxError::MissingRequiredField("maxFeePerGas"))?;
        let mut list = RlpList::new();
        list.push(&chain_id)
            .push(&nonce)
            .push(&priority)
            .push(&max_fee)
            .push(&self.gas)
            .push_optional_address(self.to.as_ref())
            .push(&self.value)
            .push_bytes(&self.input)
            .push(&self.access_list);
        Ok(list)
    }

    /// The signed Ethereum envelope (`0x02 || rlp(...)`), as hashed by the chain.
    pub fn ethereum_envelope(&self) -> TxResult<Vec<u8>> {
        let mut list = self.fields()?;
        push_signature(&mut list, &self.signatures);
        Ok(prefixed(&[ENVELOPE_TYPE], list.finish()))
    }

    /// Decode the RLP list that follows `0x78 0x02`.
    pub fn decode_fields(input: &[u8]) -> DecodeResult<Self> {
        let mut reader = FieldReader::new(input).map_err(crate::envelope::list_error)?;
        if reader.len() != Self::FIELD_COUNT {
            return Err(DecodeError::FieldCount {
                tx_type: TxType::EthereumDynamicFee.name(),
                expected: Self::FIELD_COUNT,
                actual: reader.len(),
            });
        }

        let mut tx = Self {
            chain_id: Some(reader.next("chainId")?),
            nonce: Some(reader.next("nonce")?),
            max_priority_fee_per_gas: Some(reader.next("maxPriorityFeePerGas")?),
            max_fee_per_gas: Some(reader.next("maxFeePerGas")?),
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

impl TypedTransaction for DynamicFeeTransaction {
    fn tx_type(&self) -> TxType {
        TxType::EthereumDynamicFee
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
        None
    }

    fn set_gas_price(&mut self, _gas_price: u128) {}

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
    use klay_keys::{PrivateKey, SignatureData};

    fn sample() -> DynamicFeeTransaction {
        DynamicFeeTransaction {
            chain_id: Some(1001),
            nonce: Some(0),
            max_priority_fee_per_gas: Some(25_000_000_000),
            max_fee_per_gas: Some(75_000_000_000),
            gas: 21_000,
            to: Some(Address::repeat_byte(0x21)),
            value: U256::from(1u64),
            ..DynamicFeeTransaction::default()
        }
    }

    #[test]
    fn test_signed_roundtrip_recovers_sender() {
        let key = PrivateKey::from_bytes(&[0x17; 32]).unwrap();
        let mut tx = sample();
        let hash = keccak256(tx.rlp_encoding_for_signature().unwrap());
        let signature = key.sign(hash, RecoveryEncoding::YParity).unwrap();
        assert!(signature.v <= 1);
        tx.append_signatures(&[signature]).unwrap();

        let raw = tx.rlp_encoding().unwrap();
        assert_eq!(&raw[..2], &[0x78, 0x02]);
        let decoded = DynamicFeeTransaction::decode_fields(&raw[2..]).unwrap();
        assert_eq!(decoded.from, Some(key.address()));
        assert_eq!(decoded.signatures, tx.signatures);
    }

    #[test]
    fn test_eip155_v_is_rejected() {
        let mut tx = sample();
        tx.signatures
            .push(SignatureData::new(2037, U256::from(1), U256::from(1)));
        let raw = tx.rlp_encoding().unwrap();
        assert!(matches!(
            DynamicFeeTransaction::decode_fields(&raw[2..]),
            Err(DecodeError::InvalidField { field: "v", .. })
        ));
    }

    #[test]
    fn test_gas_price_is_ignored() {
        let mut tx = sample();
        tx.set_gas_price(1);
        assert_eq!(tx.gas_price(), None);
        assert!(matches!(
            DynamicFeeTransaction {
                max_fee_per_gas: None,
                ..sample()
            }
            .rlp_encoding(),
            Err(TxError::MissingRequiredField("maxFeePerGas"))
        ));
    }
}
