//! Type-specific bodies of chain-native transactions.
//!
//! Each body knows its own RLP field order, including where the fee ratio
//! sits for the `WithRatio` variants.

use std::fmt;

use alloy_primitives::{Address, Bytes, U256};
use klay_keys::encoding::{FieldReader, RlpList};
use klay_keys::{AccountKey, Role};

use crate::error::{DecodeError, DecodeResult};
use crate::fields::{CodeFormat, FeeRatio};
use crate::tx_type::TxType;

/// The three type tags a body appears under.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TypeFamily {
    pub basic: TxType,
    pub fee_delegated: TxType,
    pub with_ratio: TxType,
}

/// Body of a chain-native transaction.
pub trait Payload: Clone + fmt::Debug + PartialEq + Eq + Send + Sync + 'static {
    const FAMILY: TypeFamily;

    /// Body items on the wire, excluding the fee ratio.
    const FIELD_COUNT: usize;

    /// Append the body items (with `from` and the optional ratio in place).
    fn encode_fields(&self, from: &Address, ratio: Option<FeeRatio>, out: &mut RlpList);

    /// Read the body items written by [`Payload::encode_fields`].
    fn decode_fields(
        reader: &mut FieldReader<'_>,
        with_ratio: bool,
    ) -> DecodeResult<(Address, Self, Option<FeeRatio>)>;

    fn signing_role(&self) -> Role {
        Role::Transaction
    }

    fn to(&self) -> Option<Address> {
        None
    }

    fn value(&self) -> U256 {
        U256::ZERO
    }

    fn input(&self) -> &[u8] {
        &[]
    }
}

fn push_ratio(out: &mut RlpList, ratio: Option<FeeRatio>) {
    if let Some(ratio) = ratio {
        out.push(&ratio.get());
    }
}

fn read_ratio(reader: &mut FieldReader<'_>, with_ratio: bool) -> DecodeResult<Option<FeeRatio>> {
    if !with_ratio {
        return Ok(None);
    }
    let raw: u8 = reader.next("feeRatio")?;
    FeeRatio::new(raw)
        .map(Some)
        .map_err(|err| DecodeError::InvalidField {
            field: "feeRatio",
            reason: err.to_string(),
        })
}

fn read_bytes(reader: &mut FieldReader<'_>, field: &'static str) -> DecodeResult<Bytes> {
    Ok(Bytes::copy_from_slice(reader.next_bytes(field)?))
}

/// Plain value transfer to an externally owned account.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ValueTransferFields {
    pub to: Address,
    pub value: U256,
}

impl Payload for ValueTransferFields {
    const FAMILY: TypeFamily = TypeFamily {
        basic: TxType::ValueTransfer,
        fee_delegated: TxType::FeeDelegatedValueTransfer,
        with_ratio: TxType::FeeDelegatedValueTransferWithRatio,
    };
    const FIELD_COUNT: usize = 3;

    fn encode_fields(&self, from: &Address, ratio: Option<FeeRatio>, out: &mut RlpList) {
        out.push(&self.to).push(&self.value).push(from);
        push_ratio(out, ratio);
    }

    fn decode_fields(
        reader: &mut FieldReader<'_>,
        with_ratio: bool,
    ) -> DecodeResult<(Address, Self, Option<FeeRatio>)> {
        let to = reader.next("to")?;
        let value = reader.next("value")?;
        let from = reader.next("from")?;
        let ratio = read_ratio(reader, with_ratio)?;
        Ok((from, Self { to, value }, ratio))
    }

    fn to(&self) -> Option<Address> {
        Some(self.to)
    }

    fn value(&self) -> U256 {
        self.value
    }
}

/// Value transfer carrying an opaque memo.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ValueTransferMemoFields {
    pub to: Address,
    pub value: U256,
    pub input: Bytes,
}

impl Payload for ValueTransferMemoFields {
    const FAMILY: TypeFamily = TypeFamily {
        basic: TxType::ValueTransferMemo,
        fee_delegated: TxType::FeeDelegatedValueTransferMemo,
        with_ratio: TxType::FeeDelegatedValueTransferMemoWithRatio,
    };
    const FIELD_COUNT: usize = 4;

    fn encode_fields(&self, from: &Address, ratio: Option<FeeRatio>, out: &mut RlpList) {
        out.push(&self.to)
            .push(&self.value)
            .push(from)
            .push_bytes(&self.input);
        push_ratio(out, ratio);
    }

    fn decode_fields(
        reader: &mut FieldReader<'_>,
        with_ratio: bool,
    ) -> DecodeResult<(Address, Self, Option<FeeRatio>)> {
        let to = reader.next("to")?;
        let value = reader.next("value")?;
        let from = reader.next("from")?;
        let input = read_bytes(reader, "input")?;
        let ratio = read_ratio(reader, with_ratio)?;
        Ok((from, Self { to, value, input }, ratio))
    }

    fn to(&self) -> Option<Address> {
        Some(self.to)
    }

    fn value(&self) -> U256 {
        self.value
    }

    fn input(&self) -> &[u8] {
        &self.input
    }
}

/// Replacement of the account key registered for `from`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AccountUpdateFields {
    pub account_key: AccountKey,
}

impl Payload for AccountUpdateFields {
    const FAMILY: TypeFamily = TypeFamily {
        basic: TxType::AccountUpdate,
        fee_delegated: TxType::FeeDelegatedAccountUpdate,
        with_ratio: TxType::FeeDelegatedAccountUpdateWithRatio,
    };
    const FIELD_COUNT: usize = 2;

    fn encode_fields(&self, from: &Address, ratio: Option<FeeRatio>, out: &mut RlpList) {
        out.push(from).push_bytes(&self.account_key.encode());
        push_ratio(out, ratio);
    }

    fn decode_fields(
        reader: &mut FieldReader<'_>,
        with_ratio: bool,
    ) -> DecodeResult<(Address, Self, Option<FeeRatio>)> {
        let from = reader.next("from")?;
        let encoded = reader.next_bytes("accountKey")?;
        let account_key =
            AccountKey::decode(encoded).map_err(|err| DecodeError::InvalidField {
                field: "accountKey",
                reason: err.to_string(),
            })?;
        let ratio = read_ratio(reader, with_ratio)?;
        Ok((from, Self { account_key }, ratio))
    }

    // The new key is authorised by the current update-role key.
    fn signing_role(&self) -> Role {
        Role::AccountUpdate
    }
}

/// Contract creation. The recipient is always empty on the wire.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SmartContractDeployFields {
    pub value: U256,
    pub input: Bytes,
    pub human_readable: bool,
    pub code_format: CodeFormat,
}

impl Payload for SmartContractDeployFields {
    const FAMILY: TypeFamily = TypeFamily {
        basic: TxType::SmartContractDeploy,
        fee_delegated: TxType::FeeDelegatedSmartContractDeploy,
        with_ratio: TxType::FeeDelegatedSmartContractDeployWithRatio,
    };
    const FIELD_COUNT: usize = 6;

    fn encode_fields(&self, from: &Address, ratio: Option<FeeRatio>, out: &mut RlpList) {
        out.push_empty()
            .push(&self.value)
            .push(from)
            .push_bytes(&self.input)
            .push(&self.human_readable);
        push_ratio(out, ratio);
        out.push(&self.code_format.code());
    }

    fn decode_fields(
        reader: &mut FieldReader<'_>,
        with_ratio: bool,
    ) -> DecodeResult<(Address, Self, Option<FeeRatio>)> {
        if reader.next_optional_address("to")?.is_some() {
            return Err(DecodeError::InvalidField {
                field: "to",
                reason: "must be empty for contract deployment".to_string(),
            });
        }
        let value = reader.next("value")?;
        let from = reader.next("from")?;
        let input = read_bytes(reader, "input")?;
        let human_readable = reader.next("humanReadable")?;
        let ratio = read_ratio(reader, with_ratio)?;
        let code: u64 = reader.next("codeFormat")?;
        let code_format = CodeFormat::from_code(code).ok_or_else(|| DecodeError::InvalidField {
            field: "codeFormat",
            reason: format!("unknown code format {code}"),
        })?;
        Ok((
            from,
            Self {
                value,
                input,
                human_readable,
                code_format,
            },
            ratio,
        ))
    }

    fn value(&self) -> U256 {
        self.value
    }

    fn input(&self) -> &[u8] {
        &self.input
    }
}

/// Call into a deployed contract.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SmartContractExecutionFields {
    pub to: Address,
    pub value: U256,
    pub input: Bytes,
}

impl Payload for SmartContractExecutionFields {
    const FAMILY: TypeFamily = TypeFamily {
        basic: TxType::SmartContractExecution,
        fee_delegated: TxType::FeeDelegatedSmartContractExecution,
        with_ratio: TxType::FeeDelegatedSmartContractExecutionWithRatio,
    };
    const FIELD_COUNT: usize = 4;

    fn encode_fields(&self, from: &Address, ratio: Option<FeeRatio>, out: &mut RlpList) {
        out.push(&self.to)
            .push(&self.value)
            .push(from)
            .push_bytes(&self.input);
        push_ratio(out, ratio);
    }

    fn decode_fields(
        reader: &mut FieldReader<'_>,
        with_ratio: bool,
    ) -> DecodeResult<(Address, Self, Option<FeeRatio>)> {
        let to = reader.next("to")?;
        let value = reader.next("value")?;
        let from = reader.next("from")?;
        let input = read_bytes(reader, "input")?;
        let ratio = read_ratio(reader, with_ratio)?;
        Ok((from, Self { to, value, input }, ratio))
    }

    fn to(&self) -> Option<Address> {
        Some(self.to)
    }

    fn value(&self) -> U256 {
        self.value
    }

    fn input(&self) -> &[u8] {
        &self.input
    }
}

/// Cancels a pending transaction with the same nonce.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CancelFields;

impl Payload for CancelFields {
    const FAMILY: TypeFamily = TypeFamily {
        basic: TxType::Cancel,
        fee_delegated: TxType::FeeDelegatedCancel,
        with_ratio: TxType::FeeDelegatedCancelWithRatio,
    };
    const FIELD_COUNT: usize = 1;

    fn encode_fields(&self, from: &Address, ratio: Option<FeeRatio>, out: &mut RlpList) {
        out.push(from);
        push_ratio(out, ratio);
    }

    fn decode_fields(
        reader: &mut FieldReader<'_>,
        with_ratio: bool,
    ) -> DecodeResult<(Address, Self, Option<FeeRatio>)> {
        let from = reader.next("from")?;
        let ratio = read_ratio(reader, with_ratio)?;
        Ok((from, Self, ratio))
    }
}

/// Anchors service-chain data on the parent chain.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChainDataAnchoringFields {
    pub anchored_data: Bytes,
}

impl Payload for ChainDataAnchoringFields {
    const FAMILY: TypeFamily = TypeFamily {
        basic: TxType::ChainDataAnchoring,
        fee_delegated: TxType::FeeDelegatedChainDataAnchoring,
        with_ratio: TxType::FeeDelegatedChainDataAnchoringWithRatio,
    };
    const FIELD_COUNT: usize = 2;

    fn encode_fields(&self, from: &Address, ratio: Option<FeeRatio>, out: &mut RlpList) {
        out.push(from).push_bytes(&self.anchored_data);
        push_ratio(out, ratio);
    }

    fn decode_fields(
        reader: &mut FieldReader<'_>,
        with_ratio: bool,
    ) -> DecodeResult<(Address, Self, Option<FeeRatio>)> {
        let from = reader.next("from")?;
        let anchored_data = read_bytes(reader, "anchoredData")?;
        let ratio = read_ratio(reader, with_ratio)?;
        Ok((from, Self { anchored_data }, ratio))
    }

    fn input(&self) -> &[u8] {
        &self.anchored_data
    }
}
