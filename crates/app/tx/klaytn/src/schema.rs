//! Construction from a JSON field map.
//!
//! Keys are camelCase. Every key must be meaningful for the requested type:
//! unknown keys, keys the type forbids and missing required keys are all
//! reported as [`TxError::SchemaViolation`].

use std::collections::BTreeSet;
use std::str::FromStr;

use alloy_primitives::{Address, Bytes, U256};
use klay_keys::{AccountKey, SignatureData, SignatureSet};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::envelope::Transaction;
use crate::error::{TxError, TxResult};
use crate::ethereum::{AccessListTransaction, DynamicFeeTransaction, LegacyTransaction};
use crate::fields::{AccessList, CodeFormat, FeeRatio};
use crate::klaytn::{
    AccountUpdateFields, CancelFields, ChainDataAnchoringFields, FeeDelegated,
    FeeDelegatedWithRatio, FeeMode, FeePayer, KlaytnTx, Payload, SenderPaid,
    SmartContractDeployFields, SmartContractExecutionFields, ValueTransferFields,
    ValueTransferMemoFields,
};
use crate::tx_type::TxType;

/// Keys of one field map, tracking which ones the type has consumed.
struct FieldMap<'a> {
    tx_type: TxType,
    fields: &'a Map<String, Value>,
    consumed: BTreeSet<&'a str>,
}

impl<'a> FieldMap<'a> {
    fn new(tx_type: TxType, fields: &'a Map<String, Value>) -> Self {
        let mut consumed = BTreeSet::new();
        consumed.insert("type");
        Self {
            tx_type,
            fields,
            consumed,
        }
    }

    /// The value under `key`; JSON `null` counts as absent.
    fn take(&mut self, key: &str) -> Option<&'a Value> {
        let (name, value) = self.fields.get_key_value(key)?;
        self.consumed.insert(name.as_str());
        (!value.is_null()).then_some(value)
    }

    fn optional<T>(
        &mut self,
        key: &str,
        parse: impl FnOnce(&str, &'a Value) -> TxResult<T>,
    ) -> TxResult<Option<T>> {
        self.take(key).map(|value| parse(key, value)).transpose()
    }

    fn required<T>(
        &mut self,
        key: &str,
        parse: impl FnOnce(&str, &'a Value) -> TxResult<T>,
    ) -> TxResult<T> {
        let tx_type = self.tx_type;
        self.optional(key, parse)?
            .ok_or_else(|| TxError::schema(key, format!("required for {tx_type}")))
    }

    /// `input`, or its alias `data`.
    fn input(&mut self) -> TxResult<Option<Bytes>> {
        let input = self.optional("input", bytes)?;
        let data = self.optional("data", bytes)?;
        match (input, data) {
            (Some(_), Some(_)) => Err(TxError::schema("data", "conflicts with `input`")),
            (input, data) => Ok(input.or(data)),
        }
    }

    fn required_input(&mut self) -> TxResult<Bytes> {
        let tx_type = self.tx_type;
        self.input()?
            .ok_or_else(|| TxError::schema("input", format!("required for {tx_type}")))
    }

    fn signatures(&mut self) -> TxResult<SignatureSet> {
        Ok(SignatureSet::from_wire(
            self.optional("signatures", signature_list)?
                .unwrap_or_default(),
        ))
    }

    /// Reject whatever the type did not ask for.
    fn finish(self) -> TxResult<()> {
        let leftover = self
            .fields
            .iter()
            .find(|(key, value)| !value.is_null() && !self.consumed.contains(key.as_str()));
        match leftover {
            Some((key, _)) => Err(TxError::schema(
                key.as_str(),
                format!("not allowed for {}", self.tx_type),
            )),
            None => Ok(()),
        }
    }
}

/// Parts of a type read from the field map.
trait FromFields: Sized {
    fn from_fields(fields: &mut FieldMap<'_>) -> TxResult<Self>;
}

impl FromFields for ValueTransferFields {
    fn from_fields(fields: &mut FieldMap<'_>) -> TxResult<Self> {
        Ok(Self {
            to: fields.required("to", address)?,
            value: fields.required("value", quantity)?,
        })
    }
}

impl FromFields for ValueTransferMemoFields {
    fn from_fields(fields: &mut FieldMap<'_>) -> TxResult<Self> {
        Ok(Self {
            to: fields.required("to", address)?,
            value: fields.required("value", quantity)?,
            input: fields.required_input()?,
        })
    }
}

impl FromFields for AccountUpdateFields {
    fn from_fields(fields: &mut FieldMap<'_>) -> TxResult<Self> {
        Ok(Self {
            account_key: fields.required("account", account_key)?,
        })
    }
}

impl FromFields for SmartContractDeployFields {
    fn from_fields(fields: &mut FieldMap<'_>) -> TxResult<Self> {
        if let Some(to) = fields.take("to") {
            let empty = matches!(to.as_str(), Some("" | "0x"));
            if !empty {
                return Err(TxError::schema("to", "must be empty for contract deployment"));
            }
        }
        let human_readable = fields.optional("humanReadable", boolean)?.unwrap_or(false);
        if human_readable {
            return Err(TxError::schema("humanReadable", "must be false"));
        }
        Ok(Self {
            value: fields.optional("value", quantity)?.unwrap_or_default(),
            input: fields.required_input()?,
            human_readable,
            code_format: fields
                .optional("codeFormat", code_format)?
                .unwrap_or_default(),
        })
    }
}

impl FromFields for SmartContractExecutionFields {
    fn from_fields(fields: &mut FieldMap<'_>) -> TxResult<Self> {
        Ok(Self {
            to: fields.required("to", address)?,
            value: fields.optional("value", quantity)?.unwrap_or_default(),
            input: fields.required_input()?,
        })
    }
}

impl FromFields for CancelFields {
    fn from_fields(_fields: &mut FieldMap<'_>) -> TxResult<Self> {
        Ok(CancelFields)
    }
}

impl FromFields for ChainDataAnchoringFields {
    fn from_fields(fields: &mut FieldMap<'_>) -> TxResult<Self> {
        Ok(Self {
            anchored_data: fields.required_input()?,
        })
    }
}

impl FromFields for SenderPaid {
    fn from_fields(_fields: &mut FieldMap<'_>) -> TxResult<Self> {
        Ok(SenderPaid)
    }
}

fn fee_payer(fields: &mut FieldMap<'_>) -> TxResult<FeePayer> {
    Ok(FeePayer {
        address: fields.optional("feePayer", address)?,
        signatures: SignatureSet::from_wire(
            fields
                .optional("feePayerSignatures", signature_list)?
                .unwrap_or_default(),
        ),
    })
}

impl FromFields for FeeDelegated {
    fn from_fields(fields: &mut FieldMap<'_>) -> TxResult<Self> {
        Ok(Self {
            payer: fee_payer(fields)?,
        })
    }
}

impl FromFields for FeeDelegatedWithRatio {
    fn from_fields(fields: &mut FieldMap<'_>) -> TxResult<Self> {
        Ok(Self {
            payer: fee_payer(fields)?,
            ratio: fields.required("feeRatio", fee_ratio)?,
        })
    }
}

fn native<P, F>(fields: &mut FieldMap<'_>) -> TxResult<Transaction>
where
    P: Payload + FromFields,
    F: FeeMode + FromFields,
    KlaytnTx<P, F>: Into<Transaction>,
{
    let tx = KlaytnTx {
        from: fields.required("from", address)?,
        nonce: fields.optional("nonce", narrow)?,
        gas_price: fields.optional("gasPrice", narrow)?,
        gas: fields.required("gas", narrow)?,
        chain_id: fields.optional("chainId", narrow)?,
        payload: P::from_fields(fields)?,
        fee: F::from_fields(fields)?,
        signatures: fields.signatures()?,
    };
    Ok(tx.into())
}

fn single(fields: &mut FieldMap<'_>) -> TxResult<SignatureSet> {
    let signatures = fields.signatures()?;
    if signatures.len() > 1 {
        return Err(TxError::schema(
            "signatures",
            format!(
                "{} accepts one signature, got {}",
                fields.tx_type,
                signatures.len()
            ),
        ));
    }
    Ok(signatures)
}

fn legacy(fields: &mut FieldMap<'_>) -> TxResult<Transaction> {
    Ok(LegacyTransaction {
        from: fields.optional("from", address)?,
        nonce: fields.optional("nonce", narrow)?,
        gas_price: fields.optional("gasPrice", narrow)?,
        gas: fields.required("gas", narrow)?,
        to: fields.optional("to", address)?,
        value: fields.optional("value", quantity)?.unwrap_or_default(),
        input: fields.input()?.unwrap_or_default(),
        chain_id: fields.optional("chainId", narrow)?,
        signatures: single(fields)?,
    }
    .into())
}

fn ethereum_access_list(fields: &mut FieldMap<'_>) -> TxResult<Transaction> {
    Ok(AccessListTransaction {
        from: fields.optional("from", address)?,
        chain_id: fields.optional("chainId", narrow)?,
        nonce: fields.optional("nonce", narrow)?,
        gas_price: fields.optional("gasPrice", narrow)?,
        gas: fields.required("gas", narrow)?,
        to: fields.optional("to", address)?,
        value: fields.optional("value", quantity)?.unwrap_or_default(),
        input: fields.input()?.unwrap_or_default(),
        access_list: fields
            .optional("accessList", access_list)?
            .unwrap_or_default(),
        signatures: single(fields)?,
    }
    .into())
}

fn ethereum_dynamic_fee(fields: &mut FieldMap<'_>) -> TxResult<Transaction> {
    Ok(DynamicFeeTransaction {
        from: fields.optional("from", address)?,
        chain_id: fields.optional("chainId", narrow)?,
        nonce: fields.optional("nonce", narrow)?,
        max_priority_fee_per_gas: fields.optional("maxPriorityFeePerGas", narrow)?,
        max_fee_per_gas: fields.optional("maxFeePerGas", narrow)?,
        gas: fields.required("gas", narrow)?,
        to: fields.optional("to", address)?,
        value: fields.optional("value", quantity)?.unwrap_or_default(),
        input: fields.input()?.unwrap_or_default(),
        access_list: fields
            .optional("accessList", access_list)?
            .unwrap_or_default(),
        signatures: single(fields)?,
    }
    .into())
}

impl Transaction {
    /// Build a transaction from a JSON object of camelCase fields.
    pub fn from_fields(value: &Value) -> TxResult<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| TxError::schema("fields", "expected a JSON object"))?;
        let tx_type = object
            .get("type")
            .ok_or_else(|| TxError::schema("type", "required"))
            .and_then(|value| tx_type("type", value))?;

        let mut fields = FieldMap::new(tx_type, object);
        let tx = match tx_type {
            TxType::Legacy => legacy(&mut fields)?,
            TxType::ValueTransfer => native::<ValueTransferFields, SenderPaid>(&mut fields)?,
            TxType::FeeDelegatedValueTransfer => {
                native::<ValueTransferFields, FeeDelegated>(&mut fields)?
            }
            TxType::FeeDelegatedValueTransferWithRatio => {
                native::<ValueTransferFields, FeeDelegatedWithRatio>(&mut fields)?
            }
            TxType::ValueTransferMemo => {
                native::<ValueTransferMemoFields, SenderPaid>(&mut fields)?
            }
            TxType::FeeDelegatedValueTransferMemo => {
                native::<ValueTransferMemoFields, FeeDelegated>(&mut fields)?
            }
            TxType::FeeDelegatedValueTransferMemoWithRatio => {
                native::<ValueTransferMemoFields, FeeDelegatedWithRatio>(&mut fields)?
            }
            TxType::AccountUpdate => native::<AccountUpdateFields, SenderPaid>(&mut fields)?,
            TxType::FeeDelegatedAccountUpdate => {
                native::<AccountUpdateFields, FeeDelegated>(&mut fields)?
            }
            TxType::FeeDelegatedAccountUpdateWithRatio => {
                native::<AccountUpdateFields, FeeDelegatedWithRatio>(&mut fields)?
            }
            TxType::SmartContractDeploy => {
                native::<SmartContractDeployFields, SenderPaid>(&mut fields)?
            }
            TxType::FeeDelegatedSmartContractDeploy => {
                native::<SmartContractDeployFields, FeeDelegated>(&mut fields)?
            }
            TxType::FeeDelegatedSmartContractDeployWithRatio => {
                native::<SmartContractDeployFields, FeeDelegatedWithRatio>(&mut fields)?
            }
            TxType::SmartContractExecution => {
                native::<SmartContractExecutionFields, SenderPaid>(&mut fields)?
            }
            TxType::FeeDelegatedSmartContractExecution => {
                native::<SmartContractExecutionFields, FeeDelegated>(&mut fields)?
            }
            TxType::FeeDelegatedSmartContractExecutionWithRatio => {
                native::<SmartContractExecutionFields, FeeDelegatedWithRatio>(&mut fields)?
            }
            TxType::Cancel => native::<CancelFields, SenderPaid>(&mut fields)?,
            TxType::FeeDelegatedCancel => native::<CancelFields, FeeDelegated>(&mut fields)?,
            TxType::FeeDelegatedCancelWithRatio => {
                native::<CancelFields, FeeDelegatedWithRatio>(&mut fields)?
            }
            TxType::ChainDataAnchoring => {
                native::<ChainDataAnchoringFields, SenderPaid>(&mut fields)?
            }
            TxType::FeeDelegatedChainDataAnchoring => {
                native::<ChainDataAnchoringFields, FeeDelegated>(&mut fields)?
            }
            TxType::FeeDelegatedChainDataAnchoringWithRatio => {
                native::<ChainDataAnchoringFields, FeeDelegatedWithRatio>(&mut fields)?
            }
            TxType::EthereumAccessList => ethereum_access_list(&mut fields)?,
            TxType::EthereumDynamicFee => ethereum_dynamic_fee(&mut fields)?,
        };
        fields.finish()?;
        Ok(tx)
    }

    /// [`Transaction::from_fields`] over a JSON document.
    pub fn from_json(json: &str) -> TxResult<Self> {
        let value: Value =
            serde_json::from_str(json).map_err(|err| TxError::schema("fields", err.to_string()))?;
        Self::from_fields(&value)
    }
}

fn tx_type(field: &str, value: &Value) -> TxResult<TxType> {
    let parsed = match value {
        Value::String(name) => TxType::parse(name),
        Value::Number(tag) => tag
            .as_u64()
            .and_then(|tag| u16::try_from(tag).ok())
            .and_then(TxType::from_tag),
        _ => None,
    };
    parsed.ok_or_else(|| TxError::schema(field, format!("unknown transaction type {value}")))
}

/// A JSON integer, a decimal string or a `0x` hex string.
fn quantity(field: &str, value: &Value) -> TxResult<U256> {
    match value {
        Value::Number(number) => number
            .as_u64()
            .map(U256::from)
            .ok_or_else(|| TxError::schema(field, format!("{number} is not a non-negative integer"))),
        Value::String(text) => {
            let parsed = match text.strip_prefix("0x") {
                Some(digits) => U256::from_str_radix(digits, 16),
                None => U256::from_str_radix(text, 10),
            };
            parsed.map_err(|err| TxError::schema(field, format!("{text:?}: {err}")))
        }
        other => Err(TxError::schema(
            field,
            format!("expected a number or numeric string, got {other}"),
        )),
    }
}

fn narrow<T: TryFrom<U256>>(field: &str, value: &Value) -> TxResult<T> {
    let wide = quantity(field, value)?;
    T::try_from(wide).map_err(|_| TxError::schema(field, format!("{wide} is out of range")))
}

fn text<'v>(field: &str, value: &'v Value) -> TxResult<&'v str> {
    value
        .as_str()
        .ok_or_else(|| TxError::schema(field, format!("expected a string, got {value}")))
}

fn address(field: &str, value: &Value) -> TxResult<Address> {
    let text = text(field, value)?;
    Address::from_str(text).map_err(|err| TxError::schema(field, format!("{text:?}: {err}")))
}

fn bytes(field: &str, value: &Value) -> TxResult<Bytes> {
    let text = text(field, value)?;
    let digits = text.strip_prefix("0x").unwrap_or(text);
    hex::decode(digits)
        .map(Bytes::from)
        .map_err(|err| TxError::schema(field, err.to_string()))
}

fn boolean(field: &str, value: &Value) -> TxResult<bool> {
    value
        .as_bool()
        .ok_or_else(|| TxError::schema(field, format!("expected a boolean, got {value}")))
}

fn fee_ratio(field: &str, value: &Value) -> TxResult<FeeRatio> {
    FeeRatio::try_from(narrow::<u64>(field, value)?)
}

fn code_format(field: &str, value: &Value) -> TxResult<CodeFormat> {
    if value.as_str() == Some("EVM") {
        return Ok(CodeFormat::Evm);
    }
    let code: u64 = narrow(field, value)?;
    CodeFormat::from_code(code)
        .ok_or_else(|| TxError::schema(field, format!("unsupported code format {code}")))
}

fn account_key(field: &str, value: &Value) -> TxResult<AccountKey> {
    AccountKey::from_hex(text(field, value)?)
        .map_err(|err| TxError::schema(field, err.to_string()))
}

fn access_list(field: &str, value: &Value) -> TxResult<AccessList> {
    AccessList::deserialize(value).map_err(|err| TxError::schema(field, err.to_string()))
}

/// A list of `[v, r, s]` triples or `{v, r, s}` objects. A bare triple is
/// read as a one-element list.
fn signature_list(field: &str, value: &Value) -> TxResult<Vec<SignatureData>> {
    let entries = value
        .as_array()
        .ok_or_else(|| TxError::schema(field, "expected a list of signatures"))?;
    let bare_triple = entries.len() == 3
        && entries
            .iter()
            .all(|entry| !entry.is_array() && !entry.is_object());
    if bare_triple {
        return Ok(vec![signature(field, value)?]);
    }
    entries.iter().map(|entry| signature(field, entry)).collect()
}

fn signature(field: &str, value: &Value) -> TxResult<SignatureData> {
    let malformed =
        || TxError::schema(field, format!("expected [v, r, s] or {{v, r, s}}, got {value}"));
    let (v, r, s) = match value {
        Value::Array(items) => match items.as_slice() {
            [v, r, s] => (v, r, s),
            _ => return Err(malformed()),
        },
        Value::Object(map) => match (map.get("v"), map.get("r"), map.get("s")) {
            (Some(v), Some(r), Some(s)) if map.len() == 3 => (v, r, s),
            _ => return Err(malformed()),
        },
        _ => return Err(malformed()),
    };
    let part = |component: &Value| match component {
        Value::String(text) => Ok(text.clone()),
        Value::Number(number) => number
            .as_u64()
            .map(|n| format!("{n:#x}"))
            .ok_or_else(malformed),
        _ => Err(malformed()),
    };
    SignatureData::from_hex(&part(v)?, &part(r)?, &part(s)?)
        .map_err(|err| TxError::schema(field, err.to_string()))
}
