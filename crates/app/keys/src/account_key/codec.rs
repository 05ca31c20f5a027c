//! Consensus encoding of account keys: a one-byte type tag followed by RLP.

use alloy_rlp::{Encodable, Header, EMPTY_LIST_CODE, EMPTY_STRING_CODE};

use crate::crypto::PublicKey;
use crate::encoding::{FieldError, FieldReader, RlpList};
use crate::error::{KeyError, KeyResult};

use super::{AccountKey, RoleBasedKey, RoleKey, WeightedMultiSigKey, WeightedPublicKey};

/// Account key type tags.
pub mod key_type {
    pub const LEGACY: u8 = 0x01;
    pub const PUBLIC: u8 = 0x02;
    pub const FAIL: u8 = 0x03;
    pub const WEIGHTED_MULTISIG: u8 = 0x04;
    pub const ROLE_BASED: u8 = 0x05;
}

impl AccountKey {
    pub fn encode(&self) -> Vec<u8> {
        match self {
            AccountKey::Legacy => vec![key_type::LEGACY, EMPTY_LIST_CODE],
            AccountKey::Public(key) => encode_public(key),
            AccountKey::Fail => vec![key_type::FAIL, EMPTY_LIST_CODE],
            AccountKey::WeightedMultiSig(key) => encode_weighted(key),
            AccountKey::RoleBased(key) => encode_role_based(key),
        }
    }

    pub fn decode(bytes: &[u8]) -> KeyResult<Self> {
        let (&tag, body) = bytes
            .split_first()
            .ok_or_else(|| KeyError::InvalidAccountKey("empty input".to_string()))?;
        match tag {
            key_type::ROLE_BASED => decode_role_based(body).map(AccountKey::RoleBased),
            _ => decode_role_key(bytes)?.into_account_key().ok_or_else(|| {
                KeyError::InvalidAccountKey("nil key is only valid inside a role-based key".to_string())
            }),
        }
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.encode()))
    }

    pub fn from_hex(value: &str) -> KeyResult<Self> {
        let bytes = hex::decode(value.strip_prefix("0x").unwrap_or(value))
            .map_err(|e| KeyError::InvalidAccountKey(e.to_string()))?;
        Self::decode(&bytes)
    }
}

impl RoleKey {
    pub fn encode(&self) -> Vec<u8> {
        match self {
            RoleKey::Nil => vec![EMPTY_STRING_CODE],
            RoleKey::Legacy => vec![key_type::LEGACY, EMPTY_LIST_CODE],
            RoleKey::Public(key) => encode_public(key),
            RoleKey::Fail => vec![key_type::FAIL, EMPTY_LIST_CODE],
            RoleKey::WeightedMultiSig(key) => encode_weighted(key),
        }
    }

    pub fn decode(bytes: &[u8]) -> KeyResult<Self> {
        decode_role_key(bytes)
    }

    /// The equivalent top-level key; `None` for `Nil`.
    pub fn into_account_key(self) -> Option<AccountKey> {
        match self {
            RoleKey::Nil => None,
            RoleKey::Legacy => Some(AccountKey::Legacy),
            RoleKey::Public(key) => Some(AccountKey::Public(key)),
            RoleKey::Fail => Some(AccountKey::Fail),
            RoleKey::WeightedMultiSig(key) => Some(AccountKey::WeightedMultiSig(key)),
        }
    }
}

fn encode_public(key: &PublicKey) -> Vec<u8> {
    let mut out = vec![key_type::PUBLIC];
    key.to_compressed().as_slice().encode(&mut out);
    out
}

fn encode_weighted(key: &WeightedMultiSigKey) -> Vec<u8> {
    let mut entries = RlpList::new();
    for entry in key.keys() {
        let mut pair = RlpList::new();
        pair.push(&entry.weight)
            .push_bytes(&entry.key.to_compressed());
        entries.push_raw(&pair.finish());
    }

    let mut body = RlpList::new();
    body.push(&key.threshold()).push_raw(&entries.finish());

    let mut out = vec![key_type::WEIGHTED_MULTISIG];
    out.extend_from_slice(&body.finish());
    out
}

fn encode_role_based(key: &RoleBasedKey) -> Vec<u8> {
    let mut body = RlpList::new();
    for role_key in key.entries() {
        body.push_bytes(&role_key.encode());
    }
    let mut out = vec![key_type::ROLE_BASED];
    out.extend_from_slice(&body.finish());
    out
}

fn decode_role_key(bytes: &[u8]) -> KeyResult<RoleKey> {
    let (&tag, body) = bytes
        .split_first()
        .ok_or_else(|| KeyError::InvalidAccountKey("empty input".to_string()))?;
    match tag {
        EMPTY_STRING_CODE if body.is_empty() => Ok(RoleKey::Nil),
        key_type::LEGACY if body == [EMPTY_LIST_CODE] => Ok(RoleKey::Legacy),
        key_type::FAIL if body == [EMPTY_LIST_CODE] => Ok(RoleKey::Fail),
        key_type::PUBLIC => {
            let mut buf = body;
            let compressed = Header::decode_bytes(&mut buf, false)
                .map_err(|error| FieldError::Rlp { field: "publicKey", error })?;
            if !buf.is_empty() {
                return Err(FieldError::TrailingBytes(buf.len()).into());
            }
            Ok(RoleKey::Public(PublicKey::from_sec1_bytes(compressed)?))
        }
        key_type::WEIGHTED_MULTISIG => decode_weighted(body).map(RoleKey::WeightedMultiSig),
        key_type::ROLE_BASED => Err(KeyError::InvalidAccountKey(
            "role-based key cannot be nested".to_string(),
        )),
        other => Err(KeyError::InvalidAccountKey(format!(
            "unknown or malformed key type {other:#04x}"
        ))),
    }
}

fn decode_weighted(body: &[u8]) -> KeyResult<WeightedMultiSigKey> {
    let mut reader = FieldReader::new(body)?;
    let threshold: u32 = reader.next("threshold")?;
    let mut entries = reader.next_list("keys")?;
    reader.finish()?;

    let mut keys = Vec::with_capacity(entries.len());
    while entries.remaining() > 0 {
        let mut pair = entries.next_list("weightedKey")?;
        let weight: u32 = pair.next("weight")?;
        let key = PublicKey::from_sec1_bytes(pair.next_bytes("publicKey")?)?;
        pair.finish()?;
        keys.push(WeightedPublicKey::new(weight, key));
    }
    WeightedMultiSigKey::new(threshold, keys)
}

fn decode_role_based(body: &[u8]) -> KeyResult<RoleBasedKey> {
    let mut reader = FieldReader::new(body)?;
    if reader.is_empty() || reader.len() > 3 {
        return Err(KeyError::InvalidAccountKey(format!(
            "role-based key must hold 1 to 3 roles, got {}",
            reader.len()
        )));
    }

    let mut roles = [RoleKey::Nil, RoleKey::Nil, RoleKey::Nil];
    for slot in roles.iter_mut().take(reader.len()) {
        *slot = decode_role_key(reader.next_bytes("roleKey")?)?;
    }
    let [transaction, update, fee_payer] = roles;
    Ok(RoleBasedKey::new(transaction, update, fee_payer))
}
