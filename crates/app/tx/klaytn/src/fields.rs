//! Field value types shared by several transaction bodies.

use alloy_primitives::{Address, B256};
use alloy_rlp::{RlpDecodable, RlpEncodable};
use serde::{Deserialize, Serialize};

use crate::error::{TxError, TxResult};

/// Share of the fee paid by the fee payer, in percent (1..=99).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FeeRatio(u8);

impl FeeRatio {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 99;

    pub fn new(ratio: u8) -> TxResult<Self> {
        if (Self::MIN..=Self::MAX).contains(&ratio) {
            Ok(Self(ratio))
        } else {
            Err(TxError::schema(
                "feeRatio",
                format!("must be between {} and {}, got {ratio}", Self::MIN, Self::MAX),
            ))
        }
    }

    pub const fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<u64> for FeeRatio {
    type Error = TxError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        let ratio = u8::try_from(value).map_err(|_| {
            TxError::schema("feeRatio", format!("must be between 1 and 99, got {value}"))
        })?;
        Self::new(ratio)
    }
}

/// Code format of a deployed contract. Only EVM bytecode exists on chain.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum CodeFormat {
    #[default]
    Evm,
}

impl CodeFormat {
    pub const fn code(self) -> u8 {
        match self {
            CodeFormat::Evm => 0,
        }
    }

    pub fn from_code(code: u64) -> Option<Self> {
        (code == 0).then_some(CodeFormat::Evm)
    }
}

/// An EIP-2930 access list entry.
#[derive(
    Clone, Debug, Default, PartialEq, Eq, Hash, RlpEncodable, RlpDecodable, Serialize, Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub struct AccessListItem {
    pub address: Address,
    pub storage_keys: Vec<B256>,
}

/// An EIP-2930 access list.
pub type AccessList = Vec<AccessListItem>;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_fee_ratio_bounds() {
        assert!(FeeRatio::new(0).is_err());
        assert_eq!(FeeRatio::new(1).unwrap().get(), 1);
        assert_eq!(FeeRatio::new(99).unwrap().get(), 99);
        assert!(FeeRatio::new(100).is_err());
        assert!(FeeRatio::try_from(300u64).is_err());
    }

    #[test]
    fn test_access_list_json_keys() {
        let item = AccessListItem {
            address: Address::repeat_byte(0x11),
            storage_keys: vec![B256::ZERO],
        };
        let json = serde_json::to_value(&item).unwrap();
        assert!(json.get("storageKeys").is_some());
    }
}
