//! Transaction type tags.

use std::fmt;
use std::str::FromStr;

/// Prefix byte of Ethereum-style envelopes on the wire.
pub const ETHEREUM_TX_TYPE_PREFIX: u8 = 0x78;

macro_rules! tx_types {
    ($($variant:ident = $tag:literal, $name:literal, $upper:literal;)*) => {
        /// Every transaction type the codec understands.
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[repr(u16)]
        pub enum TxType {
            $($variant = $tag,)*
        }

        impl TxType {
            pub const ALL: &'static [TxType] = &[$(TxType::$variant,)*];

            /// Canonical `TxType…` name.
            pub const fn name(self) -> &'static str {
                match self {
                    $(TxType::$variant => $name,)*
                }
            }

            /// Upper snake-case alias.
            pub const fn upper_name(self) -> &'static str {
                match self {
                    $(TxType::$variant => $upper,)*
                }
            }

            pub const fn from_tag(tag: u16) -> Option<Self> {
                match tag {
                    $($tag => Some(TxType::$variant),)*
                    _ => None,
                }
            }
        }
    };
}

tx_types! {
    Legacy = 0x00, "TxTypeLegacyTransaction", "LEGACY";
    ValueTransfer = 0x08, "TxTypeValueTransfer", "VALUE_TRANSFER";
    FeeDelegatedValueTransfer = 0x09, "TxTypeFeeDelegatedValueTransfer", "FEE_DELEGATED_VALUE_TRANSFER";
    FeeDelegatedValueTransferWithRatio = 0x0a, "TxTypeFeeDelegatedValueTransferWithRatio", "FEE_DELEGATED_VALUE_TRANSFER_WITH_RATIO";
    ValueTransferMemo = 0x10, "TxTypeValueTransferMemo", "VALUE_TRANSFER_MEMO";
    FeeDelegatedValueTransferMemo = 0x11, "TxTypeFeeDelegatedValueTransferMemo", "FEE_DELEGATED_VALUE_TRANSFER_MEMO";
    FeeDelegatedValueTransferMemoWithRatio = 0x12, "TxTypeFeeDelegatedValueTransferMemoWithRatio", "FEE_DELEGATED_VALUE_TRANSFER_MEMO_WITH_RATIO";
    AccountUpdate = 0x20, "TxTypeAccountUpdate", "ACCOUNT_UPDATE";
    FeeDelegatedAccountUpdate = 0x21, "TxTypeFeeDelegatedAccountUpdate", "FEE_DELEGATED_ACCOUNT_UPDATE";
    FeeDelegatedAccountUpdateWithRatio = 0x22, "TxTypeFeeDelegatedAccountUpdateWithRatio", "FEE_DELEGATED_ACCOUNT_UPDATE_WITH_RATIO";
    SmartContractDeploy = 0x28, "TxTypeSmartContractDeploy", "SMART_CONTRACT_DEPLOY";
    FeeDelegatedSmartContractDeploy = 0x29, "TxTypeFeeDelegatedSmartContractDeploy", "FEE_DELEGATED_SMART_CONTRACT_DEPLOY";
    FeeDelegatedSmartContractDeployWithRatio = 0x2a, "TxTypeFeeDelegatedSmartContractDeployWithRatio", "FEE_DELEGATED_SMART_CONTRACT_DEPLOY_WITH_RATIO";
    SmartContractExecution = 0x30, "TxTypeSmartContractExecution", "SMART_CONTRACT_EXECUTION";
    FeeDelegatedSmartContractExecution = 0x31, "TxTypeFeeDelegatedSmartContractExecution", "FEE_DELEGATED_SMART_CONTRACT_EXECUTION";
    FeeDelegatedSmartContractExecutionWithRatio = 0x32, "TxTypeFeeDelegatedSmartContractExecutionWithRatio", "FEE_DELEGATED_SMART_CONTRACT_EXECUTION_WITH_RATIO";
    Cancel = 0x38, "TxTypeCancel", "CANCEL";
    FeeDelegatedCancel = 0x39, "TxTypeFeeDelegatedCancel", "FEE_DELEGATED_CANCEL";
    FeeDelegatedCancelWithRatio = 0x3a, "TxTypeFeeDelegatedCancelWithRatio", "FEE_DELEGATED_CANCEL_WITH_RATIO";
    ChainDataAnchoring = 0x48, "TxTypeChainDataAnchoring", "CHAIN_DATA_ANCHORING";
    FeeDelegatedChainDataAnchoring = 0x49, "TxTypeFeeDelegatedChainDataAnchoring", "FEE_DELEGATED_CHAIN_DATA_ANCHORING";
    FeeDelegatedChainDataAnchoringWithRatio = 0x4a, "TxTypeFeeDelegatedChainDataAnchoringWithRatio", "FEE_DELEGATED_CHAIN_DATA_ANCHORING_WITH_RATIO";
    EthereumAccessList = 0x7801, "TxTypeEthereumAccessList", "ETHEREUM_ACCESS_LIST";
    EthereumDynamicFee = 0x7802, "TxTypeEthereumDynamicFee", "ETHEREUM_DYNAMIC_FEE";
}

impl TxType {
    pub const fn tag(self) -> u16 {
        self as u16
    }

    /// Chain-native types: a single type byte below the Ethereum prefix.
    pub const fn is_klaytn_native(self) -> bool {
        !matches!(
            self,
            TxType::Legacy | TxType::EthereumAccessList | TxType::EthereumDynamicFee
        )
    }

    pub const fn is_ethereum(self) -> bool {
        matches!(self, TxType::EthereumAccessList | TxType::EthereumDynamicFee)
    }

    pub const fn is_fee_delegated(self) -> bool {
        self.is_klaytn_native() && (self.tag() & 0x07) != 0
    }

    pub const fn has_fee_ratio(self) -> bool {
        self.is_klaytn_native() && (self.tag() & 0x07) == 2
    }

    /// Bytes written before the RLP body on the wire.
    pub fn wire_prefix(self) -> Vec<u8> {
        match self {
            TxType::Legacy => Vec::new(),
            TxType::EthereumAccessList => vec![ETHEREUM_TX_TYPE_PREFIX, 0x01],
            TxType::EthereumDynamicFee => vec![ETHEREUM_TX_TYPE_PREFIX, 0x02],
            other => vec![other.tag() as u8],
        }
    }

    /// Parse a canonical name, an upper snake-case alias or a numeric tag.
    pub fn parse(value: &str) -> Option<Self> {
        if let Some(found) = Self::ALL
            .iter()
            .find(|t| t.name() == value || t.upper_name() == value)
        {
            return Some(*found);
        }
        let tag = match value.strip_prefix("0x") {
            Some(hex) => u16::from_str_radix(hex, 16).ok()?,
            None => value.parse().ok()?,
        };
        Self::from_tag(tag)
    }
}

impl fmt::Display for TxType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TxType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("unknown transaction type {s:?}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_forms() {
        assert_eq!(TxType::parse("TxTypeValueTransfer"), Some(TxType::ValueTransfer));
        assert_eq!(
            TxType::parse("FEE_DELEGATED_VALUE_TRANSFER_WITH_RATIO"),
            Some(TxType::FeeDelegatedValueTransferWithRatio)
        );
        assert_eq!(TxType::parse("0x30"), Some(TxType::SmartContractExecution));
        assert_eq!(TxType::parse("8"), Some(TxType::ValueTransfer));
        assert_eq!(TxType::parse("0x7802"), Some(TxType::EthereumDynamicFee));
        assert_eq!(TxType::parse("0x0b"), None);
        assert_eq!(TxType::parse("Transfer"), None);
    }

    #[test]
    fn test_fee_delegation_flags() {
        assert!(!TxType::ValueTransfer.is_fee_delegated());
        assert!(TxType::FeeDelegatedCancel.is_fee_delegated());
        assert!(!TxType::FeeDelegatedCancel.has_fee_ratio());
        assert!(TxType::FeeDelegatedChainDataAnchoringWithRatio.has_fee_ratio());
        assert!(!TxType::Legacy.is_fee_delegated());
        assert!(!TxType::EthereumDynamicFee.is_fee_delegated());
    }

    #[test]
    fn test_wire_prefix() {
        assert!(TxType::Legacy.wire_prefix().is_empty());
        assert_eq!(TxType::FeeDelegatedValueTransferWithRatio.wire_prefix(), vec![0x0a]);
        assert_eq!(TxType::EthereumAccessList.wire_prefix(), vec![0x78, 0x01]);
    }

    #[test]
    fn test_all_types_listed() {
        assert_eq!(TxType::ALL.len(), 24);
        for ty in TxType::ALL {
            assert_eq!(TxType::from_tag(ty.tag()), Some(*ty));
            assert_eq!(TxType::parse(ty.name()), Some(*ty));
            assert_eq!(TxType::parse(ty.upper_name()), Some(*ty));
        }
    }
}
