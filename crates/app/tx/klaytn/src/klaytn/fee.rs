//! Who pays for a chain-native transaction.

use std::fmt;

use alloy_primitives::Address;
use klay_keys::SignatureSet;

use crate::error::{DecodeError, DecodeResult};
use crate::fields::FeeRatio;
use crate::klaytn::payload::{Payload, TypeFamily};
use crate::klaytn::KlaytnTx;
use crate::traits::FeeDelegatedTransaction;
use crate::tx_type::TxType;

/// Fee-payer address and co-signatures of a fee-delegated transaction.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FeePayer {
    /// `None` until a fee payer is named (written as the empty string).
    pub address: Option<Address>,
    pub signatures: SignatureSet,
}

impl FeePayer {
    pub fn new(address: Address) -> Self {
        Self {
            address: Some(address),
            signatures: SignatureSet::new(),
        }
    }
}

/// Fee arrangement of a chain-native transaction.
///
/// The mode picks the type tag out of a body's [`TypeFamily`] and decides
/// which trailing fields appear on the wire.
pub trait FeeMode: Clone + fmt::Debug + PartialEq + Eq + Send + Sync + 'static {
    const DELEGATED: bool;
    const WITH_RATIO: bool;

    fn tx_type(family: TypeFamily) -> TxType;

    fn ratio(&self) -> Option<FeeRatio> {
        None
    }

    fn payer(&self) -> Option<&FeePayer> {
        None
    }

    /// Rebuild the mode from decoded wire fields.
    fn from_wire(ratio: Option<FeeRatio>, payer: Option<FeePayer>) -> DecodeResult<Self>;

    fn as_delegated<P: Payload>(tx: &KlaytnTx<P, Self>) -> Option<&dyn FeeDelegatedTransaction>;

    fn as_delegated_mut<P: Payload>(
        tx: &mut KlaytnTx<P, Self>,
    ) -> Option<&mut dyn FeeDelegatedTransaction>;
}

/// Modes that carry a fee payer.
pub trait DelegatedFee: FeeMode {
    fn fee_payer(&self) -> &FeePayer;

    fn fee_payer_mut(&mut self) -> &mut FeePayer;
}

/// The sender pays the whole fee.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SenderPaid;

impl FeeMode for SenderPaid {
    const DELEGATED: bool = false;
    const WITH_RATIO: bool = false;

    fn tx_type(family: TypeFamily) -> TxType {
        family.basic
    }

    fn from_wire(_ratio: Option<FeeRatio>, _payer: Option<FeePayer>) -> DecodeResult<Self> {
        Ok(SenderPaid)
    }

    fn as_delegated<P: Payload>(_tx: &KlaytnTx<P, Self>) -> Option<&dyn FeeDelegatedTransaction> {
        None
    }

    fn as_delegated_mut<P: Payload>(
        _tx: &mut KlaytnTx<P, Self>,
    ) -> Option<&mut dyn FeeDelegatedTransaction> {
        None
    }
}

/// A fee payer covers the whole fee.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FeeDelegated {
    pub payer: FeePayer,
}

impl FeeDelegated {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_payer(address: Address) -> Self {
        Self {
            payer: FeePayer::new(address),
        }
    }
}

impl FeeMode for FeeDelegated {
    const DELEGATED: bool = true;
    const WITH_RATIO: bool = false;

    fn tx_type(family: TypeFamily) -> TxType {
        family.fee_delegated
    }

    fn payer(&self) -> Option<&FeePayer> {
        Some(&self.payer)
    }

    fn from_wire(_ratio: Option<FeeRatio>, payer: Option<FeePayer>) -> DecodeResult<Self> {
        Ok(Self {
            payer: payer.unwrap_or_default(),
        })
    }

    fn as_delegated<P: Payload>(tx: &KlaytnTx<P, Self>) -> Option<&dyn FeeDelegatedTransaction> {
        Some(tx)
    }

    fn as_delegated_mut<P: Payload>(
        tx: &mut KlaytnTx<P, Self>,
    ) -> Option<&mut dyn FeeDelegatedTransaction> {
        Some(tx)
    }
}

impl DelegatedFee for FeeDelegated {
    fn fee_payer(&self) -> &FeePayer {
        &self.payer
    }

    fn fee_payer_mut(&mut self) -> &mut FeePayer {
        &mut self.payer
    }
}

/// A fee payer covers `ratio` percent of the fee, the sender the rest.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FeeDelegatedWithRatio {
    pub payer: FeePayer,
    pub ratio: FeeRatio,
}

impl FeeDelegatedWithRatio {
    pub fn new(ratio: FeeRatio) -> Self {
        Self {
            payer: FeePayer::default(),
            ratio,
        }
    }

    pub fn with_payer(address: Address, ratio: FeeRatio) -> Self {
        Self {
            payer: FeePayer::new(address),
            ratio,
        }
    }
}

impl FeeMode for FeeDelegatedWithRatio {
    const DELEGATED: bool = true;
    const WITH_RATIO: bool = true;

    fn tx_type(family: TypeFamily) -> TxType {
        family.with_ratio
    }

    fn ratio(&self) -> Option<FeeRatio> {
        Some(self.ratio)
    }

    fn payer(&self) -> Option<&FeePayer> {
        Some(&self.payer)
    }

    fn from_wire(ratio: Option<FeeRatio>, payer: Option<FeePayer>) -> DecodeResult<Self> {
        let ratio = ratio.ok_or(DecodeError::InvalidField {
            field: "feeRatio",
            reason: "missing".to_string(),
        })?;
        Ok(Self {
            payer: payer.unwrap_or_default(),
            ratio,
        })
    }

    fn as_delegated<P: Payload>(tx: &KlaytnTx<P, Self>) -> Option<&dyn FeeDelegatedTransaction> {
        Some(tx)
    }

    fn as_delegated_mut<P: Payload>(
        tx: &mut KlaytnTx<P, Self>,
    ) -> Option<&mut dyn FeeDelegatedTransaction> {
        Some(tx)
    }
}

impl DelegatedFee for FeeDelegatedWithRatio {
    fn fee_payer(&self) -> &FeePayer {
        &self.payer
    }

    fn fee_payer_mut(&mut self) -> &mut FeePayer {
        &mut self.payer
    }
}
