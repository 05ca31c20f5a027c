//! Typed transactions for multi-authority accounts.
//!
//! This crate builds, encodes, signs and verifies the transaction types of a
//! chain whose accounts may be governed by weighted multisig or role-based
//! keys, and whose fees may be paid by a second party.
//!
//! # Transaction Types
//!
//! - **Legacy**: untyped transactions with EIP-155 replay protection
//! - **Chain-native (0x08..0x4a)**: value transfer, memo, account update,
//!   contract deploy and execution, cancel and data anchoring, each in a
//!   sender-paid, fee-delegated and partially fee-delegated form
//! - **Ethereum-compatible (0x7801, 0x7802)**: EIP-2930 and EIP-1559 bodies
//!   behind the `0x78` prefix
//!
//! # Usage
//!
//! ```text
//! use klay_tx::{combine_signed_raw_transactions, SignOptions, Transaction};
//!
//! // Sender signs, fee payer co-signs on a separate copy
//! let mut tx = Transaction::from_fields(&fields)?;
//! tx.sign(&sender_keyring, &SignOptions::default())?;
//! let mut payer_copy = Transaction::decode_hex(&tx.raw_transaction()?)?;
//! payer_copy.sign_as_fee_payer(&payer_keyring, &SignOptions::default())?;
//!
//! // Merge the independently signed copies
//! let raw = combine_signed_raw_transactions(&[tx.raw_transaction()?, payer_copy.raw_transaction()?])?;
//! ```
//!
//! # Architecture
//!
//! 1. [`TypedTransaction`] - Core trait all transaction types implement
//! 2. [`KlaytnTx`] - Chain-native body over a fee mode
//! 3. [`Transaction`] - Enum holding any supported transaction type
//! 4. [`TypedTxDecoder`] - Decoder restricted to a set of types
//! 5. [`SignatureVerifier`] - Chain id and signature weight checks
//! 6. [`ChainContext`] - Injected chain state for filling transactions

pub mod combine;
pub mod config;
pub mod context;
pub mod decoder;
pub mod envelope;
pub mod error;
pub mod ethereum;
pub mod fields;
pub mod klaytn;
pub mod schema;
pub mod signing;
pub mod traits;
pub mod tx_type;
pub mod verifier;

// Re-export main types
pub use combine::{combine, combine_signed_raw_transactions};
pub use context::{
    fill_transaction, sign_as_fee_payer_with_context, sign_with_context, AccountState,
    ChainContext, StaticChainContext,
};
pub use decoder::TypedTxDecoder;
pub use envelope::Transaction;
pub use error::*;
pub use ethereum::{AccessListTransaction, DynamicFeeTransaction, LegacyTransaction};
pub use fields::{AccessList, AccessListItem, CodeFormat, FeeRatio};
pub use klaytn::{
    FeeDelegated, FeeDelegatedWithRatio, FeeMode, FeePayer, KlaytnTx, Payload, SenderPaid,
};
pub use signing::SignOptions;
pub use traits::{FeeDelegatedTransaction, TypedTransaction};
pub use tx_type::{TxType, ETHEREUM_TX_TYPE_PREFIX};
pub use verifier::{SignatureVerifier, VerificationReport};
