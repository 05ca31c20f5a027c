//! Signing authority model for multi-key accounts.
//!
//! An account on the chain can be governed by a single key, by a weighted
//! multi-signature key, or by a role-based key that hands out separate
//! authority for ordinary transactions, account updates and fee payment.
//! This crate holds both sides of that model:
//!
//! - [`AccountKey`] - the public, on-chain authority structure, with its
//!   consensus encoding and signature-weight evaluation.
//! - [`Keyring`] - private key material bound to an address, able to produce
//!   the signatures a given [`Role`] requires.
//! - [`SignatureData`] / [`SignatureSet`] - `(v, r, s)` tuples and the
//!   de-duplicated lists transactions carry.
//!
//! # Architecture
//!
//! 1. [`crypto`] - secp256k1 key types, prehash signing and recovery
//! 2. [`account_key`] - on-chain keys, role-scoped views and weights
//! 3. [`keyring`] - key holders, generation, legacy wallet-key format
//! 4. [`resolve`] - picks the private keys that must sign for a role
//! 5. [`encoding`] - RLP list builder and field reader shared with the
//!    transaction codec

pub mod account_key;
pub mod crypto;
pub mod encoding;
pub mod error;
pub mod keyring;
pub mod message;
pub mod resolve;
pub mod role;
pub mod signature;

pub use account_key::{
    AccountKey, RoleBasedKey, RoleKey, RoleKeyRef, SignatureWeight, WeightedMultiSigKey,
    WeightedMultiSigOptions, WeightedPublicKey, MAX_WEIGHTED_KEYS,
};
pub use crypto::{recover_address, recover_public_key, PrivateKey, PublicKey};
pub use error::{KeyError, KeyResult};
pub use keyring::{
    KeyringContainer, KlaytnWalletKey, Keyring, MultipleKeyring, RoleBasedKeyring, SingleKeyring,
};
pub use message::{hash_message, recover_message, SignedMessage};
pub use resolve::{resolve_signers, LegacyKeyPolicy, SignerQuery};
pub use role::Role;
pub use signature::{RecoveryEncoding, SignatureData, SignatureSet};
