//! secp256k1 key types, prehash signing and public key recovery.

use std::fmt;
use std::sync::OnceLock;

use alloy_primitives::{keccak256, Address, B256, U256};
use k256::ecdsa::SigningKey;
use k256::elliptic_curve::rand_core::CryptoRngCore;
use secp256k1::ecdsa::{RecoverableSignature, RecoveryId};
use secp256k1::{All, Message, Secp256k1};

use crate::error::{KeyError, KeyResult};
use crate::signature::{RecoveryEncoding, SignatureData};

/// A secp256k1 private key.
#[derive(Clone)]
pub struct PrivateKey(SigningKey);

impl PrivateKey {
    pub fn random(rng: &mut impl CryptoRngCore) -> Self {
        Self(SigningKey::random(rng))
    }

    pub fn from_bytes(bytes: &[u8]) -> KeyResult<Self> {
        if bytes.len() != 32 {
            return Err(KeyError::InvalidPrivateKey(format!(
                "expected 32 bytes, got {}",
                bytes.len()
            )));
        }
        SigningKey::from_slice(bytes)
            .map(Self)
            .map_err(|e| KeyError::InvalidPrivateKey(e.to_string()))
    }

    /// Parse a 32-byte hex key, with or without `0x`.
    pub fn from_hex(value: &str) -> KeyResult<Self> {
        let bytes = hex::decode(value.strip_prefix("0x").unwrap_or(value))
            .map_err(|e| KeyError::InvalidPrivateKey(e.to_string()))?;
        Self::from_bytes(&bytes)
    }

    pub fn to_bytes(&self) -> [u8; 32] {
        self.0.to_bytes().into()
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.to_bytes()))
    }

    pub fn public_key(&self) -> PublicKey {
        PublicKey::from_verifying_key(self.0.verifying_key())
    }

    /// Address derived from this key.
    pub fn address(&self) -> Address {
        self.public_key().address()
    }

    /// Sign a 32-byte digest (RFC 6979, low-s), folding the recovery id into
    /// `v` as `encoding` prescribes.
    pub fn sign(&self, hash: B256, encoding: RecoveryEncoding) -> KeyResult<SignatureData> {
        let (signature, recovery_id) = self
            .0
            .sign_prehash_recoverable(hash.as_slice())
            .map_err(|e| KeyError::InvalidPrivateKey(e.to_string()))?;
        let (r, s) = signature.split_bytes();
        Ok(SignatureData {
            v: encoding.v(recovery_id.is_y_odd()),
            r: U256::from_be_slice(&r),
            s: U256::from_be_slice(&s),
        })
    }
}

impl PartialEq for PrivateKey {
    fn eq(&self, other: &Self) -> bool {
        self.to_bytes() == other.to_bytes()
    }
}

impl Eq for PrivateKey {}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PrivateKey")
            .field(&self.address())
            .finish()
    }
}

/// A secp256k1 public key, kept in both SEC1 forms.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PublicKey {
    compressed: [u8; 33],
    uncompressed: [u8; 65],
}

impl PublicKey {
    fn from_verifying_key(key: &k256::ecdsa::VerifyingKey) -> Self {
        let mut compressed = [0u8; 33];
        let mut uncompressed = [0u8; 65];
        compressed.copy_from_slice(key.to_encoded_point(true).as_bytes());
        uncompressed.copy_from_slice(key.to_encoded_point(false).as_bytes());
        Self {
            compressed,
            uncompressed,
        }
    }

    /// Parse a compressed (33-byte) or uncompressed (65-byte) SEC1 key.
    pub fn from_sec1_bytes(bytes: &[u8]) -> KeyResult<Self> {
        let key = k256::ecdsa::VerifyingKey::from_sec1_bytes(bytes)
            .map_err(|e| KeyError::InvalidPublicKey(e.to_string()))?;
        Ok(Self::from_verifying_key(&key))
    }

    /// Parse a hex SEC1 key. A 64-byte key without the `04` tag is accepted.
    pub fn from_hex(value: &str) -> KeyResult<Self> {
        let mut bytes = hex::decode(value.strip_prefix("0x").unwrap_or(value))
            .map_err(|e| KeyError::InvalidPublicKey(e.to_string()))?;
        if bytes.len() == 64 {
            bytes.insert(0, 0x04);
        }
        Self::from_sec1_bytes(&bytes)
    }

    pub fn to_compressed(&self) -> [u8; 33] {
        self.compressed
    }

    pub fn to_uncompressed(&self) -> [u8; 65] {
        self.uncompressed
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.compressed))
    }

    /// Keccak-256 of the uncompressed point, last 20 bytes.
    pub fn address(&self) -> Address {
        let (_, point) = self.uncompressed.split_at(1);
        Address::from_word(keccak256(point))
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self.to_hex())
    }
}

/// Recover the public key that produced `signature` over `hash`.
pub fn recover_public_key(hash: B256, signature: &SignatureData) -> KeyResult<PublicKey> {
    let recid = signature
        .recovery_id()
        .ok_or(KeyError::SignatureRecovery)?;

    let mut compact = [0u8; 64];
    let (r, s) = compact.split_at_mut(32);
    r.copy_from_slice(&signature.r.to_be_bytes::<32>());
    s.copy_from_slice(&signature.s.to_be_bytes::<32>());

    let recid = RecoveryId::from_i32(i32::from(recid)).map_err(|_| KeyError::SignatureRecovery)?;
    let recoverable =
        RecoverableSignature::from_compact(&compact, recid).map_err(|_| KeyError::SignatureRecovery)?;
    let msg = Message::from_digest_slice(hash.as_slice()).map_err(|_| KeyError::SignatureRecovery)?;
    let pubkey = secp()
        .recover_ecdsa(&msg, &recoverable)
        .map_err(|_| KeyError::SignatureRecovery)?;

    Ok(PublicKey {
        compressed: pubkey.serialize(),
        uncompressed: pubkey.serialize_uncompressed(),
    })
}

/// Recover the address that produced `signature` over `hash`.
pub fn recover_address(hash: B256, signature: &SignatureData) -> KeyResult<Address> {
    recover_public_key(hash, signature).map(|key| key.address())
}

fn secp() -> &'static Secp256k1<All> {
    static SECP: OnceLock<Secp256k1<All>> = OnceLock::new();
    SECP.get_or_init(Secp256k1::new)
}

#[cfg(test)]
#[allow(clippy::indexing_slicing, clippy::unwrap_used)]
mod tests {
    use super::*;
    use rand::rngs::OsRng;

    #[test]
    fn test_address_from_known_key() {
        let key = PrivateKey::from_hex(
            "0xf8cc7c3813ad23817466b1802ee805ee417001fcce9376ab8728c92dd8ea0a6b",
        )
        .unwrap();
        assert_eq!(
            key.address(),
            "0x90B3E9A3770481345A7F17f22f16D020Bccfd33e"
                .parse::<Address>()
                .unwrap()
        );
    }

    #[test]
    fn test_sign_then_recover() {
        let key = PrivateKey::random(&mut OsRng);
        let hash = keccak256(b"klay-key-recovery-test");

        for encoding in [
            RecoveryEncoding::Eip155 { chain_id: 1001 },
            RecoveryEncoding::YParity,
            RecoveryEncoding::Message,
        ] {
            let signature = key.sign(hash, encoding).unwrap();
            assert!(signature.is_low_s());
            let recovered = recover_public_key(hash, &signature).unwrap();
            assert_eq!(recovered, key.public_key());
            assert_eq!(recover_address(hash, &signature).unwrap(), key.address());
        }
    }

    #[test]
    fn test_signing_is_deterministic() {
        let key = PrivateKey::random(&mut OsRng);
        let hash = keccak256(b"deterministic");
        let a = key.sign(hash, RecoveryEncoding::YParity).unwrap();
        let b = key.sign(hash, RecoveryEncoding::YParity).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_recover_rejects_invalid_components() {
        let hash = keccak256(b"invalid-signature-components");
        let invalid = SignatureData::new(27, U256::MAX, U256::MAX);
        assert_eq!(
            recover_public_key(hash, &invalid).unwrap_err(),
            KeyError::SignatureRecovery
        );

        let bad_v = SignatureData::new(5, U256::from(1), U256::from(1));
        assert_eq!(
            recover_public_key(hash, &bad_v).unwrap_err(),
            KeyError::SignatureRecovery
        );
    }

    #[test]
    fn test_forged_recovery_id_yields_other_signer() {
        let key = PrivateKey::random(&mut OsRng);
        let hash = keccak256(b"forged-recovery-id");
        let valid = key.sign(hash, RecoveryEncoding::YParity).unwrap();
        let forged = SignatureData::new(1 - valid.v, valid.r, valid.s);

        let recovered = recover_address(hash, &forged).unwrap();
        assert_ne!(recovered, key.address());
    }

    #[test]
    fn test_public_key_forms() {
        let key = PrivateKey::random(&mut OsRng);
        let public = key.public_key();
        let compressed = PublicKey::from_sec1_bytes(&public.to_compressed()).unwrap();
        let uncompressed = PublicKey::from_sec1_bytes(&public.to_uncompressed()).unwrap();
        let bare = PublicKey::from_hex(&hex::encode(&public.to_uncompressed()[1..])).unwrap();
        assert_eq!(compressed, public);
        assert_eq!(uncompressed, public);
        assert_eq!(bare, public);
    }

    #[test]
    fn test_private_key_rejects_bad_lengths() {
        assert!(matches!(
            PrivateKey::from_bytes(&[1u8; 31]),
            Err(KeyError::InvalidPrivateKey(_))
        ));
        assert!(PrivateKey::from_bytes(&[0u8; 32]).is_err());
        assert!(PrivateKey::from_hex("0xnothex").is_err());
    }

    #[test]
    fn test_debug_does_not_leak_key() {
        let key = PrivateKey::random(&mut OsRng);
        let rendered = format!("{key:?}");
        assert!(!rendered.contains(&hex::encode(key.to_bytes())));
    }
}
