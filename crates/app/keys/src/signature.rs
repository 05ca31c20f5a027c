//! Signature tuples and signature lists.

use std::ops::Deref;

use alloy_primitives::U256;
use alloy_rlp::{BufMut, Decodable, Encodable, RlpDecodable, RlpEncodable};

use crate::error::{KeyError, KeyResult};

/// A single ECDSA signature as carried on the wire.
///
/// `v` keeps whatever recovery encoding the signer used (EIP-155, y-parity or
/// the `27/28` message form); [`SignatureData::recovery_id`] normalizes it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, RlpEncodable, RlpDecodable)]
pub struct SignatureData {
    pub v: u64,
    pub r: U256,
    pub s: U256,
}

impl SignatureData {
    /// The "empty" signature `{v: 1, r: 0, s: 0}` written for unsigned slots.
    pub const PLACEHOLDER: Self = Self {
        v: 1,
        r: U256::ZERO,
        s: U256::ZERO,
    };

    pub const fn new(v: u64, r: U256, s: U256) -> Self {
        Self { v, r, s }
    }

    /// Parse from hex components, each with or without a `0x` prefix.
    ///
    /// `r` and `s` accept up to 32 bytes, `v` up to 8 bytes.
    pub fn from_hex(v: &str, r: &str, s: &str) -> KeyResult<Self> {
        Ok(Self {
            v: parse_hex_u64(v, "v")?,
            r: parse_hex_u256(r, "r")?,
            s: parse_hex_u256(s, "s")?,
        })
    }

    /// `v`, `r` and `s` as `0x`-prefixed minimal hex strings.
    pub fn to_hex_parts(&self) -> [String; 3] {
        [
            format!("{:#x}", self.v),
            format!("{:#x}", self.r),
            format!("{:#x}", self.s),
        ]
    }

    pub fn is_placeholder(&self) -> bool {
        self.r.is_zero() && self.s.is_zero()
    }

    /// Recovery id (0 or 1) implied by `v`.
    ///
    /// Accepts raw parity (`0/1`), the message form (`27/28`) and EIP-155
    /// values (`>= 35`). Anything else has no defined recovery id.
    pub fn recovery_id(&self) -> Option<u8> {
        match self.v {
            0 | 1 => Some(self.v as u8),
            27 | 28 => Some((self.v - 27) as u8),
            v if v >= 35 => Some(((v - 35) % 2) as u8),
            _ => None,
        }
    }

    /// Chain id encoded in an EIP-155 `v`, if any.
    pub fn eip155_chain_id(&self) -> Option<u64> {
        (self.v >= 35).then(|| (self.v - 35) / 2)
    }

    /// Whether `s` lies in the lower half of the curve order.
    pub fn is_low_s(&self) -> bool {
        self.s <= SECP256K1_HALF_ORDER
    }
}

impl Default for SignatureData {
    fn default() -> Self {
        Self::PLACEHOLDER
    }
}

// Total order used to keep combined signature lists deterministic.
impl Ord for SignatureData {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.r, self.s, self.v).cmp(&(other.r, other.s, other.v))
    }
}

impl PartialOrd for SignatureData {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

const SECP256K1_HALF_ORDER: U256 = U256::from_limbs([
    0xdfe9_2f46_681b_20a0,
    0x5d57_6e73_57a4_501d,
    0xffff_ffff_ffff_ffff,
    0x7fff_ffff_ffff_ffff,
]);

fn strip_hex(value: &str) -> &str {
    value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value)
}

fn parse_hex_u64(value: &str, component: &str) -> KeyResult<u64> {
    let digits = strip_hex(value);
    if digits.is_empty() || digits.len() > 16 {
        return Err(KeyError::InvalidSignatureShape(format!(
            "{component} must be 1 to 16 hex digits, got {value:?}"
        )));
    }
    u64::from_str_radix(digits, 16).map_err(|e| {
        KeyError::InvalidSignatureShape(format!("{component} is not hex ({value:?}): {e}"))
    })
}

fn parse_hex_u256(value: &str, component: &str) -> KeyResult<U256> {
    let digits = strip_hex(value);
    if digits.is_empty() || digits.len() > 64 {
        return Err(KeyError::InvalidSignatureShape(format!(
            "{component} must be 1 to 64 hex digits, got {value:?}"
        )));
    }
    U256::from_str_radix(digits, 16).map_err(|e| {
        KeyError::InvalidSignatureShape(format!("{component} is not hex ({value:?}): {e}"))
    })
}

/// How the recovery id is folded into `v` when signing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecoveryEncoding {
    /// `recid + 2 * chain_id + 35`, used by chain-native and legacy transactions.
    Eip155 { chain_id: u64 },
    /// Bare y-parity, used by typed Ethereum transactions.
    YParity,
    /// `27 + recid`, used by signed messages.
    Message,
}

impl RecoveryEncoding {
    /// Compute `v` for the given y-parity.
    pub fn v(self, y_odd: bool) -> u64 {
        let recid = u64::from(y_odd);
        match self {
            RecoveryEncoding::Eip155 { chain_id } => chain_id
                .saturating_mul(2)
                .saturating_add(35)
                .saturating_add(recid),
            RecoveryEncoding::YParity => recid,
            RecoveryEncoding::Message => 27 + recid,
        }
    }
}

/// A de-duplicated, insertion-ordered list of real signatures.
///
/// Placeholders are never stored. An empty set still encodes as a list with
/// one placeholder entry, which is what unsigned transactions carry on the
/// wire.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct SignatureSet {
    entries: Vec<SignatureData>,
}

impl SignatureSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from wire entries, dropping placeholders and duplicates.
    pub fn from_wire(entries: impl IntoIterator<Item = SignatureData>) -> Self {
        let mut set = Self::new();
        set.extend(entries);
        set
    }

    /// Add a signature. Returns `false` if it was a placeholder or already present.
    pub fn push(&mut self, signature: SignatureData) -> bool {
        if signature.is_placeholder() || self.entries.contains(&signature) {
            return false;
        }
        self.entries.push(signature);
        true
    }

    pub fn extend(&mut self, signatures: impl IntoIterator<Item = SignatureData>) {
        for signature in signatures {
            self.push(signature);
        }
    }

    /// Entries exactly as written to the wire.
    pub fn wire_entries(&self) -> Vec<SignatureData> {
        if self.entries.is_empty() {
            vec![SignatureData::PLACEHOLDER]
        } else {
            self.entries.clone()
        }
    }

    /// Union of two sets in canonical `(r, s, v)` order.
    pub fn union(&self, other: &Self) -> Self {
        let mut merged = self.clone();
        merged.extend(other.entries.iter().copied());
        merged.sorted()
    }

    /// The same set in canonical `(r, s, v)` order.
    pub fn sorted(mut self) -> Self {
        self.entries.sort();
        self
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn into_vec(self) -> Vec<SignatureData> {
        self.entries
    }
}

impl Deref for SignatureSet {
    type Target = [SignatureData];

    fn deref(&self) -> &Self::Target {
        &self.entries
    }
}

impl FromIterator<SignatureData> for SignatureSet {
    fn from_iter<I: IntoIterator<Item = SignatureData>>(iter: I) -> Self {
        Self::from_wire(iter)
    }
}

impl From<Vec<SignatureData>> for SignatureSet {
    fn from(entries: Vec<SignatureData>) -> Self {
        Self::from_wire(entries)
    }
}

impl Encodable for SignatureSet {
    fn encode(&self, out: &mut dyn BufMut) {
        self.wire_entries().encode(out);
    }

    fn length(&self) -> usize {
        self.wire_entries().length()
    }
}

impl Decodable for SignatureSet {
    fn decode(buf: &mut &[u8]) -> alloy_rlp::Result<Self> {
        Ok(Self::from_wire(Vec::<SignatureData>::decode(buf)?))
    }
}

#[cfg(test)]
#[allow(clippy::indexing_slicing, clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sig(v: u64, r: u64, s: u64) -> SignatureData {
        SignatureData::new(v, U256::from(r), U256::from(s))
    }

    #[test]
    fn test_placeholder_encoding() {
        let encoded = alloy_rlp::encode(SignatureData::PLACEHOLDER);
        assert_eq!(encoded, vec![0xc3, 0x01, 0x80, 0x80]);

        let empty = alloy_rlp::encode(SignatureSet::new());
        assert_eq!(empty, vec![0xc4, 0xc3, 0x01, 0x80, 0x80]);
    }

    #[test]
    fn test_decode_drops_placeholders() {
        let wire = vec![SignatureData::PLACEHOLDER, sig(37, 5, 6)];
        let encoded = alloy_rlp::encode(&wire);
        let set = SignatureSet::decode(&mut encoded.as_slice()).unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(set[0], sig(37, 5, 6));
    }

    #[test]
    fn test_push_deduplicates() {
        let mut set = SignatureSet::new();
        assert!(set.push(sig(37, 1, 2)));
        assert!(!set.push(sig(37, 1, 2)));
        assert!(!set.push(SignatureData::PLACEHOLDER));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_union_is_order_independent() {
        let a = SignatureSet::from_wire([sig(37, 3, 1), sig(38, 1, 9)]);
        let b = SignatureSet::from_wire([sig(37, 2, 2), sig(37, 3, 1)]);
        let ab = a.union(&b);
        let ba = b.union(&a);
        assert_eq!(ab, ba);
        assert_eq!(ab.len(), 3);
        assert_eq!(ab[0].r, U256::from(1));
    }

    #[test]
    fn test_recovery_id_forms() {
        assert_eq!(sig(0, 1, 1).recovery_id(), Some(0));
        assert_eq!(sig(28, 1, 1).recovery_id(), Some(1));
        assert_eq!(sig(2037, 1, 1).recovery_id(), Some(0));
        assert_eq!(sig(2038, 1, 1).recovery_id(), Some(1));
        assert_eq!(sig(2037, 1, 1).eip155_chain_id(), Some(1001));
        assert_eq!(sig(5, 1, 1).recovery_id(), None);
    }

    #[test]
    fn test_recovery_encoding_v() {
        assert_eq!(RecoveryEncoding::Eip155 { chain_id: 1 }.v(false), 37);
        assert_eq!(RecoveryEncoding::Eip155 { chain_id: 1001 }.v(true), 2038);
        assert_eq!(RecoveryEncoding::YParity.v(true), 1);
        assert_eq!(RecoveryEncoding::Message.v(false), 27);
    }

    #[test]
    fn test_from_hex() {
        let parsed = SignatureData::from_hex("0x25", "0x0a", "b").unwrap();
        assert_eq!(parsed, sig(37, 10, 11));
        assert_eq!(parsed.to_hex_parts(), ["0x25", "0xa", "0xb"]);

        let too_long = format!("0x{}", "1".repeat(65));
        assert!(matches!(
            SignatureData::from_hex("0x25", &too_long, "0x1"),
            Err(KeyError::InvalidSignatureShape(_))
        ));
        assert!(SignatureData::from_hex("0x25", "0xzz", "0x1").is_err());
    }

    #[test]
    fn test_low_s() {
        assert!(sig(27, 1, 1).is_low_s());
        assert!(!SignatureData::new(27, U256::from(1), U256::MAX).is_low_s());
    }
}
