//! RLP list building and field-by-field decoding.
//!
//! Transactions and account keys are flat RLP lists whose layout depends on
//! a type tag, so both codecs work item by item instead of through derived
//! structs. [`RlpList`] appends already-typed values and wraps them in a list
//! header; [`FieldReader`] splits a list into raw items and decodes them in
//! order, naming the offending field on failure.

use alloy_primitives::Address;
use alloy_rlp::{Decodable, Encodable, Header, EMPTY_STRING_CODE};
use thiserror::Error;

/// Failure to read one field of an RLP list.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    /// The field is not valid canonical RLP for its type.
    #[error("field `{field}`: {error}")]
    Rlp {
        field: &'static str,
        error: alloy_rlp::Error,
    },

    /// A list was expected but a string was found.
    #[error("field `{0}` is not an RLP list")]
    NotAList(&'static str),

    /// The list ended before this field.
    #[error("missing field `{0}`")]
    Missing(&'static str),

    /// Bytes remain after the outer list.
    #[error("{0} trailing bytes after RLP list")]
    TrailingBytes(usize),

    /// The list holds more items than the layout defines.
    #[error("{0} unexpected items at end of RLP list")]
    ExtraItems(usize),
}

/// Builder for a single RLP list.
#[derive(Clone, Debug, Default)]
pub struct RlpList {
    payload: Vec<u8>,
}

impl RlpList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append any RLP-encodable value.
    pub fn push<T: Encodable + ?Sized>(&mut self, value: &T) -> &mut Self {
        value.encode(&mut self.payload);
        self
    }

    /// Append a byte string.
    pub fn push_bytes(&mut self, bytes: &[u8]) -> &mut Self {
        bytes.encode(&mut self.payload);
        self
    }

    /// Append the empty string (`0x80`).
    pub fn push_empty(&mut self) -> &mut Self {
        self.payload.push(EMPTY_STRING_CODE);
        self
    }

    /// Append an address, or the empty string when absent.
    pub fn push_optional_address(&mut self, address: Option<&Address>) -> &mut Self {
        match address {
            Some(address) => self.push(address),
            None => self.push_empty(),
        }
    }

    /// Append an item that is already RLP-encoded (typically a nested list).
    pub fn push_raw(&mut self, encoded: &[u8]) -> &mut Self {
        self.payload.extend_from_slice(encoded);
        self
    }

    /// Encode the list header followed by the collected items.
    pub fn finish(&self) -> Vec<u8> {
        let header = Header {
            list: true,
            payload_length: self.payload.len(),
        };
        let mut out = Vec::with_capacity(header.length() + self.payload.len());
        header.encode(&mut out);
        out.extend_from_slice(&self.payload);
        out
    }
}

/// Sequential reader over the items of one RLP list.
#[derive(Clone, Debug)]
pub struct FieldReader<'a> {
    items: Vec<&'a [u8]>,
    cursor: usize,
}

impl<'a> FieldReader<'a> {
    /// Split `input`, which must hold exactly one RLP list, into its items.
    pub fn new(input: &'a [u8]) -> Result<Self, FieldError> {
        Self::for_field(input, "list")
    }

    fn for_field(input: &'a [u8], field: &'static str) -> Result<Self, FieldError> {
        let mut buf = input;
        let header = Header::decode(&mut buf).map_err(|error| FieldError::Rlp { field, error })?;
        if !header.list {
            return Err(FieldError::NotAList(field));
        }
        let payload = buf
            .get(..header.payload_length)
            .ok_or(FieldError::Rlp {
                field,
                error: alloy_rlp::Error::InputTooShort,
            })?;
        let trailing = buf.len() - payload.len();
        if trailing != 0 {
            return Err(FieldError::TrailingBytes(trailing));
        }

        Ok(Self {
            items: split_items(payload, field)?,
            cursor: 0,
        })
    }

    /// Total number of items in the list.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of items not yet read.
    pub fn remaining(&self) -> usize {
        self.items.len() - self.cursor
    }

    /// Take the next item as raw RLP.
    pub fn next_raw(&mut self, field: &'static str) -> Result<&'a [u8], FieldError> {
        let item = self
            .items
            .get(self.cursor)
            .copied()
            .ok_or(FieldError::Missing(field))?;
        self.cursor += 1;
        Ok(item)
    }

    /// Decode the next item as `T`, requiring the item to be fully consumed.
    pub fn next<T: Decodable>(&mut self, field: &'static str) -> Result<T, FieldError> {
        let mut item = self.next_raw(field)?;
        let value = T::decode(&mut item).map_err(|error| FieldError::Rlp { field, error })?;
        if !item.is_empty() {
            return Err(FieldError::Rlp {
                field,
                error: alloy_rlp::Error::UnexpectedLength,
            });
        }
        Ok(value)
    }

    /// Decode the next item as a byte string, borrowing its payload.
    pub fn next_bytes(&mut self, field: &'static str) -> Result<&'a [u8], FieldError> {
        let mut item = self.next_raw(field)?;
        let bytes =
            Header::decode_bytes(&mut item, false).map_err(|error| FieldError::Rlp { field, error })?;
        if !item.is_empty() {
            return Err(FieldError::Rlp {
                field,
                error: alloy_rlp::Error::UnexpectedLength,
            });
        }
        Ok(bytes)
    }

    /// Decode the next item as an address, where the empty string means none.
    pub fn next_optional_address(
        &mut self,
        field: &'static str,
    ) -> Result<Option<Address>, FieldError> {
        let item = self.next_raw(field)?;
        if item == [EMPTY_STRING_CODE] {
            return Ok(None);
        }
        let mut buf = item;
        let address = Address::decode(&mut buf).map_err(|error| FieldError::Rlp { field, error })?;
        if !buf.is_empty() {
            return Err(FieldError::Rlp {
                field,
                error: alloy_rlp::Error::UnexpectedLength,
            });
        }
        Ok(Some(address))
    }

    /// Require every item to have been read.
    pub fn finish(&self) -> Result<(), FieldError> {
        match self.remaining() {
            0 => Ok(()),
            extra => Err(FieldError::ExtraItems(extra)),
        }
    }

    /// Open the next item as a nested list.
    pub fn next_list(&mut self, field: &'static str) -> Result<FieldReader<'a>, FieldError> {
        let item = self.next_raw(field)?;
        FieldReader::for_field(item, field)
    }
}

fn split_items<'a>(mut payload: &'a [u8], field: &'static str) -> Result<Vec<&'a [u8]>, FieldError> {
    let mut items = Vec::new();
    while !payload.is_empty() {
        let mut cursor = payload;
        let header = Header::decode(&mut cursor).map_err(|error| FieldError::Rlp { field, error })?;
        let total = (payload.len() - cursor.len()) + header.payload_length;
        let item = payload.get(..total).ok_or(FieldError::Rlp {
            field,
            error: alloy_rlp::Error::InputTooShort,
        })?;
        items.push(item);
        payload = payload.get(total..).unwrap_or_default();
    }
    Ok(items)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use alloy_primitives::U256;

    #[test]
    fn test_list_builder_matches_alloy_rlp() {
        // ["cat", "dog"]
        let mut list = RlpList::new();
        list.push_bytes(b"cat").push_bytes(b"dog");
        assert_eq!(
            list.finish(),
            vec![0xc8, 0x83, b'c', b'a', b't', 0x83, b'd', b'o', b'g']
        );

        assert_eq!(RlpList::new().finish(), vec![0xc0]);
    }

    #[test]
    fn test_integers_are_minimal() {
        let mut list = RlpList::new();
        list.push(&0u64).push(&15u64).push(&1024u64).push(&U256::ZERO);
        assert_eq!(list.finish(), vec![0xc6, 0x80, 0x0f, 0x82, 0x04, 0x00, 0x80]);
    }

    #[test]
    fn test_reader_walks_fields_in_order() {
        let mut list = RlpList::new();
        list.push(&7u64)
            .push_optional_address(None)
            .push(&Address::repeat_byte(0x11))
            .push_raw(&RlpList::new().finish());
        let encoded = list.finish();

        let mut reader = FieldReader::new(&encoded).unwrap();
        assert_eq!(reader.len(), 4);
        assert_eq!(reader.next::<u64>("nonce").unwrap(), 7);
        assert_eq!(reader.next_optional_address("to").unwrap(), None);
        assert_eq!(
            reader.next_optional_address("from").unwrap(),
            Some(Address::repeat_byte(0x11))
        );
        assert!(reader.next_list("signatures").unwrap().is_empty());
        assert_eq!(reader.remaining(), 0);
        assert_eq!(
            reader.next::<u64>("extra").unwrap_err(),
            FieldError::Missing("extra")
        );
    }

    #[test]
    fn test_reader_rejects_trailing_bytes() {
        let mut encoded = RlpList::new().push(&1u64).finish();
        encoded.push(0x01);
        assert_eq!(
            FieldReader::new(&encoded).unwrap_err(),
            FieldError::TrailingBytes(1)
        );
    }

    #[test]
    fn test_reader_rejects_string_input() {
        let encoded = vec![0x83, b'c', b'a', b't'];
        assert_eq!(
            FieldReader::new(&encoded).unwrap_err(),
            FieldError::NotAList("list")
        );
    }

    #[test]
    fn test_reader_rejects_leading_zero_integer() {
        // [0x0001] as a two-byte integer is not canonical.
        let encoded = vec![0xc3, 0x82, 0x00, 0x01];
        let mut reader = FieldReader::new(&encoded).unwrap();
        assert!(matches!(
            reader.next::<u64>("gas"),
            Err(FieldError::Rlp { field: "gas", .. })
        ));
    }

    #[test]
    fn test_reader_rejects_truncated_item() {
        // Outer list claims 3 bytes, inner string claims 5.
        let encoded = vec![0xc3, 0x85, 0x01, 0x02];
        assert!(FieldReader::new(&encoded).is_err());
    }
}
