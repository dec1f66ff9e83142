//! Canonical byte encoding of contract transactions.
//!
//! The layout is a consensus rule: two nodes must produce identical bytes
//! for the same transaction, or digests diverge. The building blocks are:
//!
//! - unsigned LEB128 varints for every integer ([`varint`]),
//! - a varint length prefix for byte strings and token symbols,
//! - a tagged union for identities (`1` = regid, `2` = address).
//!
//! [`Writer`] and [`Reader`] carry these primitives; [`Encode`] and
//! [`Decode`] are implemented by every field type, and [`tx`] composes them
//! into the per-variant layouts.

pub mod tx;
pub mod varint;

pub use tx::{decode, decode_framed, encode, encode_framed};

use crate::error::CodecError;

/// Types with a canonical encoding.
pub trait Encode {
    fn encode_to(&self, w: &mut Writer);
}

/// Types that decode from their canonical encoding.
pub trait Decode: Sized {
    fn decode_from(r: &mut Reader<'_>) -> Result<Self, CodecError>;
}

/// Append-only output buffer.
#[derive(Clone, Debug, Default)]
pub struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_varint(&mut self, value: u64) -> &mut Self {
        varint::write_varint(&mut self.buf, value);
        self
    }

    pub fn put_u8(&mut self, value: u8) -> &mut Self {
        self.buf.push(value);
        self
    }

    /// Appends bytes verbatim, without a length prefix.
    pub fn put_raw(&mut self, bytes: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(bytes);
        self
    }

    /// Appends a length-prefixed byte string.
    pub fn put_bytes(&mut self, bytes: &[u8]) -> &mut Self {
        self.put_varint(bytes.len() as u64);
        self.put_raw(bytes)
    }

    pub fn put<T: Encode + ?Sized>(&mut self, value: &T) -> &mut Self {
        value.encode_to(self);
        self
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

/// Cursor over an input slice.
///
/// Every read either consumes exactly the field it returns or fails; a
/// failed decode never yields a partially built value.
#[derive(Clone, Debug)]
pub struct Reader<'a> {
    input: &'a [u8],
}

impl<'a> Reader<'a> {
    pub fn new(input: &'a [u8]) -> Self {
        Self { input }
    }

    pub fn remaining(&self) -> usize {
        self.input.len()
    }

    fn read_varint(&mut self, width: u32) -> Result<u64, CodecError> {
        let (value, used) = varint::read_varint(self.input, width)?;
        self.input = &self.input[used..];
        Ok(value)
    }

    pub fn read_varint_u64(&mut self) -> Result<u64, CodecError> {
        self.read_varint(64)
    }

    pub fn read_varint_u32(&mut self) -> Result<u32, CodecError> {
        let v = self.read_varint(32)?;
        u32::try_from(v).map_err(|_| CodecError::VarintOverflow { width: 32 })
    }

    pub fn read_varint_u16(&mut self) -> Result<u16, CodecError> {
        let v = self.read_varint(16)?;
        u16::try_from(v).map_err(|_| CodecError::VarintOverflow { width: 16 })
    }

    pub fn read_u8(&mut self, what: &'static str) -> Result<u8, CodecError> {
        let (&first, rest) = self
            .input
            .split_first()
            .ok_or(CodecError::Truncated(what))?;
        self.input = rest;
        Ok(first)
    }

    /// Reads `N` bytes verbatim.
    pub fn read_array<const N: usize>(&mut self, what: &'static str) -> Result<[u8; N], CodecError> {
        if self.input.len() < N {
            return Err(CodecError::Truncated(what));
        }
        let (head, rest) = self.input.split_at(N);
        self.input = rest;
        let mut out = [0u8; N];
        out.copy_from_slice(head);
        Ok(out)
    }

    /// Reads a length-prefixed byte string.
    pub fn read_bytes(&mut self) -> Result<Vec<u8>, CodecError> {
        let len = self.read_varint_u64()?;
        let remaining = self.input.len();
        let n = usize::try_from(len)
            .ok()
            .filter(|n| *n <= remaining)
            .ok_or(CodecError::LengthOutOfBounds { len, remaining })?;
        let (head, rest) = self.input.split_at(n);
        self.input = rest;
        Ok(head.to_vec())
    }

    pub fn read<T: Decode>(&mut self) -> Result<T, CodecError> {
        T::decode_from(self)
    }

    /// Succeeds only if every input byte was consumed.
    pub fn finish(self) -> Result<(), CodecError> {
        if self.input.is_empty() {
            Ok(())
        } else {
            Err(CodecError::TrailingBytes(self.input.len()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes_are_length_prefixed() {
        let mut w = Writer::new();
        w.put_bytes(b"abc").put_varint(300);
        assert_eq!(w.as_bytes(), &[3, b'a', b'b', b'c', 0xac, 0x02]);

        let bytes = w.into_bytes();
        let mut r = Reader::new(&bytes);
        assert_eq!(r.read_bytes().expect("bytes"), b"abc".to_vec());
        assert_eq!(r.read_varint_u64().expect("varint"), 300);
        r.finish().expect("no trailing bytes");
    }

    #[test]
    fn length_prefix_past_end_is_rejected() {
        let mut r = Reader::new(&[5, 1, 2]);
        assert_eq!(
            r.read_bytes(),
            Err(CodecError::LengthOutOfBounds {
                len: 5,
                remaining: 2
            })
        );
    }

    #[test]
    fn trailing_bytes_are_reported() {
        let mut r = Reader::new(&[1, 2, 3]);
        assert_eq!(r.read_u8("tag").expect("byte"), 1);
        assert_eq!(r.finish(), Err(CodecError::TrailingBytes(2)));
    }

    #[test]
    fn short_array_is_truncated() {
        let mut r = Reader::new(&[1, 2]);
        assert_eq!(
            r.read_array::<4>("address"),
            Err(CodecError::Truncated("address"))
        );
    }
}
