//! Unsigned LEB128 varints.
//!
//! Seven value bits per byte, least significant group first, high bit set
//! on every byte but the last. Decoding checks the declared field width and
//! rejects over-long encodings, so every value has exactly one encoding.

use crate::error::CodecError;

/// Longest encoding of a `u64`.
pub const MAX_VARINT_LEN: usize = 10;

/// Appends the varint encoding of `value` to `out`.
pub fn write_varint(out: &mut Vec<u8>, mut value: u64) {
    loop {
        let group = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            out.push(group);
            return;
        }
        out.push(group | 0x80);
    }
}

/// Reads a varint that must fit in `width` bits.
///
/// Returns the value and the number of bytes consumed.
pub fn read_varint(input: &[u8], width: u32) -> Result<(u64, usize), CodecError> {
    debug_assert!(width > 0 && width <= 64);

    let mut value: u64 = 0;
    let mut shift: u32 = 0;

    for (i, &byte) in input.iter().enumerate() {
        if shift >= width {
            return Err(CodecError::VarintOverflow { width });
        }

        let group = u64::from(byte & 0x7f);
        if group.checked_shr(width - shift).unwrap_or(0) != 0 {
            return Err(CodecError::VarintOverflow { width });
        }
        value |= group << shift;

        if byte & 0x80 == 0 {
            if i > 0 && byte == 0 {
                return Err(CodecError::NonCanonicalVarint);
            }
            return Ok((value, i + 1));
        }
        shift += 7;
    }

    Err(CodecError::Truncated("varint"))
}
