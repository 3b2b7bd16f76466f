//! Little-endian and LEB128 writers used by the bytecode assembler.
//!
//! Every writer returns the number of bytes written.

use crate::leb::{Sleb128, Uleb128};
use std::io::{Result, Write};

pub fn bytes<W: Write>(output: &mut W, bytes: &[u8]) -> Result<usize> {
    output.write_all(bytes)?;
    Ok(bytes.len())
}

macro_rules! le_writers {
    ($($name:ident: $ty:ty),* $(,)?) => {
        $(
            #[doc = concat!("Writes a little-endian `", stringify!($ty), "`.")]
            pub fn $name<W: Write>(output: &mut W, v: $ty) -> Result<usize> {
                bytes(output, &v.to_le_bytes())
            }
        )*
    };
}

le_writers!(
    le_u8: u8,
    le_i8: i8,
    le_u16: u16,
    le_i16: i16,
    le_u32: u32,
    le_i32: i32,
    le_i64: i64,
);

/// Writes an unsigned LEB128 value: 7 bits per byte, low groups first,
/// the high bit set on every byte but the last.
#[allow(clippy::cast_possible_truncation)]
pub fn uleb128<W: Write>(output: &mut W, val: Uleb128) -> Result<usize> {
    let mut v = val.value();
    let mut encoded = Vec::with_capacity(5);
    loop {
        let group = (v & 0x7f) as u8;
        v >>= 7;
        if v == 0 {
            encoded.push(group);
            break;
        }
        encoded.push(group | 0x80);
    }
    bytes(output, &encoded)
}

/// Writes a signed LEB128 value. Encoding stops once the remaining bits
/// are all copies of the sign bit of the last group.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn sleb128<W: Write>(output: &mut W, val: Sleb128) -> Result<usize> {
    let mut v = val.value();
    let mut encoded = Vec::with_capacity(5);
    loop {
        let group = (v & 0x7f) as u8;
        v >>= 7;
        let sign_set = group & 0x40 != 0;
        if (v == 0 && !sign_set) || (v == -1 && sign_set) {
            encoded.push(group);
            break;
        }
        encoded.push(group | 0x80);
    }
    bytes(output, &encoded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_width() {
        let mut buf = Vec::new();
        assert_eq!(le_u8(&mut buf, 0xab).ok(), Some(1));
        assert_eq!(le_i16(&mut buf, -2).ok(), Some(2));
        assert_eq!(le_u32(&mut buf, 0xdead_beef).ok(), Some(4));
        assert_eq!(le_i64(&mut buf, -1).ok(), Some(8));
        assert_eq!(
            buf,
            vec![0xab, 0xfe, 0xff, 0xef, 0xbe, 0xad, 0xde, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff]
        );
    }

    #[test]
    fn unsigned_leb() {
        let cases: [(u32, &[u8]); 4] = [
            (0, &[0x00]),
            (0x7f, &[0x7f]),
            (0x80, &[0x80, 0x01]),
            (624_485, &[0xe5, 0x8e, 0x26]),
        ];
        for (value, expected) in cases {
            let mut buf = Vec::new();
            assert_eq!(uleb128(&mut buf, Uleb128::new(value)).ok(), Some(expected.len()));
            assert_eq!(buf, expected, "{value}");
        }
    }

    #[test]
    fn signed_leb() {
        let cases: [(i32, &[u8]); 5] = [
            (0, &[0x00]),
            (-1, &[0x7f]),
            (63, &[0x3f]),
            (64, &[0xc0, 0x00]),
            (-123_456, &[0xc0, 0xbb, 0x78]),
        ];
        for (value, expected) in cases {
            let mut buf = Vec::new();
            assert_eq!(sleb128(&mut buf, Sleb128::new(value)).ok(), Some(expected.len()));
            assert_eq!(buf, expected, "{value}");
        }
    }
}
