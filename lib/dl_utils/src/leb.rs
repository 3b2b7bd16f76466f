//! Variable length integers, as found in code items catch handlers.

/// Unsigned LEB128 value with its encoded size (in bytes).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Uleb128 {
    value: u32,
    size: usize,
}

impl Uleb128 {
    #[must_use]
    pub fn new(value: u32) -> Self {
        let size = if value == 0 {
            1
        } else {
            let nbits = 32 - value.leading_zeros() as usize;
            1 + ((nbits - 1) / 7)
        };
        Self { value, size }
    }

    #[must_use]
    pub const fn value(&self) -> u32 {
        self.value
    }

    #[must_use]
    pub const fn size(&self) -> usize {
        self.size
    }

    /// Decodes a value from the start of `input`, returning it with the
    /// number of consumed bytes. Returns `None` on truncated or overlong
    /// (more than 5 bytes) input.
    #[must_use]
    pub fn decode(input: &[u8]) -> Option<(Self, usize)> {
        let mut value: u32 = 0;
        for (i, byte) in input.iter().take(5).enumerate() {
            value |= u32::from(byte & 0x7f) << (7 * i);
            if byte & 0x80 == 0 {
                return Some((Self::new(value), i + 1));
            }
        }
        None
    }
}

/// Signed LEB128 value with its encoded size (in bytes).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sleb128 {
    value: i32,
    size: usize,
}

impl Sleb128 {
    #[must_use]
    pub fn new(value: i32) -> Self {
        let mut size = 1;
        let mut v = value;
        loop {
            let byte = v & 0x7f;
            v >>= 7;
            if (v == 0 && byte & 0x40 == 0) || (v == -1 && byte & 0x40 != 0) {
                break;
            }
            size += 1;
        }
        Self { value, size }
    }

    #[must_use]
    pub const fn value(&self) -> i32 {
        self.value
    }

    #[must_use]
    pub const fn size(&self) -> usize {
        self.size
    }

    /// Decodes a value from the start of `input`, returning it with the
    /// number of consumed bytes.
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub fn decode(input: &[u8]) -> Option<(Self, usize)> {
        let mut value: u32 = 0;
        for (i, byte) in input.iter().take(5).enumerate() {
            value |= u32::from(byte & 0x7f) << (7 * i);
            if byte & 0x80 == 0 {
                let shift = 7 * (i + 1);
                let value = if shift < 32 && byte & 0x40 != 0 {
                    (value | (u32::MAX << shift)) as i32
                } else {
                    value as i32
                };
                return Some((Self::new(value), i + 1));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uleb128_sizes() {
        assert_eq!(Uleb128::new(0).size(), 1);
        assert_eq!(Uleb128::new(127).size(), 1);
        assert_eq!(Uleb128::new(128).size(), 2);
        assert_eq!(Uleb128::new(u32::MAX).size(), 5);
    }

    #[test]
    fn uleb128_decode() {
        assert_eq!(Uleb128::decode(&[0x00]), Some((Uleb128::new(0), 1)));
        assert_eq!(Uleb128::decode(&[0x80, 0x7f]), Some((Uleb128::new(16256), 2)));
        assert_eq!(Uleb128::decode(&[0x80]), None);
    }

    #[test]
    fn sleb128_decode() {
        assert_eq!(Sleb128::decode(&[0x7f]).map(|(v, _)| v.value()), Some(-1));
        assert_eq!(Sleb128::decode(&[0x80, 0x7f]).map(|(v, _)| v.value()), Some(-128));
        assert_eq!(Sleb128::decode(&[0x3c]).map(|(v, _)| v.value()), Some(60));
        assert_eq!(Sleb128::new(-128).size(), 2);
        assert_eq!(Sleb128::new(63).size(), 1);
        assert_eq!(Sleb128::new(64).size(), 2);
    }
}
