//! Code address representation.
//!
//! Addresses are counted in 16-bit code units from the start of a method
//! instructions array.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Addr(pub usize);

impl Addr {
    #[inline]
    #[must_use]
    pub const fn entry() -> Self {
        Self(0)
    }

    /// Returns the address located `offset` code units away, or `None` when
    /// it would fall before the method entry.
    #[must_use]
    pub const fn offset_by(self, offset: i32) -> Option<Self> {
        if offset.is_negative() {
            match self.0.checked_sub(offset.unsigned_abs() as usize) {
                Some(addr) => Some(Self(addr)),
                None => None,
            }
        } else {
            Some(Self(self.0 + offset.unsigned_abs() as usize))
        }
    }

    /// Returns the address following an instruction of `size` code units.
    #[inline]
    #[must_use]
    pub const fn after(self, size: usize) -> Self {
        Self(self.0 + size)
    }
}

impl fmt::Display for Addr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:04x}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets() {
        assert_eq!(Addr(10).offset_by(-4), Some(Addr(6)));
        assert_eq!(Addr(10).offset_by(5), Some(Addr(15)));
        assert_eq!(Addr(3).offset_by(-3), Some(Addr::entry()));
        assert_eq!(Addr(3).offset_by(-4), None);
    }

    #[test]
    fn display() {
        assert_eq!(Addr(0x2a).to_string(), "002a");
    }
}
