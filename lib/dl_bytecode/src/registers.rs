//! Types definitions to address virtual registers.
//!
//! Registers (or register pairs, for wide values) are addressed on 4, 8 or
//! 16 bits depending on the instruction format. A [register](Reg) wraps a
//! 16 bits slot number, which also distinguishes registers from literals in
//! instruction definitions.
//!
//! Registers groups (explicit lists or consecutive ranges) used as invoke
//! arguments are defined here as well.

use serde::Serialize;
use std::{fmt, io};

/// The register type.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Reg(u16);

impl fmt::Display for Reg {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

impl From<u8> for Reg {
    fn from(r: u8) -> Self {
        Self(u16::from(r))
    }
}

impl From<u16> for Reg {
    fn from(r: u16) -> Self {
        Self(r)
    }
}

impl TryFrom<Reg> for u8 {
    type Error = io::Error;

    fn try_from(r: Reg) -> Result<Self, Self::Error> {
        Self::try_from(r.0).map_err(|_| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("register {r} cannot fit into u8"),
            )
        })
    }
}

impl From<Reg> for u16 {
    fn from(r: Reg) -> Self {
        r.0
    }
}

impl Reg {
    /// Returns the wrapped register slot number.
    #[inline]
    #[must_use]
    pub const fn value(self) -> u16 {
        self.0
    }

    /// Returns the following register, that is the high half of a pair
    /// starting at `self`. Returns `None` on slot overflow.
    #[inline]
    #[must_use]
    pub fn next(self) -> Option<Self> {
        self.0.checked_add(1).map(Self)
    }

    /// Checks whether the register fits in a 4-bit operand field.
    #[inline]
    #[must_use]
    pub const fn is_nibble(self) -> bool {
        self.0 < 16
    }
}

/// An explicit list of at most five registers, used for invoke arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RegList(Vec<Reg>);

impl fmt::Display for RegList {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{{")?;
        for (i, reg) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{reg}")?;
        }
        write!(f, "}}")
    }
}

impl<T> From<Vec<T>> for RegList
where
    Reg: From<T>,
{
    fn from(args: Vec<T>) -> Self {
        Self(args.into_iter().map(Reg::from).collect())
    }
}

impl RegList {
    /// Checks if the list contains no register.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns an iterator over the registers of the list.
    pub fn iter(&self) -> impl Iterator<Item = Reg> + '_ {
        self.0.iter().copied()
    }
}

/// A range of consecutive registers, `count` registers starting at `first`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RegRange {
    first: Reg,
    count: u8,
}

impl fmt::Display for RegRange {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.last() {
            Some(last) => write!(f, "{{{} .. {}}}", self.first, last),
            None => write!(f, "{{}}"),
        }
    }
}

impl RegRange {
    #[must_use]
    pub const fn new(first: Reg, count: u8) -> Self {
        Self { first, count }
    }

    /// Returns the first register of the range.
    #[inline]
    #[must_use]
    pub const fn first(&self) -> Reg {
        self.first
    }

    /// Returns the last register of the range, if not empty.
    #[must_use]
    pub fn last(&self) -> Option<Reg> {
        if self.count == 0 {
            None
        } else {
            self.first
                .value()
                .checked_add(u16::from(self.count) - 1)
                .map(Reg::from)
        }
    }

    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.count as usize
    }

    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Returns an iterator over the registers of the range. Registers that
    /// would overflow the 16 bits slot space are not produced.
    pub fn iter(&self) -> impl Iterator<Item = Reg> {
        let first = self.first.value();
        (0..u16::from(self.count)).filter_map(move |i| first.checked_add(i).map(Reg::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_iteration() {
        let range = RegRange::new(Reg::from(4u16), 3);
        let regs: Vec<Reg> = range.iter().collect();
        assert_eq!(regs, vec![Reg::from(4u16), Reg::from(5u16), Reg::from(6u16)]);
        assert_eq!(range.last(), Some(Reg::from(6u16)));
        assert_eq!(range.to_string(), "{v4 .. v6}");
    }

    #[test]
    fn empty_range() {
        let range = RegRange::new(Reg::from(4u16), 0);
        assert!(range.is_empty());
        assert_eq!(range.iter().count(), 0);
        assert_eq!(range.to_string(), "{}");
    }

    #[test]
    fn list_display() {
        let list = RegList::from(vec![1u8, 2u8]);
        assert_eq!(list.to_string(), "{v1, v2}");
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn register_narrowing() {
        assert_eq!(u8::try_from(Reg::from(255u16)).ok(), Some(255));
        assert!(u8::try_from(Reg::from(256u16)).is_err());
        assert_eq!(Reg::from(u16::MAX).next(), None);
    }
}
