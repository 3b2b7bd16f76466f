//! Mapping from virtual registers to body locals.

use crate::errors::{IrError, IrResult};
use crate::ir::{Local, LocalId};
use dl_bytecode::registers::Reg;
use dl_bytecode::Addr;
use std::collections::BTreeMap;

/// Hands out one local per register of a method, creating it on first
/// reference.
///
/// A wide value occupies a register pair and is named after its low
/// register; the high register must also fit in the frame.
#[derive(Debug)]
pub struct RegisterFile {
    registers_size: u16,
    locals: Vec<Local>,
    by_reg: BTreeMap<Reg, LocalId>,
}

impl RegisterFile {
    #[must_use]
    pub fn new(registers_size: u16) -> Self {
        Self {
            registers_size,
            locals: Vec::new(),
            by_reg: BTreeMap::new(),
        }
    }

    #[inline]
    #[must_use]
    pub const fn registers_size(&self) -> u16 {
        self.registers_size
    }

    fn check(&self, reg: Reg, addr: Addr) -> IrResult<()> {
        if reg.value() < self.registers_size {
            Ok(())
        } else {
            Err(IrError::RegisterOutOfBounds {
                addr,
                reg,
                registers_size: self.registers_size,
            })
        }
    }

    /// Returns the local of a single-slot register.
    pub fn local(&mut self, reg: Reg, addr: Addr) -> IrResult<LocalId> {
        self.check(reg, addr)?;
        Ok(self.get_or_create(reg))
    }

    /// Returns the local of a register pair starting at `reg`.
    pub fn wide(&mut self, reg: Reg, addr: Addr) -> IrResult<LocalId> {
        self.check(reg, addr)?;
        let high = reg.next().ok_or(IrError::RegisterOutOfBounds {
            addr,
            reg,
            registers_size: self.registers_size,
        })?;
        self.check(high, addr)?;
        Ok(self.get_or_create(reg))
    }

    /// Returns the local of a register sized after `slots` (1 or 2).
    pub fn sized(&mut self, reg: Reg, slots: usize, addr: Addr) -> IrResult<LocalId> {
        if slots == 2 {
            self.wide(reg, addr)
        } else {
            self.local(reg, addr)
        }
    }

    fn get_or_create(&mut self, reg: Reg) -> LocalId {
        if let Some(id) = self.by_reg.get(&reg) {
            return *id;
        }
        let id = LocalId(self.locals.len());
        self.locals.push(Local::new(reg));
        self.by_reg.insert(reg, id);
        id
    }

    #[must_use]
    pub fn into_locals(self) -> Vec<Local> {
        self.locals
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_register_same_local() {
        let mut regs = RegisterFile::new(4);
        let a = regs.local(Reg::from(2u8), Addr(0)).unwrap();
        let b = regs.local(Reg::from(1u8), Addr(1)).unwrap();
        let c = regs.wide(Reg::from(2u8), Addr(2)).unwrap();
        assert_eq!(a, c);
        assert_ne!(a, b);
        let locals = regs.into_locals();
        assert_eq!(locals.len(), 2);
        assert_eq!(locals[a.0].reg, Reg::from(2u8));
    }

    #[test]
    fn out_of_bounds() {
        let mut regs = RegisterFile::new(4);
        assert!(matches!(
            regs.local(Reg::from(4u8), Addr(3)),
            Err(IrError::RegisterOutOfBounds { addr: Addr(3), .. })
        ));
        assert!(regs.wide(Reg::from(2u8), Addr(0)).is_ok());
        assert!(matches!(
            regs.wide(Reg::from(3u8), Addr(0)),
            Err(IrError::RegisterOutOfBounds { reg, .. }) if reg == Reg::from(4u8)
        ));
        assert!(matches!(
            regs.sized(Reg::from(3u8), 2, Addr(0)),
            Err(IrError::RegisterOutOfBounds { .. })
        ));
    }
}
