//! Method code items: registers header, instructions and exception ranges.

use crate::errors::{BytecodeError, BytecodeResult};
use crate::instrs::{Instruction, LabeledInstr};
use crate::pools::{Index, TypeId};
use crate::parsers::parse_instructions;
use crate::Addr;

/// The code of a concrete method.
#[derive(Debug, Clone, PartialEq)]
pub struct Code {
    /// Number of registers used by the method.
    pub registers_size: u16,
    /// Number of words of incoming arguments, held in the last registers.
    pub ins_size: u16,
    /// Number of words of outgoing argument space.
    pub outs_size: u16,
    pub insns: Vec<LabeledInstr>,
    pub tries: Vec<TryItem>,
}

/// A range of instructions covered by a catch handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TryItem {
    pub start: Addr,
    /// Length of the range in code units.
    pub count: usize,
    pub handler: CatchHandler,
}

impl TryItem {
    #[must_use]
    pub const fn end(&self) -> Addr {
        self.start.after(self.count)
    }

    #[must_use]
    pub fn covers(&self, addr: Addr) -> bool {
        self.start <= addr && addr < self.end()
    }
}

/// Catch clauses in order, with an optional catch-all clause.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CatchHandler {
    pub catches: Vec<(Index<TypeId>, Addr)>,
    pub catch_all: Option<Addr>,
}

impl CatchHandler {
    /// Handler addresses, in clause order.
    pub fn targets(&self) -> impl Iterator<Item = Addr> + '_ {
        self.catches
            .iter()
            .map(|(_, addr)| *addr)
            .chain(self.catch_all)
    }
}

impl Code {
    /// Builds a code item from little-endian 16-bit code units.
    pub fn from_units(
        registers_size: u16,
        ins_size: u16,
        outs_size: u16,
        units: &[u16],
        tries: Vec<TryItem>,
    ) -> BytecodeResult<Self> {
        if ins_size > registers_size {
            return Err(BytecodeError::Structure(format!(
                "{ins_size} incoming words do not fit in {registers_size} registers"
            )));
        }
        let bytes: Vec<u8> = units.iter().flat_map(|u| u.to_le_bytes()).collect();
        Ok(Self {
            registers_size,
            ins_size,
            outs_size,
            insns: parse_instructions(&bytes)?,
            tries,
        })
    }

    /// Size of the instructions array in code units.
    #[must_use]
    pub fn insns_size(&self) -> usize {
        self.insns.last().map_or(0, |last| last.addr.0 + last.instr.size())
    }

    /// Returns the instruction located exactly at `addr`.
    pub fn instruction_at(&self, addr: Addr) -> BytecodeResult<&LabeledInstr> {
        self.insns
            .binary_search_by_key(&addr, LabeledInstr::addr)
            .map(|i| &self.insns[i])
            .map_err(|_| BytecodeError::InstructionNotFound(addr))
    }

    /// Iterates over the instructions in address order.
    pub fn iter_instructions(&self) -> impl Iterator<Item = &LabeledInstr> {
        self.insns.iter()
    }

    /// First register holding incoming arguments.
    #[must_use]
    pub const fn first_in_register(&self) -> u16 {
        self.registers_size.saturating_sub(self.ins_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instrs::Instr;
    use crate::registers::Reg;

    #[test]
    fn instruction_lookup() {
        // const/16 v0, #5 ; return v0
        let code = Code::from_units(1, 0, 0, &[0x0013, 0x0005, 0x000f], Vec::new()).unwrap();
        assert_eq!(code.insns_size(), 3);
        assert_eq!(
            code.instruction_at(Addr(2)).map(|i| i.instr.clone()).ok(),
            Some(Instr::Return(Reg::from(0u8)))
        );
        assert!(matches!(
            code.instruction_at(Addr(1)),
            Err(BytecodeError::InstructionNotFound(Addr(1)))
        ));
    }

    #[test]
    fn bad_header() {
        assert!(Code::from_units(1, 2, 0, &[0x000e], Vec::new()).is_err());
    }

    #[test]
    fn try_ranges() {
        let item = TryItem {
            start: Addr(2),
            count: 3,
            handler: CatchHandler {
                catches: vec![(Index::new(0), Addr(8))],
                catch_all: Some(Addr(10)),
            },
        };
        assert!(item.covers(Addr(4)));
        assert!(!item.covers(Addr(5)));
        assert_eq!(item.handler.targets().collect::<Vec<_>>(), vec![Addr(8), Addr(10)]);
    }
}
