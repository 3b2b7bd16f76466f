//! Register VM bytecode data structures.
//!
//! This crate models the instruction stream of a method: [code
//! addresses](Addr), [registers](registers::Reg), the [instruction
//! set](instrs::Instr), the [code item](code::Code) holding a method
//! instructions and exception ranges, and the resolved [constant
//! pools](pools::Pools) instructions refer to. It provides `nom` parsers
//! from raw little-endian code units and the matching writers.

mod addr;
mod parsers;
mod writers;

pub mod code;
pub mod errors;
pub mod instrs;
pub mod pools;
pub mod registers;
pub mod types;

pub use crate::addr::Addr;
pub use crate::parsers::{parse_code, parse_instructions};
pub use crate::writers::{assemble, write_code, write_instr};

use crate::pools::Pools;
use std::fmt;

/// Printing of items whose operands need the constant pools to be resolved.
pub trait PrettyPrint {
    fn pretty_print(&self, f: &mut fmt::Formatter, pools: &Pools) -> fmt::Result;
}

/// [`Display`](fmt::Display) adapter for [`PrettyPrint`] items.
pub struct PrettyPrinter<'a, T>(pub &'a T, pub &'a Pools);

impl<'a, T: PrettyPrint> fmt::Display for PrettyPrinter<'a, T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.0.pretty_print(f, self.1)
    }
}
