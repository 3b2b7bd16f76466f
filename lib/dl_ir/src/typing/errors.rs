//! Typing errors definitions.

use dl_bytecode::registers::Reg;
use dl_bytecode::Addr;
use std::fmt;
use thiserror::Error;

/// An alias for result that can be a [`TypeError`].
pub type TypeResult<T> = Result<T, TypeError>;

/// A statement whose operand carries a conflicting type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConflictSite {
    pub addr: Addr,
    pub stmt: String,
    pub hint: String,
}

impl fmt::Display for ConflictSite {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} at {} ({})", self.hint, self.addr, self.stmt)
    }
}

/// The typing error type.
#[derive(Debug, Error)]
pub enum TypeError {
    #[error("type conflict: {first} is incompatible with {second}")]
    TypeConflict {
        first: ConflictSite,
        second: ConflictSite,
    },

    #[error("register {reg} is read at {addr} but never written before")]
    UndefinedRegister { addr: Addr, reg: Reg },

    #[error("no type can be inferred for {0}")]
    Untypable(String),
}
