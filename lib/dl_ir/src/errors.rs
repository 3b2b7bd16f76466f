//! Lifting errors definition.

use crate::typing::errors::TypeError;
use dl_bytecode::errors::BytecodeError;
use dl_bytecode::registers::Reg;
use dl_bytecode::Addr;
use regex::Error as RegexError;
use thiserror::Error;

pub type IrResult<T> = Result<T, IrError>;

#[derive(Debug, Error)]
pub enum IrError {
    #[error("bytecode error: {0}")]
    Bytecode(#[from] BytecodeError),

    #[error("regex error: {0}")]
    Regex(#[from] RegexError),

    /// An instruction operand does not make sense for the opcode being
    /// lifted.
    #[error("bad format at {addr} ({mnemonic}): {reason}")]
    BadFormat {
        addr: Addr,
        mnemonic: &'static str,
        reason: String,
    },

    #[error("register {reg} at {addr} is out of bounds (method uses {registers_size} registers)")]
    RegisterOutOfBounds {
        addr: Addr,
        reg: Reg,
        registers_size: u16,
    },

    #[error("arity mismatch at {addr}: expected {expected} register slots, found {found}")]
    ArityMismatch {
        addr: Addr,
        expected: usize,
        found: usize,
    },

    #[error("branch at {branch} to offset {offset:+} does not land on an instruction")]
    UnresolvedTarget { branch: Addr, offset: i64 },

    #[error("symbol not found: {expected} (candidates: [{}])", candidates.join(", "))]
    SymbolNotFound {
        expected: String,
        candidates: Vec<String>,
    },

    #[error("class mismatch: expected {expected} but found {found}")]
    ClassMismatch { expected: String, found: String },

    #[error("method {0} is abstract or native and cannot carry a body")]
    NonConcreteBody(String),

    #[error("method {0} has no implementation")]
    NoCode(String),

    #[error("method {0} already has a body")]
    DuplicateBody(String),

    #[error("typing error: {0}")]
    Typing(#[from] TypeError),
}

impl IrError {
    pub(crate) fn bad_format<S: Into<String>>(
        addr: Addr,
        mnemonic: &'static str,
        reason: S,
    ) -> Self {
        Self::BadFormat {
            addr,
            mnemonic,
            reason: reason.into(),
        }
    }
}
