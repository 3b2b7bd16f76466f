//! Bytecode errors definitions.

use crate::Addr;
use std::{fmt, io};
use thiserror::Error;

/// An alias for result that can be a [`BytecodeError`].
pub type BytecodeResult<T> = Result<T, BytecodeError>;

/// The bytecode error type.
#[derive(Debug, Error)]
pub enum BytecodeError {
    /// Error that can be returned when doing [I/O](std::io) operations.
    #[error("IO error: {0}")]
    IO(#[from] io::Error),

    /// Error that can be returned when formatting instructions.
    #[error("Formatting error: {0}")]
    Fmt(#[from] fmt::Error),

    /// Error that can be returned at parsing, with the remaining input.
    #[error("parsing error ({1:?}, {} bytes left)", .0.len())]
    Parsing(Vec<u8>, nom::error::ErrorKind),

    #[error("unknown opcode 0x{0:02x}")]
    UnknownOpcode(u8),

    #[error("code structure is invalid: {0}")]
    Structure(String),

    #[error("invalid type descriptor {0:?}")]
    InvalidDescriptor(String),

    #[error("instruction not found (address: {0})")]
    InstructionNotFound(Addr),

    #[error("bad payload at {addr}: expected {expected}")]
    BadPayload { addr: Addr, expected: &'static str },

    #[error("{kind} index {index} is out of the pool")]
    IndexOutOfPool { kind: &'static str, index: usize },
}

impl nom::error::ParseError<&[u8]> for BytecodeError {
    fn from_error_kind(input: &[u8], kind: nom::error::ErrorKind) -> Self {
        Self::Parsing(input.to_vec(), kind)
    }

    fn append(_: &[u8], _: nom::error::ErrorKind, other: Self) -> Self {
        other
    }
}

impl nom::error::ParseError<(&[u8], usize)> for BytecodeError {
    fn from_error_kind(input: (&[u8], usize), kind: nom::error::ErrorKind) -> Self {
        Self::Parsing(input.0.to_vec(), kind)
    }

    fn append(_: (&[u8], usize), _: nom::error::ErrorKind, other: Self) -> Self {
        other
    }
}

impl nom::ErrorConvert<Self> for BytecodeError {
    fn convert(self) -> Self {
        self
    }
}

impl From<nom::Err<Self>> for BytecodeError {
    fn from(err: nom::Err<Self>) -> Self {
        match err {
            nom::Err::Incomplete(_) => Self::Parsing(Vec::new(), nom::error::ErrorKind::Complete),
            nom::Err::Error(e) | nom::Err::Failure(e) => e,
        }
    }
}
