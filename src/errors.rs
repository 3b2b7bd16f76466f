//! Global error handling.
//!
//! Each sub-crate of the project defines its own type error.
//! Their types can be unified, for example in a main function,
//! when winding results at the top-level.
//!
//! ```rust
//! use droidlift::prelude::*;
//! use droidlift::unitfile;
//!
//! fn main() -> DlResult<()> { // can return a DlError
//!    let _repo = unitfile::load_str(r#"{"classes": []}"#)?; // can return an IrError
//!    Ok(())
//! }
//! ```

use dl_bytecode::errors::BytecodeError;
use dl_ir::errors::IrError;
use std::io;
use thiserror::Error;

/// An alias for result that can be a [`DlError`].
pub type DlResult<T> = Result<T, DlError>;

/// The main error type for error winding at the top-level.
/// It mainly consists of transparent wrapper over error types that
/// are defined in dependencies.
#[derive(Debug, Error)]
pub enum DlError {
    /// Custom error for reporting bad command line arguments usage.
    #[error("bad arguments: {0}")]
    BadArguments(String),

    /// Error that can be returned from [I/O operations](std::io).
    #[error(transparent)]
    IO(#[from] io::Error),

    /// Error that can be returned from regex compilation.
    #[error(transparent)]
    Regex(#[from] regex::Error),

    /// Error that can be returned while reading a unit file.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Unit file content that cannot be turned into classes.
    #[error("malformed unit file: {0}")]
    UnitFile(String),

    /// Error that can be returned from [`dl_bytecode`] functions.
    #[error(transparent)]
    Bytecode(#[from] BytecodeError),

    /// Error that can be returned from [`dl_ir`] functions.
    #[error(transparent)]
    Ir(#[from] IrError),
}
