//! This crate lifts register VM bytecode into a typed three-address
//! intermediate representation for the `DroidLift` project.
//!
//! Each method body is decoded instruction by instruction into [`ir`]
//! statements over register locals, branch targets are linked once the
//! whole body is built, and (optionally) the types of the locals are
//! inferred from the constraints collected while decoding.

pub mod builder;
pub mod controlflow;
pub mod decoder;
pub mod errors;
pub mod ir;
pub mod registers;
pub mod repo;
pub mod typing;
pub mod unit;

#[cfg(test)]
mod testing;

use crate::errors::IrResult;
use crate::ir::Body;
use crate::repo::{MethodDef, SymbolTable};
use crate::unit::LiftOptions;

/// Lifts a single method body, solving its types when enabled by
/// `options`.
pub fn lift_method(
    method: &MethodDef,
    symbols: &dyn SymbolTable,
    options: LiftOptions,
) -> IrResult<Body> {
    let (mut body, collector) = decoder::decode_method(method, symbols, options)?;
    if let Some(collector) = collector {
        typing::solve(&mut body, collector, symbols)?;
    }
    Ok(body)
}
