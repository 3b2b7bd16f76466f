//! Type inference of body locals.
//!
//! While decoding, handlers record [constraints](Constraint) (two operand
//! positions hold values of the same type) and [seeds](Seed) (statically
//! known type hints). Once the body is linked, the solver groups
//! definitions and uses of each register into webs, propagates hints
//! between constrained webs, and assigns a type to every local.

pub mod constraints;
pub mod errors;
pub mod solver;
pub mod types;
pub mod webs;

pub use constraints::{Constraint, ConstraintCollector, Seed};
pub use types::RegType;

use crate::controlflow::StmtGraph;
use crate::errors::IrResult;
use crate::ir::{Body, LocalId};
use crate::repo::SymbolTable;
use dl_bytecode::types::Type;
use std::collections::BTreeMap;

/// Solved local types.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeAssignment(BTreeMap<LocalId, Type>);

impl TypeAssignment {
    #[must_use]
    pub fn get(&self, local: LocalId) -> Option<&Type> {
        self.0.get(&local)
    }

    pub(crate) fn insert(&mut self, local: LocalId, ty: Type) {
        self.0.insert(local, ty);
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (&LocalId, &Type)> {
        self.0.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Solves the types of a linked body from the constraints collected while
/// decoding it.
///
/// Statements unreachable from the entry are removed first: nothing flows
/// into them, so their operands cannot be typed.
pub fn solve(
    body: &mut Body,
    mut collector: ConstraintCollector,
    symbols: &dyn SymbolTable,
) -> IrResult<()> {
    let reachable = StmtGraph::build(body).reachable();
    let removed = reachable.iter().filter(|reached| !**reached).count();
    if removed > 0 {
        log::debug!("{}: {removed} unreachable statements removed", body.method);
        let remap = body.retain_stmts(&reachable);
        collector.renumber(&remap);
    }
    solver::solve(body, collector, symbols)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::ir::{LocalId, Stmt};
    use crate::lift_method;
    use crate::testing::{pools, static_method};
    use crate::unit::LiftOptions;
    use dl_bytecode::instrs::Instr;
    use dl_bytecode::registers::Reg;
    use dl_bytecode::types::Type;

    #[test]
    fn unreachable_code_is_removed() {
        // parameters in v1 and v2, v0 only read after the return
        let method = static_method(
            "(II)V",
            3,
            &[
                Instr::ReturnVoid,
                Instr::IfEq(Reg::from(0u8), Reg::from(1u8), -1),
            ],
        );
        let body = lift_method(&method, &pools(), LiftOptions::default()).unwrap();
        assert_eq!(body.stmts.len(), 3);
        assert!(matches!(body.stmts[2], Stmt::ReturnVoid));
        let names: Vec<String> = body.locals.iter().map(ToString::to_string).collect();
        assert_eq!(names, vec!["v1", "v2"]);
        assert_eq!(body.type_of(LocalId(0)), Some(&Type::Int));
        assert_eq!(body.type_of(LocalId(1)), Some(&Type::Int));

        // decoding alone keeps them
        let body = lift_method(&method, &pools(), LiftOptions::new().without_typing()).unwrap();
        assert_eq!(body.stmts.len(), 4);
    }
}
