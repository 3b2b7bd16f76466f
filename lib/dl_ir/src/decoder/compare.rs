use super::{Handler, LiftContext};
use crate::errors::IrResult;
use crate::ir::{CmpKind, Expr, Place, Stmt, Value, ValueBox};
use dl_bytecode::instrs::{Instr, LabeledInstr};
use dl_bytecode::types::Type;

/// Three-way comparisons of floats, doubles and longs.
pub struct CompareHandler;

impl Handler for CompareHandler {
    fn lift(&self, instr: &LabeledInstr, cx: &mut LiftContext) -> IrResult<()> {
        let (kind, ty, dst, lhs, rhs) = match *instr.instr() {
            Instr::CmplFloat(d, a, b) => (CmpKind::Cmpl, Type::Float, d, a, b),
            Instr::CmpgFloat(d, a, b) => (CmpKind::Cmpg, Type::Float, d, a, b),
            Instr::CmplDouble(d, a, b) => (CmpKind::Cmpl, Type::Double, d, a, b),
            Instr::CmpgDouble(d, a, b) => (CmpKind::Cmpg, Type::Double, d, a, b),
            Instr::CmpLong(d, a, b) => (CmpKind::Cmp, Type::Long, d, a, b),
            _ => return Err(cx.bad_format(instr, "not a comparison")),
        };
        let lhs = cx.sized(lhs, &ty)?;
        let rhs = cx.sized(rhs, &ty)?;
        let dst = cx.local(dst)?;
        let id = cx.push(
            instr,
            Stmt::Assign {
                place: Place::Local(dst),
                expr: Expr::Cmp(kind, Value::Local(lhs), Value::Local(rhs)),
            },
        );
        cx.seed(ValueBox::new(id, 0), &ty);
        cx.seed(ValueBox::new(id, 1), &ty);
        cx.seed(ValueBox::new(id, 2), Type::Int);
        Ok(())
    }
}
