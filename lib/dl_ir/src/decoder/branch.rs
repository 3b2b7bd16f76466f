//! Conditional and unconditional jumps.

use super::{Handler, LiftContext};
use crate::errors::IrResult;
use crate::ir::{CmpOp, Condition, Constant, Stmt, Value, ValueBox};
use crate::typing::{ConstraintCollector, RegType};
use dl_bytecode::instrs::{Instr, LabeledInstr};

/// One flavor of conditional jump, as lifted by [`JumpHandler`].
pub trait ConditionalJump: Sync {
    /// Decodes the condition of `instr` and its branch offset.
    fn condition(&self, instr: &LabeledInstr, cx: &mut LiftContext) -> IrResult<(Condition, i32)>;

    /// Records what comparing `lhs` and `rhs` with `op` tells about their
    /// types.
    fn constrain(
        &self,
        op: CmpOp,
        lhs: ValueBox,
        rhs: ValueBox,
        typer: &mut ConstraintCollector,
    );
}

/// Lifts conditional jumps into `if` statements, delegating the decoding
/// of the condition to `J`.
pub struct JumpHandler<J>(pub J);

impl<J: ConditionalJump> Handler for JumpHandler<J> {
    fn lift(&self, instr: &LabeledInstr, cx: &mut LiftContext) -> IrResult<()> {
        let (cond, offset) = self.0.condition(instr, cx)?;
        let op = cond.op;
        let target = cx.placeholder(offset)?;
        let id = cx.push(instr, Stmt::If { cond, target });
        if let Some(typer) = cx.typer() {
            self.0
                .constrain(op, ValueBox::new(id, 0), ValueBox::new(id, 1), typer);
        }
        Ok(())
    }
}

/// Comparison of two registers.
pub struct IfTest;

impl ConditionalJump for IfTest {
    fn condition(&self, instr: &LabeledInstr, cx: &mut LiftContext) -> IrResult<(Condition, i32)> {
        let (op, lhs, rhs, offset) = match *instr.instr() {
            Instr::IfEq(a, b, off) => (CmpOp::Eq, a, b, off),
            Instr::IfNe(a, b, off) => (CmpOp::Ne, a, b, off),
            Instr::IfLt(a, b, off) => (CmpOp::Lt, a, b, off),
            Instr::IfGe(a, b, off) => (CmpOp::Ge, a, b, off),
            Instr::IfGt(a, b, off) => (CmpOp::Gt, a, b, off),
            Instr::IfLe(a, b, off) => (CmpOp::Le, a, b, off),
            _ => return Err(cx.bad_format(instr, "not a two registers test")),
        };
        let cond = Condition {
            op,
            lhs: Value::Local(cx.local(lhs)?),
            rhs: Value::Local(cx.local(rhs)?),
        };
        Ok((cond, i32::from(offset)))
    }

    fn constrain(
        &self,
        op: CmpOp,
        lhs: ValueBox,
        rhs: ValueBox,
        typer: &mut ConstraintCollector,
    ) {
        typer.constrain(lhs, rhs);
        if op.is_ordering() {
            typer.seed(lhs, RegType::Integral);
            typer.seed(rhs, RegType::Integral);
        }
    }
}

/// Comparison of a register with zero (or null).
pub struct IfTestZ;

impl ConditionalJump for IfTestZ {
    fn condition(&self, instr: &LabeledInstr, cx: &mut LiftContext) -> IrResult<(Condition, i32)> {
        let (op, lhs, offset) = match *instr.instr() {
            Instr::IfEqz(a, off) => (CmpOp::Eq, a, off),
            Instr::IfNez(a, off) => (CmpOp::Ne, a, off),
            Instr::IfLtz(a, off) => (CmpOp::Lt, a, off),
            Instr::IfGez(a, off) => (CmpOp::Ge, a, off),
            Instr::IfGtz(a, off) => (CmpOp::Gt, a, off),
            Instr::IfLez(a, off) => (CmpOp::Le, a, off),
            _ => return Err(cx.bad_format(instr, "not a test against zero")),
        };
        let cond = Condition {
            op,
            lhs: Value::Local(cx.local(lhs)?),
            rhs: Value::Const(Constant::Int(0)),
        };
        Ok((cond, i32::from(offset)))
    }

    fn constrain(
        &self,
        op: CmpOp,
        lhs: ValueBox,
        _rhs: ValueBox,
        typer: &mut ConstraintCollector,
    ) {
        let hint = if op.is_ordering() {
            RegType::Integral
        } else {
            RegType::Zero
        };
        typer.seed(lhs, hint);
    }
}

pub struct GotoHandler;

impl Handler for GotoHandler {
    fn lift(&self, instr: &LabeledInstr, cx: &mut LiftContext) -> IrResult<()> {
        let offset = match *instr.instr() {
            Instr::Goto(off) => i32::from(off),
            Instr::Goto16(off) => i32::from(off),
            Instr::Goto32(off) => off,
            _ => return Err(cx.bad_format(instr, "not a goto")),
        };
        let target = cx.placeholder(offset)?;
        cx.push(instr, Stmt::Goto(target));
        Ok(())
    }
}
