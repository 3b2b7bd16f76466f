//! Numeric constants.

use super::{Handler, LiftContext};
use crate::errors::IrResult;
use crate::ir::{Constant, Expr, Place, Stmt, Value, ValueBox};
use crate::typing::RegType;
use dl_bytecode::instrs::{Instr, LabeledInstr};
use dl_bytecode::registers::Reg;

pub struct ConstHandler;

impl Handler for ConstHandler {
    fn lift(&self, instr: &LabeledInstr, cx: &mut LiftContext) -> IrResult<()> {
        match instr.instr() {
            Instr::Const4(reg, v) => narrow(instr, cx, *reg, i32::from(*v)),
            Instr::Const16(reg, v) => narrow(instr, cx, *reg, i32::from(*v)),
            Instr::Const(reg, v) => narrow(instr, cx, *reg, *v),
            Instr::ConstHigh16(reg, v) => narrow(instr, cx, *reg, i32::from(*v) << 16),
            Instr::ConstWide16(reg, v) => wide(instr, cx, *reg, i64::from(*v)),
            Instr::ConstWide32(reg, v) => wide(instr, cx, *reg, i64::from(*v)),
            Instr::ConstWide(reg, v) => wide(instr, cx, *reg, *v),
            Instr::ConstWideHigh16(reg, v) => wide(instr, cx, *reg, i64::from(*v) << 48),
            _ => Err(cx.bad_format(instr, "not a numeric constant")),
        }
    }
}

// A 32-bit literal may be an int-like or a float, zero may also be null.
fn narrow(instr: &LabeledInstr, cx: &mut LiftContext, reg: Reg, value: i32) -> IrResult<()> {
    let local = cx.local(reg)?;
    let id = cx.push(
        instr,
        Stmt::Assign {
            place: Place::Local(local),
            expr: Expr::Use(Value::Const(Constant::Int(value))),
        },
    );
    let hint = if value == 0 {
        RegType::Zero
    } else {
        RegType::Narrow
    };
    cx.seed(ValueBox::new(id, 1), hint);
    Ok(())
}

fn wide(instr: &LabeledInstr, cx: &mut LiftContext, reg: Reg, value: i64) -> IrResult<()> {
    let local = cx.wide(reg)?;
    let id = cx.push(
        instr,
        Stmt::Assign {
            place: Place::Local(local),
            expr: Expr::Use(Value::Const(Constant::Long(value))),
        },
    );
    cx.seed(ValueBox::new(id, 1), RegType::Wide);
    Ok(())
}
