use super::{use_hint, Handler, LiftContext};
use crate::errors::IrResult;
use crate::ir::{Stmt, Value, ValueBox};
use crate::typing::RegType;
use dl_bytecode::instrs::{Instr, LabeledInstr};
use dl_bytecode::types::Type;

/// Returns, checked against the method return type.
pub struct ReturnHandler;

impl Handler for ReturnHandler {
    fn lift(&self, instr: &LabeledInstr, cx: &mut LiftContext) -> IrResult<()> {
        let ret = &cx.method().method.proto.ret;
        let (reg, fits) = match *instr.instr() {
            Instr::ReturnVoid => {
                if *ret != Type::Void {
                    return Err(cx.bad_format(instr, format!("method returns {ret}")));
                }
                cx.push(instr, Stmt::ReturnVoid);
                return Ok(());
            }
            Instr::Return(reg) => (reg, ret.is_int_like() || *ret == Type::Float),
            Instr::ReturnWide(reg) => (reg, ret.is_wide()),
            Instr::ReturnObject(reg) => (reg, ret.is_reference()),
            _ => return Err(cx.bad_format(instr, "not a return")),
        };
        if !fits {
            return Err(cx.bad_format(instr, format!("method returns {ret}")));
        }
        let local = cx.sized(reg, ret)?;
        let id = cx.push(instr, Stmt::Return(Value::Local(local)));
        cx.seed(ValueBox::new(id, 0), use_hint(ret));
        Ok(())
    }
}

pub struct ThrowHandler;

impl Handler for ThrowHandler {
    fn lift(&self, instr: &LabeledInstr, cx: &mut LiftContext) -> IrResult<()> {
        let Instr::Throw(reg) = *instr.instr() else {
            return Err(cx.bad_format(instr, "not a throw"));
        };
        let local = cx.local(reg)?;
        let id = cx.push(instr, Stmt::Throw(Value::Local(local)));
        cx.seed(ValueBox::new(id, 0), RegType::Reference);
        Ok(())
    }
}
