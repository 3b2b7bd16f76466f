use super::{Handler, LiftContext};
use crate::errors::IrResult;
use crate::ir::{Stmt, Value, ValueBox};
use crate::typing::RegType;
use dl_bytecode::instrs::{Instr, LabeledInstr};

pub struct MonitorHandler;

impl Handler for MonitorHandler {
    fn lift(&self, instr: &LabeledInstr, cx: &mut LiftContext) -> IrResult<()> {
        let stmt = match *instr.instr() {
            Instr::MonitorEnter(reg) => Stmt::EnterMonitor(Value::Local(cx.local(reg)?)),
            Instr::MonitorExit(reg) => Stmt::ExitMonitor(Value::Local(cx.local(reg)?)),
            _ => return Err(cx.bad_format(instr, "not a monitor instruction")),
        };
        let id = cx.push(instr, stmt);
        cx.seed(ValueBox::new(id, 0), RegType::Reference);
        Ok(())
    }
}
