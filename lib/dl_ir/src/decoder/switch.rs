use super::{Handler, LiftContext};
use crate::errors::IrResult;
use crate::ir::{Stmt, Value, ValueBox};
use crate::typing::RegType;
use dl_bytecode::instrs::{Instr, Instruction, LabeledInstr};

/// Packed and sparse switches, reading their payload.
pub struct SwitchHandler;

impl Handler for SwitchHandler {
    fn lift(&self, instr: &LabeledInstr, cx: &mut LiftContext) -> IrResult<()> {
        let (reg, offset, packed) = match *instr.instr() {
            Instr::PackedSwitch(reg, off) => (reg, off, true),
            Instr::SparseSwitch(reg, off) => (reg, off, false),
            _ => return Err(cx.bad_format(instr, "not a switch")),
        };
        let payload_addr = instr
            .addr
            .offset_by(offset)
            .ok_or_else(|| cx.bad_format(instr, "payload before method entry"))?;
        let payload = cx
            .code()
            .instruction_at(payload_addr)
            .map_err(|_| cx.bad_format(instr, format!("no payload at {payload_addr}")))?;

        let table: Vec<(i32, i32)> = match (&payload.instr, packed) {
            (Instr::PackedSwitchPayload { first_key, targets }, true) => targets
                .iter()
                .zip(0..)
                .map(|(target, i)| (first_key.wrapping_add(i), *target))
                .collect(),
            (Instr::SparseSwitchPayload { keys, targets }, false) if keys.len() == targets.len() => {
                keys.iter().copied().zip(targets.iter().copied()).collect()
            }
            (other, _) => {
                return Err(cx.bad_format(
                    instr,
                    format!("unexpected {} at {payload_addr}", other.mnemonic()),
                ))
            }
        };

        let key = cx.local(reg)?;
        let mut cases = Vec::with_capacity(table.len());
        for (value, target) in table {
            cases.push((value, cx.placeholder(target)?));
        }
        let default = cx.fallthrough(instr);
        let id = cx.push(
            instr,
            Stmt::Switch {
                key: Value::Local(key),
                cases,
                default,
            },
        );
        cx.seed(ValueBox::new(id, 0), RegType::Integral);
        Ok(())
    }
}
