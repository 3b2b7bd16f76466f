//! Register moves, result moves and caught exceptions.

use super::{Handler, LiftContext};
use crate::errors::IrResult;
use crate::ir::{Expr, IdentitySource, Place, Stmt, Value, ValueBox};
use crate::typing::types::{join, JAVA_LANG_OBJECT, JAVA_LANG_THROWABLE};
use crate::typing::RegType;
use dl_bytecode::instrs::{Instr, LabeledInstr};
use dl_bytecode::types::Type;

pub struct MoveHandler;

impl Handler for MoveHandler {
    fn lift(&self, instr: &LabeledInstr, cx: &mut LiftContext) -> IrResult<()> {
        let (dst, src, hint) = match instr.instr() {
            Instr::Move(dst, src) | Instr::MoveFrom16(dst, src) | Instr::Move16(dst, src) => {
                (cx.local(*dst)?, cx.local(*src)?, RegType::Narrow)
            }
            Instr::MoveWide(dst, src)
            | Instr::MoveWideFrom16(dst, src)
            | Instr::MoveWide16(dst, src) => (cx.wide(*dst)?, cx.wide(*src)?, RegType::Wide),
            Instr::MoveObject(dst, src)
            | Instr::MoveObjectFrom16(dst, src)
            | Instr::MoveObject16(dst, src) => {
                (cx.local(*dst)?, cx.local(*src)?, RegType::Reference)
            }
            _ => return Err(cx.bad_format(instr, "not a move")),
        };
        let id = cx.push(
            instr,
            Stmt::Assign {
                place: Place::Local(dst),
                expr: Expr::Use(Value::Local(src)),
            },
        );
        let (used, defined) = (ValueBox::new(id, 0), ValueBox::new(id, 1));
        cx.constrain(used, defined);
        cx.seed(used, hint.clone());
        cx.seed(defined, hint);
        Ok(())
    }
}

/// Moves the result of the preceding invocation (or `filled-new-array`)
/// into a register, turning that statement into an assignment.
pub struct MoveResultHandler;

impl Handler for MoveResultHandler {
    fn lift(&self, instr: &LabeledInstr, cx: &mut LiftContext) -> IrResult<()> {
        let (reg, fits): (_, fn(&Type) -> bool) = match instr.instr() {
            Instr::MoveResult(reg) => (*reg, is_narrow),
            Instr::MoveResultWide(reg) => (*reg, Type::is_wide),
            Instr::MoveResultObject(reg) => (*reg, Type::is_reference),
            _ => return Err(cx.bad_format(instr, "not a move-result")),
        };
        let pending = cx
            .take_result()
            .ok_or_else(|| cx.bad_format(instr, "no preceding invoke or filled-new-array"))?;
        if !fits(&pending.ty) {
            return Err(cx.bad_format(
                instr,
                format!("cannot move a result of type {}", pending.ty),
            ));
        }
        let local = cx.sized(reg, &pending.ty)?;
        let expr = match cx.stmt(pending.stmt) {
            Some(Stmt::Invoke(invoke)) => Expr::Invoke(invoke.clone()),
            Some(Stmt::Eval(expr)) => expr.clone(),
            _ => return Err(cx.bad_format(instr, "result producer was already consumed")),
        };
        cx.replace(
            pending.stmt,
            Stmt::Assign {
                place: Place::Local(local),
                expr,
            },
        );
        if let Some(defined) = cx.def_box(pending.stmt) {
            cx.seed(defined, pending.ty);
        }
        Ok(())
    }
}

pub struct MoveExceptionHandler;

impl Handler for MoveExceptionHandler {
    fn lift(&self, instr: &LabeledInstr, cx: &mut LiftContext) -> IrResult<()> {
        let Instr::MoveException(reg) = instr.instr() else {
            return Err(cx.bad_format(instr, "not a move-exception"));
        };
        let ty = caught_type(instr, cx)?;
        let local = cx.local(*reg)?;
        let id = cx.push(
            instr,
            Stmt::Identity {
                local,
                source: IdentitySource::CaughtException(ty.clone()),
            },
        );
        cx.seed(ValueBox::new(id, 0), ty);
        Ok(())
    }
}

fn is_narrow(ty: &Type) -> bool {
    ty.is_int_like() || matches!(ty, Type::Float)
}

/// Type of the exceptions caught by the handler starting at `instr`: the
/// join of the types of the clauses targeting it, `Throwable` for
/// catch-all clauses.
fn caught_type(instr: &LabeledInstr, cx: &LiftContext) -> IrResult<Type> {
    let symbols = cx.symbols();
    let mut caught: Option<Type> = None;
    let mut found = false;
    for item in &cx.code().tries {
        if item.handler.catch_all == Some(instr.addr) {
            return Ok(JAVA_LANG_THROWABLE.clone());
        }
        for (type_idx, _) in item.handler.catches.iter().filter(|(_, h)| *h == instr.addr) {
            found = true;
            let ty = symbols.type_of(*type_idx)?;
            caught = match caught {
                None => Some(ty.clone()),
                Some(prev) => join(&prev, ty, symbols),
            };
        }
    }
    if !found {
        return Err(cx.bad_format(instr, "not the start of an exception handler"));
    }
    Ok(match caught {
        Some(ty) if ty != *JAVA_LANG_OBJECT => ty,
        _ => JAVA_LANG_THROWABLE.clone(),
    })
}
