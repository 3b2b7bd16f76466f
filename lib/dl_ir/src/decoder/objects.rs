//! Object constants, allocations, casts and type tests.

use super::{Handler, LiftContext};
use crate::errors::IrResult;
use crate::ir::{Constant, Expr, Place, Stmt, Value, ValueBox};
use crate::typing::types::{
    JAVA_LANG_CLASS, JAVA_LANG_INVOKE_METHOD_HANDLE, JAVA_LANG_INVOKE_METHOD_TYPE,
    JAVA_LANG_STRING,
};
use crate::typing::RegType;
use dl_bytecode::instrs::{Instr, LabeledInstr};
use dl_bytecode::registers::Reg;
use dl_bytecode::types::Type;

pub struct ObjectHandler;

impl Handler for ObjectHandler {
    fn lift(&self, instr: &LabeledInstr, cx: &mut LiftContext) -> IrResult<()> {
        let symbols = cx.symbols();
        match instr.instr() {
            Instr::ConstString(reg, s) | Instr::ConstStringJumbo(reg, s) => {
                let value = Constant::String(symbols.string(*s)?.to_string());
                constant(instr, cx, *reg, value, &JAVA_LANG_STRING)
            }
            Instr::ConstClass(reg, t) => {
                let value = Constant::Class(symbols.type_of(*t)?.clone());
                constant(instr, cx, *reg, value, &JAVA_LANG_CLASS)
            }
            Instr::ConstMethodHandle(reg, h) => {
                let value = Constant::MethodHandle(symbols.method_handle(*h)?.clone());
                constant(instr, cx, *reg, value, &JAVA_LANG_INVOKE_METHOD_HANDLE)
            }
            Instr::ConstMethodType(reg, p) => {
                let value = Constant::MethodType(symbols.proto(*p)?.clone());
                constant(instr, cx, *reg, value, &JAVA_LANG_INVOKE_METHOD_TYPE)
            }
            Instr::NewInstance(reg, t) => {
                let ty = symbols.type_of(*t)?;
                if ty.class_name().is_none() {
                    return Err(cx.bad_format(instr, format!("cannot instantiate {ty}")));
                }
                let dst = cx.local(*reg)?;
                let id = cx.push(
                    instr,
                    Stmt::Assign {
                        place: Place::Local(dst),
                        expr: Expr::New(ty.clone()),
                    },
                );
                cx.seed(ValueBox::new(id, 0), ty);
                Ok(())
            }
            Instr::CheckCast(reg, t) => {
                let ty = symbols.type_of(*t)?;
                if !ty.is_reference() {
                    return Err(cx.bad_format(instr, format!("cannot cast to {ty}")));
                }
                let local = cx.local(*reg)?;
                let id = cx.push(
                    instr,
                    Stmt::Assign {
                        place: Place::Local(local),
                        expr: Expr::Cast(ty.clone(), Value::Local(local)),
                    },
                );
                cx.seed(ValueBox::new(id, 0), RegType::Reference);
                cx.seed(ValueBox::new(id, 1), ty);
                Ok(())
            }
            Instr::InstanceOf(dst, src, t) => {
                let ty = symbols.type_of(*t)?;
                let src = cx.local(*src)?;
                let dst = cx.local(*dst)?;
                let id = cx.push(
                    instr,
                    Stmt::Assign {
                        place: Place::Local(dst),
                        expr: Expr::InstanceOf(ty.clone(), Value::Local(src)),
                    },
                );
                cx.seed(ValueBox::new(id, 0), RegType::Reference);
                cx.seed(ValueBox::new(id, 1), Type::Boolean);
                Ok(())
            }
            _ => Err(cx.bad_format(instr, "not an object instruction")),
        }
    }
}

fn constant(
    instr: &LabeledInstr,
    cx: &mut LiftContext,
    reg: Reg,
    value: Constant,
    ty: &Type,
) -> IrResult<()> {
    let dst = cx.local(reg)?;
    let id = cx.push(
        instr,
        Stmt::Assign {
            place: Place::Local(dst),
            expr: Expr::Use(Value::Const(value)),
        },
    );
    cx.seed(ValueBox::new(id, 1), ty);
    Ok(())
}
