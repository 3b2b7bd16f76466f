//! Array creation, initialization and element accesses.

use super::fields::Access;
use super::{use_hint, Handler, LiftContext};
use crate::errors::IrResult;
use crate::ir::{Constant, Expr, Place, Stmt, Value, ValueBox};
use crate::typing::RegType;
use dl_bytecode::instrs::{Instr, LabeledInstr};
use dl_bytecode::pools::{Index, TypeId};
use dl_bytecode::registers::Reg;
use dl_bytecode::types::Type;

pub struct ArrayHandler;

impl Handler for ArrayHandler {
    fn lift(&self, instr: &LabeledInstr, cx: &mut LiftContext) -> IrResult<()> {
        use Access::{Boolean, Byte, Char, Narrow, Object, Short, Wide};

        match instr.instr() {
            Instr::Aget(v, a, i) => aget(instr, cx, Narrow, *v, *a, *i),
            Instr::AgetWide(v, a, i) => aget(instr, cx, Wide, *v, *a, *i),
            Instr::AgetObject(v, a, i) => aget(instr, cx, Object, *v, *a, *i),
            Instr::AgetBoolean(v, a, i) => aget(instr, cx, Boolean, *v, *a, *i),
            Instr::AgetByte(v, a, i) => aget(instr, cx, Byte, *v, *a, *i),
            Instr::AgetChar(v, a, i) => aget(instr, cx, Char, *v, *a, *i),
            Instr::AgetShort(v, a, i) => aget(instr, cx, Short, *v, *a, *i),
            Instr::Aput(v, a, i) => aput(instr, cx, Narrow, *v, *a, *i),
            Instr::AputWide(v, a, i) => aput(instr, cx, Wide, *v, *a, *i),
            Instr::AputObject(v, a, i) => aput(instr, cx, Object, *v, *a, *i),
            Instr::AputBoolean(v, a, i) => aput(instr, cx, Boolean, *v, *a, *i),
            Instr::AputByte(v, a, i) => aput(instr, cx, Byte, *v, *a, *i),
            Instr::AputChar(v, a, i) => aput(instr, cx, Char, *v, *a, *i),
            Instr::AputShort(v, a, i) => aput(instr, cx, Short, *v, *a, *i),
            Instr::ArrayLength(dst, array) => {
                let array = cx.local(*array)?;
                let dst = cx.local(*dst)?;
                let id = cx.push(
                    instr,
                    Stmt::Assign {
                        place: Place::Local(dst),
                        expr: Expr::Length(Value::Local(array)),
                    },
                );
                cx.seed(ValueBox::new(id, 0), RegType::Reference);
                cx.seed(ValueBox::new(id, 1), Type::Int);
                Ok(())
            }
            Instr::NewArray(dst, size, t) => {
                let ty = array_type(instr, cx, *t)?;
                let size = cx.local(*size)?;
                let dst = cx.local(*dst)?;
                let id = cx.push(
                    instr,
                    Stmt::Assign {
                        place: Place::Local(dst),
                        expr: Expr::NewArray(ty.clone(), Value::Local(size)),
                    },
                );
                cx.seed(ValueBox::new(id, 0), RegType::Integral);
                cx.seed(ValueBox::new(id, 1), ty);
                Ok(())
            }
            Instr::FilledNewArray(args, t) => {
                filled_new_array(instr, cx, &args.iter().collect::<Vec<_>>(), *t)
            }
            Instr::FilledNewArrayRange(args, t) => {
                filled_new_array(instr, cx, &args.iter().collect::<Vec<_>>(), *t)
            }
            Instr::FillArrayData(array, offset) => fill_array_data(instr, cx, *array, *offset),
            _ => Err(cx.bad_format(instr, "not an array instruction")),
        }
    }
}

fn array_type(instr: &LabeledInstr, cx: &LiftContext, idx: Index<TypeId>) -> IrResult<Type> {
    let ty = cx.symbols().type_of(idx)?;
    if ty.is_array() {
        Ok(ty.clone())
    } else {
        Err(cx.bad_format(instr, format!("{ty} is not an array type")))
    }
}

fn aget(
    instr: &LabeledInstr,
    cx: &mut LiftContext,
    access: Access,
    dst: Reg,
    array: Reg,
    index: Reg,
) -> IrResult<()> {
    let array = cx.local(array)?;
    let index = cx.local(index)?;
    let dst = cx.with_slots(dst, access.slots())?;
    let id = cx.push(
        instr,
        Stmt::Assign {
            place: Place::Local(dst),
            expr: Expr::ArrayRef(Value::Local(array), Value::Local(index)),
        },
    );
    cx.seed(ValueBox::new(id, 0), RegType::Reference);
    cx.seed(ValueBox::new(id, 1), RegType::Integral);
    cx.seed(ValueBox::new(id, 2), access.hint());
    Ok(())
}

fn aput(
    instr: &LabeledInstr,
    cx: &mut LiftContext,
    access: Access,
    src: Reg,
    array: Reg,
    index: Reg,
) -> IrResult<()> {
    let array = cx.local(array)?;
    let index = cx.local(index)?;
    let src = cx.with_slots(src, access.slots())?;
    let id = cx.push(
        instr,
        Stmt::Assign {
            place: Place::ArrayElement(Value::Local(array), Value::Local(index)),
            expr: Expr::Use(Value::Local(src)),
        },
    );
    cx.seed(ValueBox::new(id, 0), RegType::Reference);
    cx.seed(ValueBox::new(id, 1), RegType::Integral);
    cx.seed(ValueBox::new(id, 2), access.hint());
    Ok(())
}

fn filled_new_array(
    instr: &LabeledInstr,
    cx: &mut LiftContext,
    regs: &[Reg],
    idx: Index<TypeId>,
) -> IrResult<()> {
    let ty = array_type(instr, cx, idx)?;
    let element = ty.element_type().unwrap_or(Type::Void);
    if element.is_wide() {
        return Err(cx.bad_format(instr, format!("cannot fill an array of type {ty}")));
    }
    let mut values = Vec::with_capacity(regs.len());
    for reg in regs {
        values.push(Value::Local(cx.local(*reg)?));
    }
    let id = cx.push(instr, Stmt::Eval(Expr::FilledArray(ty.clone(), values)));
    let hint = use_hint(&element);
    for slot in 0..regs.len() {
        cx.seed(ValueBox::new(id, slot), hint.clone());
    }
    cx.set_result(id, ty);
    Ok(())
}

/// Expands the payload into one element store per value.
fn fill_array_data(
    instr: &LabeledInstr,
    cx: &mut LiftContext,
    array: Reg,
    offset: i32,
) -> IrResult<()> {
    let payload_addr = instr
        .addr
        .offset_by(offset)
        .ok_or_else(|| cx.bad_format(instr, "payload before method entry"))?;
    let payload = cx
        .code()
        .instruction_at(payload_addr)
        .map_err(|_| cx.bad_format(instr, format!("no payload at {payload_addr}")))?;
    let (width, elements) = match &payload.instr {
        Instr::FillArrayDataPayload { width, .. } => (
            *width,
            payload.instr.array_data_elements().ok_or_else(|| {
                cx.bad_format(instr, format!("malformed payload at {payload_addr}"))
            })?,
        ),
        _ => {
            return Err(cx.bad_format(
                instr,
                format!("no fill-array-data-payload at {payload_addr}"),
            ))
        }
    };

    let array = cx.local(array)?;
    if elements.is_empty() {
        cx.push(instr, Stmt::Nop);
        return Ok(());
    }
    for (i, element) in elements.into_iter().enumerate() {
        let value = if width == 8 {
            Constant::Long(element)
        } else {
            // sign-extended from at most 4 bytes
            #[allow(clippy::cast_possible_truncation)]
            let element = element as i32;
            Constant::Int(element)
        };
        let index = i32::try_from(i)
            .map_err(|_| cx.bad_format(instr, "too many array elements"))?;
        let id = cx.push(
            instr,
            Stmt::Assign {
                place: Place::ArrayElement(
                    Value::Local(array),
                    Value::Const(Constant::Int(index)),
                ),
                expr: Expr::Use(Value::Const(value)),
            },
        );
        cx.seed(ValueBox::new(id, 0), RegType::Reference);
    }
    Ok(())
}
