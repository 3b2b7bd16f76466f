//! Unary operations, conversions and binary arithmetic.

use super::{Handler, LiftContext};
use crate::errors::IrResult;
use crate::ir::{BinOp, Constant, Expr, Place, Stmt, UnOp, Value, ValueBox};
use crate::typing::RegType;
use dl_bytecode::instrs::{Instr, LabeledInstr};
use dl_bytecode::registers::Reg;
use dl_bytecode::types::Type;

pub struct ArithHandler;

impl Handler for ArithHandler {
    #[allow(clippy::too_many_lines)]
    fn lift(&self, instr: &LabeledInstr, cx: &mut LiftContext) -> IrResult<()> {
        use BinOp::{Add, And, Div, Mul, Or, Rem, Shl, Shr, Sub, Ushr, Xor};
        use Type::{Byte, Char, Double, Float, Int, Long, Short};

        match *instr.instr() {
            Instr::NegInt(d, s) => unary(instr, cx, UnOp::Neg, &Int, d, s),
            Instr::NotInt(d, s) => unary(instr, cx, UnOp::Not, &Int, d, s),
            Instr::NegLong(d, s) => unary(instr, cx, UnOp::Neg, &Long, d, s),
            Instr::NotLong(d, s) => unary(instr, cx, UnOp::Not, &Long, d, s),
            Instr::NegFloat(d, s) => unary(instr, cx, UnOp::Neg, &Float, d, s),
            Instr::NegDouble(d, s) => unary(instr, cx, UnOp::Neg, &Double, d, s),

            Instr::IntToLong(d, s) => convert(instr, cx, &Int, &Long, d, s),
            Instr::IntToFloat(d, s) => convert(instr, cx, &Int, &Float, d, s),
            Instr::IntToDouble(d, s) => convert(instr, cx, &Int, &Double, d, s),
            Instr::LongToInt(d, s) => convert(instr, cx, &Long, &Int, d, s),
            Instr::LongToFloat(d, s) => convert(instr, cx, &Long, &Float, d, s),
            Instr::LongToDouble(d, s) => convert(instr, cx, &Long, &Double, d, s),
            Instr::FloatToInt(d, s) => convert(instr, cx, &Float, &Int, d, s),
            Instr::FloatToLong(d, s) => convert(instr, cx, &Float, &Long, d, s),
            Instr::FloatToDouble(d, s) => convert(instr, cx, &Float, &Double, d, s),
            Instr::DoubleToInt(d, s) => convert(instr, cx, &Double, &Int, d, s),
            Instr::DoubleToLong(d, s) => convert(instr, cx, &Double, &Long, d, s),
            Instr::DoubleToFloat(d, s) => convert(instr, cx, &Double, &Float, d, s),
            Instr::IntToByte(d, s) => convert(instr, cx, &Int, &Byte, d, s),
            Instr::IntToChar(d, s) => convert(instr, cx, &Int, &Char, d, s),
            Instr::IntToShort(d, s) => convert(instr, cx, &Int, &Short, d, s),

            Instr::AddInt(d, a, b) => binary(instr, cx, Add, &Int, d, a, b),
            Instr::SubInt(d, a, b) => binary(instr, cx, Sub, &Int, d, a, b),
            Instr::MulInt(d, a, b) => binary(instr, cx, Mul, &Int, d, a, b),
            Instr::DivInt(d, a, b) => binary(instr, cx, Div, &Int, d, a, b),
            Instr::RemInt(d, a, b) => binary(instr, cx, Rem, &Int, d, a, b),
            Instr::AndInt(d, a, b) => binary(instr, cx, And, &Int, d, a, b),
            Instr::OrInt(d, a, b) => binary(instr, cx, Or, &Int, d, a, b),
            Instr::XorInt(d, a, b) => binary(instr, cx, Xor, &Int, d, a, b),
            Instr::ShlInt(d, a, b) => binary(instr, cx, Shl, &Int, d, a, b),
            Instr::ShrInt(d, a, b) => binary(instr, cx, Shr, &Int, d, a, b),
            Instr::UshrInt(d, a, b) => binary(instr, cx, Ushr, &Int, d, a, b),
            Instr::AddLong(d, a, b) => binary(instr, cx, Add, &Long, d, a, b),
            Instr::SubLong(d, a, b) => binary(instr, cx, Sub, &Long, d, a, b),
            Instr::MulLong(d, a, b) => binary(instr, cx, Mul, &Long, d, a, b),
            Instr::DivLong(d, a, b) => binary(instr, cx, Div, &Long, d, a, b),
            Instr::RemLong(d, a, b) => binary(instr, cx, Rem, &Long, d, a, b),
            Instr::AndLong(d, a, b) => binary(instr, cx, And, &Long, d, a, b),
            Instr::OrLong(d, a, b) => binary(instr, cx, Or, &Long, d, a, b),
            Instr::XorLong(d, a, b) => binary(instr, cx, Xor, &Long, d, a, b),
            Instr::ShlLong(d, a, b) => binary(instr, cx, Shl, &Long, d, a, b),
            Instr::ShrLong(d, a, b) => binary(instr, cx, Shr, &Long, d, a, b),
            Instr::UshrLong(d, a, b) => binary(instr, cx, Ushr, &Long, d, a, b),
            Instr::AddFloat(d, a, b) => binary(instr, cx, Add, &Float, d, a, b),
            Instr::SubFloat(d, a, b) => binary(instr, cx, Sub, &Float, d, a, b),
            Instr::MulFloat(d, a, b) => binary(instr, cx, Mul, &Float, d, a, b),
            Instr::DivFloat(d, a, b) => binary(instr, cx, Div, &Float, d, a, b),
            Instr::RemFloat(d, a, b) => binary(instr, cx, Rem, &Float, d, a, b),
            Instr::AddDouble(d, a, b) => binary(instr, cx, Add, &Double, d, a, b),
            Instr::SubDouble(d, a, b) => binary(instr, cx, Sub, &Double, d, a, b),
            Instr::MulDouble(d, a, b) => binary(instr, cx, Mul, &Double, d, a, b),
            Instr::DivDouble(d, a, b) => binary(instr, cx, Div, &Double, d, a, b),
            Instr::RemDouble(d, a, b) => binary(instr, cx, Rem, &Double, d, a, b),

            Instr::AddInt2addr(a, b) => binary(instr, cx, Add, &Int, a, a, b),
            Instr::SubInt2addr(a, b) => binary(instr, cx, Sub, &Int, a, a, b),
            Instr::MulInt2addr(a, b) => binary(instr, cx, Mul, &Int, a, a, b),
            Instr::DivInt2addr(a, b) => binary(instr, cx, Div, &Int, a, a, b),
            Instr::RemInt2addr(a, b) => binary(instr, cx, Rem, &Int, a, a, b),
            Instr::AndInt2addr(a, b) => binary(instr, cx, And, &Int, a, a, b),
            Instr::OrInt2addr(a, b) => binary(instr, cx, Or, &Int, a, a, b),
            Instr::XorInt2addr(a, b) => binary(instr, cx, Xor, &Int, a, a, b),
            Instr::ShlInt2addr(a, b) => binary(instr, cx, Shl, &Int, a, a, b),
            Instr::ShrInt2addr(a, b) => binary(instr, cx, Shr, &Int, a, a, b),
            Instr::UshrInt2addr(a, b) => binary(instr, cx, Ushr, &Int, a, a, b),
            Instr::AddLong2addr(a, b) => binary(instr, cx, Add, &Long, a, a, b),
            Instr::SubLong2addr(a, b) => binary(instr, cx, Sub, &Long, a, a, b),
            Instr::MulLong2addr(a, b) => binary(instr, cx, Mul, &Long, a, a, b),
            Instr::DivLong2addr(a, b) => binary(instr, cx, Div, &Long, a, a, b),
            Instr::RemLong2addr(a, b) => binary(instr, cx, Rem, &Long, a, a, b),
            Instr::AndLong2addr(a, b) => binary(instr, cx, And, &Long, a, a, b),
            Instr::OrLong2addr(a, b) => binary(instr, cx, Or, &Long, a, a, b),
            Instr::XorLong2addr(a, b) => binary(instr, cx, Xor, &Long, a, a, b),
            Instr::ShlLong2addr(a, b) => binary(instr, cx, Shl, &Long, a, a, b),
            Instr::ShrLong2addr(a, b) => binary(instr, cx, Shr, &Long, a, a, b),
            Instr::UshrLong2addr(a, b) => binary(instr, cx, Ushr, &Long, a, a, b),
            Instr::AddFloat2addr(a, b) => binary(instr, cx, Add, &Float, a, a, b),
            Instr::SubFloat2addr(a, b) => binary(instr, cx, Sub, &Float, a, a, b),
            Instr::MulFloat2addr(a, b) => binary(instr, cx, Mul, &Float, a, a, b),
            Instr::DivFloat2addr(a, b) => binary(instr, cx, Div, &Float, a, a, b),
            Instr::RemFloat2addr(a, b) => binary(instr, cx, Rem, &Float, a, a, b),
            Instr::AddDouble2addr(a, b) => binary(instr, cx, Add, &Double, a, a, b),
            Instr::SubDouble2addr(a, b) => binary(instr, cx, Sub, &Double, a, a, b),
            Instr::MulDouble2addr(a, b) => binary(instr, cx, Mul, &Double, a, a, b),
            Instr::DivDouble2addr(a, b) => binary(instr, cx, Div, &Double, a, a, b),
            Instr::RemDouble2addr(a, b) => binary(instr, cx, Rem, &Double, a, a, b),

            Instr::AddIntLit16(d, s, lit) => literal(instr, cx, Add, d, s, lit.into(), false),
            Instr::RsubInt(d, s, lit) => literal(instr, cx, Sub, d, s, lit.into(), true),
            Instr::MulIntLit16(d, s, lit) => literal(instr, cx, Mul, d, s, lit.into(), false),
            Instr::DivIntLit16(d, s, lit) => literal(instr, cx, Div, d, s, lit.into(), false),
            Instr::RemIntLit16(d, s, lit) => literal(instr, cx, Rem, d, s, lit.into(), false),
            Instr::AndIntLit16(d, s, lit) => literal(instr, cx, And, d, s, lit.into(), false),
            Instr::OrIntLit16(d, s, lit) => literal(instr, cx, Or, d, s, lit.into(), false),
            Instr::XorIntLit16(d, s, lit) => literal(instr, cx, Xor, d, s, lit.into(), false),
            Instr::AddIntLit8(d, s, lit) => literal(instr, cx, Add, d, s, lit.into(), false),
            Instr::RsubIntLit8(d, s, lit) => literal(instr, cx, Sub, d, s, lit.into(), true),
            Instr::MulIntLit8(d, s, lit) => literal(instr, cx, Mul, d, s, lit.into(), false),
            Instr::DivIntLit8(d, s, lit) => literal(instr, cx, Div, d, s, lit.into(), false),
            Instr::RemIntLit8(d, s, lit) => literal(instr, cx, Rem, d, s, lit.into(), false),
            Instr::AndIntLit8(d, s, lit) => literal(instr, cx, And, d, s, lit.into(), false),
            Instr::OrIntLit8(d, s, lit) => literal(instr, cx, Or, d, s, lit.into(), false),
            Instr::XorIntLit8(d, s, lit) => literal(instr, cx, Xor, d, s, lit.into(), false),
            Instr::ShlIntLit8(d, s, lit) => literal(instr, cx, Shl, d, s, lit.into(), false),
            Instr::ShrIntLit8(d, s, lit) => literal(instr, cx, Shr, d, s, lit.into(), false),
            Instr::UshrIntLit8(d, s, lit) => literal(instr, cx, Ushr, d, s, lit.into(), false),

            _ => Err(cx.bad_format(instr, "not an arithmetic instruction")),
        }
    }
}

/// Hint of the operands of `op` over values of type `ty`.
///
/// Bitwise operations on 32-bit values are also used on booleans and
/// other int-like types.
fn operand_hint(op: BinOp, ty: &Type) -> RegType {
    match (op, ty) {
        (BinOp::And | BinOp::Or | BinOp::Xor, Type::Int) => RegType::Integral,
        _ => RegType::Concrete(ty.clone()),
    }
}

fn unary(
    instr: &LabeledInstr,
    cx: &mut LiftContext,
    op: UnOp,
    ty: &Type,
    dst: Reg,
    src: Reg,
) -> IrResult<()> {
    let src = cx.sized(src, ty)?;
    let dst = cx.sized(dst, ty)?;
    let id = cx.push(
        instr,
        Stmt::Assign {
            place: Place::Local(dst),
            expr: Expr::Unary(op, Value::Local(src)),
        },
    );
    cx.seed(ValueBox::new(id, 0), ty);
    cx.seed(ValueBox::new(id, 1), ty);
    Ok(())
}

fn convert(
    instr: &LabeledInstr,
    cx: &mut LiftContext,
    from: &Type,
    to: &Type,
    dst: Reg,
    src: Reg,
) -> IrResult<()> {
    let src = cx.sized(src, from)?;
    let dst = cx.sized(dst, to)?;
    let id = cx.push(
        instr,
        Stmt::Assign {
            place: Place::Local(dst),
            expr: Expr::Cast(to.clone(), Value::Local(src)),
        },
    );
    cx.seed(ValueBox::new(id, 0), from);
    cx.seed(ValueBox::new(id, 1), to);
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn binary(
    instr: &LabeledInstr,
    cx: &mut LiftContext,
    op: BinOp,
    ty: &Type,
    dst: Reg,
    lhs: Reg,
    rhs: Reg,
) -> IrResult<()> {
    // shift distances are ints, whatever the shifted value
    let rhs_ty = if op.is_shift() { &Type::Int } else { ty };
    let lhs = cx.sized(lhs, ty)?;
    let rhs = cx.sized(rhs, rhs_ty)?;
    let dst = cx.sized(dst, ty)?;
    let id = cx.push(
        instr,
        Stmt::Assign {
            place: Place::Local(dst),
            expr: Expr::Binary(op, Value::Local(lhs), Value::Local(rhs)),
        },
    );
    let hint = operand_hint(op, ty);
    cx.seed(ValueBox::new(id, 0), hint.clone());
    cx.seed(ValueBox::new(id, 1), operand_hint(op, rhs_ty));
    cx.seed(ValueBox::new(id, 2), hint);
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn literal(
    instr: &LabeledInstr,
    cx: &mut LiftContext,
    op: BinOp,
    dst: Reg,
    src: Reg,
    lit: i32,
    reversed: bool,
) -> IrResult<()> {
    let src = Value::Local(cx.local(src)?);
    let dst = cx.local(dst)?;
    let lit = Value::Const(Constant::Int(lit));
    let (lhs, rhs, src_box) = if reversed {
        (lit, src, 1)
    } else {
        (src, lit, 0)
    };
    let id = cx.push(
        instr,
        Stmt::Assign {
            place: Place::Local(dst),
            expr: Expr::Binary(op, lhs, rhs),
        },
    );
    let hint = operand_hint(op, &Type::Int);
    cx.seed(ValueBox::new(id, src_box), hint.clone());
    cx.seed(ValueBox::new(id, 2), hint);
    Ok(())
}
