//! Instance and static field accesses.

use super::{use_hint, Handler, LiftContext};
use crate::errors::IrResult;
use crate::ir::{Expr, Place, Stmt, Value, ValueBox};
use crate::typing::RegType;
use dl_bytecode::instrs::{Instr, LabeledInstr};
use dl_bytecode::pools::{FieldId, FieldRef, Index};
use dl_bytecode::registers::Reg;
use dl_bytecode::types::Type;

/// Value kinds named by the opcode variants of member and array accesses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Access {
    Narrow,
    Wide,
    Object,
    Boolean,
    Byte,
    Char,
    Short,
}

impl Access {
    /// Whether a value of type `ty` can be accessed with this variant.
    pub(crate) fn accepts(self, ty: &Type) -> bool {
        match self {
            Self::Narrow => matches!(ty, Type::Int | Type::Float),
            Self::Wide => ty.is_wide(),
            Self::Object => ty.is_reference(),
            Self::Boolean => *ty == Type::Boolean,
            Self::Byte => *ty == Type::Byte,
            Self::Char => *ty == Type::Char,
            Self::Short => *ty == Type::Short,
        }
    }

    pub(crate) const fn slots(self) -> usize {
        match self {
            Self::Wide => 2,
            _ => 1,
        }
    }

    /// What the variant alone tells about the accessed value.
    pub(crate) fn hint(self) -> RegType {
        match self {
            Self::Narrow => RegType::Narrow,
            Self::Wide => RegType::Wide,
            Self::Object => RegType::Reference,
            Self::Boolean => RegType::Concrete(Type::Boolean),
            Self::Byte => RegType::Concrete(Type::Byte),
            Self::Char => RegType::Concrete(Type::Char),
            Self::Short => RegType::Concrete(Type::Short),
        }
    }
}

pub struct FieldHandler;

impl Handler for FieldHandler {
    fn lift(&self, instr: &LabeledInstr, cx: &mut LiftContext) -> IrResult<()> {
        use Access::{Boolean, Byte, Char, Narrow, Object, Short, Wide};

        match *instr.instr() {
            Instr::Iget(v, o, f) => iget(instr, cx, Narrow, v, o, f),
            Instr::IgetWide(v, o, f) => iget(instr, cx, Wide, v, o, f),
            Instr::IgetObject(v, o, f) => iget(instr, cx, Object, v, o, f),
            Instr::IgetBoolean(v, o, f) => iget(instr, cx, Boolean, v, o, f),
            Instr::IgetByte(v, o, f) => iget(instr, cx, Byte, v, o, f),
            Instr::IgetChar(v, o, f) => iget(instr, cx, Char, v, o, f),
            Instr::IgetShort(v, o, f) => iget(instr, cx, Short, v, o, f),
            Instr::Iput(v, o, f) => iput(instr, cx, Narrow, v, o, f),
            Instr::IputWide(v, o, f) => iput(instr, cx, Wide, v, o, f),
            Instr::IputObject(v, o, f) => iput(instr, cx, Object, v, o, f),
            Instr::IputBoolean(v, o, f) => iput(instr, cx, Boolean, v, o, f),
            Instr::IputByte(v, o, f) => iput(instr, cx, Byte, v, o, f),
            Instr::IputChar(v, o, f) => iput(instr, cx, Char, v, o, f),
            Instr::IputShort(v, o, f) => iput(instr, cx, Short, v, o, f),
            Instr::Sget(v, f) => sget(instr, cx, Narrow, v, f),
            Instr::SgetWide(v, f) => sget(instr, cx, Wide, v, f),
            Instr::SgetObject(v, f) => sget(instr, cx, Object, v, f),
            Instr::SgetBoolean(v, f) => sget(instr, cx, Boolean, v, f),
            Instr::SgetByte(v, f) => sget(instr, cx, Byte, v, f),
            Instr::SgetChar(v, f) => sget(instr, cx, Char, v, f),
            Instr::SgetShort(v, f) => sget(instr, cx, Short, v, f),
            Instr::Sput(v, f) => sput(instr, cx, Narrow, v, f),
            Instr::SputWide(v, f) => sput(instr, cx, Wide, v, f),
            Instr::SputObject(v, f) => sput(instr, cx, Object, v, f),
            Instr::SputBoolean(v, f) => sput(instr, cx, Boolean, v, f),
            Instr::SputByte(v, f) => sput(instr, cx, Byte, v, f),
            Instr::SputChar(v, f) => sput(instr, cx, Char, v, f),
            Instr::SputShort(v, f) => sput(instr, cx, Short, v, f),
            _ => Err(cx.bad_format(instr, "not a field access")),
        }
    }
}

fn resolve(
    instr: &LabeledInstr,
    cx: &LiftContext,
    access: Access,
    idx: Index<FieldId>,
) -> IrResult<FieldRef> {
    let symbols = cx.symbols();
    let field = symbols.field(idx)?;
    symbols.check_field(field)?;
    if !access.accepts(&field.type_) {
        return Err(cx.bad_format(
            instr,
            format!("field {field} does not fit the access width"),
        ));
    }
    Ok(field.clone())
}

fn iget(
    instr: &LabeledInstr,
    cx: &mut LiftContext,
    access: Access,
    dst: Reg,
    obj: Reg,
    idx: Index<FieldId>,
) -> IrResult<()> {
    let field = resolve(instr, cx, access, idx)?;
    let obj = cx.local(obj)?;
    let dst = cx.sized(dst, &field.type_)?;
    let ty = field.type_.clone();
    let id = cx.push(
        instr,
        Stmt::Assign {
            place: Place::Local(dst),
            expr: Expr::InstanceField(Value::Local(obj), field),
        },
    );
    cx.seed(ValueBox::new(id, 0), RegType::Reference);
    cx.seed(ValueBox::new(id, 1), ty);
    Ok(())
}

fn iput(
    instr: &LabeledInstr,
    cx: &mut LiftContext,
    access: Access,
    src: Reg,
    obj: Reg,
    idx: Index<FieldId>,
) -> IrResult<()> {
    let field = resolve(instr, cx, access, idx)?;
    let obj = cx.local(obj)?;
    let src = cx.sized(src, &field.type_)?;
    let hint = use_hint(&field.type_);
    let id = cx.push(
        instr,
        Stmt::Assign {
            place: Place::InstanceField(Value::Local(obj), field),
            expr: Expr::Use(Value::Local(src)),
        },
    );
    cx.seed(ValueBox::new(id, 0), RegType::Reference);
    cx.seed(ValueBox::new(id, 1), hint);
    Ok(())
}

fn sget(
    instr: &LabeledInstr,
    cx: &mut LiftContext,
    access: Access,
    dst: Reg,
    idx: Index<FieldId>,
) -> IrResult<()> {
    let field = resolve(instr, cx, access, idx)?;
    let dst = cx.sized(dst, &field.type_)?;
    let ty = field.type_.clone();
    let id = cx.push(
        instr,
        Stmt::Assign {
            place: Place::Local(dst),
            expr: Expr::StaticField(field),
        },
    );
    cx.seed(ValueBox::new(id, 0), ty);
    Ok(())
}

fn sput(
    instr: &LabeledInstr,
    cx: &mut LiftContext,
    access: Access,
    src: Reg,
    idx: Index<FieldId>,
) -> IrResult<()> {
    let field = resolve(instr, cx, access, idx)?;
    let src = cx.sized(src, &field.type_)?;
    let hint = use_hint(&field.type_);
    let id = cx.push(
        instr,
        Stmt::Assign {
            place: Place::StaticField(field),
            expr: Expr::Use(Value::Local(src)),
        },
    );
    cx.seed(ValueBox::new(id, 0), hint);
    Ok(())
}
