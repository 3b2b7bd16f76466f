use crate::ir::value::{LocalId, Value};
use dl_bytecode::pools::{CallSiteRef, FieldRef, MethodRef, ProtoRef};
use dl_bytecode::types::Type;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    And,
    Or,
    Xor,
    Shl,
    Shr,
    Ushr,
}

impl BinOp {
    #[must_use]
    pub const fn is_shift(self) -> bool {
        matches!(self, Self::Shl | Self::Shr | Self::Ushr)
    }
}

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Rem => "%",
            Self::And => "&",
            Self::Or => "|",
            Self::Xor => "^",
            Self::Shl => "<<",
            Self::Shr => ">>",
            Self::Ushr => ">>>",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    Neg,
    Not,
}

impl fmt::Display for UnOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Neg => write!(f, "neg"),
            Self::Not => write!(f, "not"),
        }
    }
}

/// Three-way comparisons producing -1, 0 or 1.
///
/// `Cmpl` and `Cmpg` differ only on NaN operands (yielding -1 and 1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpKind {
    Cmpl,
    Cmpg,
    Cmp,
}

impl fmt::Display for CmpKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Cmpl => write!(f, "cmpl"),
            Self::Cmpg => write!(f, "cmpg"),
            Self::Cmp => write!(f, "cmp"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvokeKind {
    Virtual,
    Super,
    Direct,
    Static,
    Interface,
    Polymorphic,
    Custom,
}

impl InvokeKind {
    /// Whether the first argument is the receiver object.
    #[must_use]
    pub const fn has_receiver(self) -> bool {
        !matches!(self, Self::Static | Self::Custom)
    }
}

impl fmt::Display for InvokeKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            Self::Virtual => "virtualinvoke",
            Self::Super => "superinvoke",
            Self::Direct => "directinvoke",
            Self::Static => "staticinvoke",
            Self::Interface => "interfaceinvoke",
            Self::Polymorphic => "polymorphicinvoke",
            Self::Custom => "dynamicinvoke",
        };
        write!(f, "{s}")
    }
}

/// What an invocation calls.
#[derive(Debug, Clone, PartialEq)]
pub enum Callee {
    Method(MethodRef),
    CallSite(CallSiteRef),
}

impl fmt::Display for Callee {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Method(m) => write!(f, "<{m}>"),
            Self::CallSite(c) => write!(f, "<{c}>"),
        }
    }
}

/// A method invocation.
///
/// `proto` is the prototype the arguments are typed against, which differs
/// from the callee one for polymorphic invocations. `args` includes the
/// receiver first when the kind has one.
#[derive(Debug, Clone, PartialEq)]
pub struct InvokeExpr {
    pub kind: InvokeKind,
    pub callee: Callee,
    pub proto: ProtoRef,
    pub args: Vec<Value>,
}

/// Right-hand sides of assignments.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Use(Value),
    Binary(BinOp, Value, Value),
    Cmp(CmpKind, Value, Value),
    Unary(UnOp, Value),
    /// Primitive conversions and reference casts.
    Cast(Type, Value),
    InstanceOf(Type, Value),
    Length(Value),
    New(Type),
    /// A new array of the given array type and length.
    NewArray(Type, Value),
    /// A new array of the given array type filled with the values.
    FilledArray(Type, Vec<Value>),
    ArrayRef(Value, Value),
    InstanceField(Value, FieldRef),
    StaticField(FieldRef),
    Invoke(InvokeExpr),
}

/// Assignable left-hand sides.
#[derive(Debug, Clone, PartialEq)]
pub enum Place {
    Local(LocalId),
    ArrayElement(Value, Value),
    InstanceField(Value, FieldRef),
    StaticField(FieldRef),
}
