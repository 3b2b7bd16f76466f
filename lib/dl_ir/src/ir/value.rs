use dl_bytecode::pools::{MethodHandleRef, ProtoRef};
use dl_bytecode::registers::Reg;
use dl_bytecode::types::Type;
use std::fmt;

/// Index of a local in its body locals table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LocalId(pub usize);

impl fmt::Display for LocalId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "${}", self.0)
    }
}

/// A local variable backed by a virtual register.
///
/// While decoding, there is exactly one local per register. Once types are
/// solved, a register holding independent values over its lifetime is
/// split, and the extra locals get increasing versions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Local {
    pub reg: Reg,
    pub version: usize,
}

impl Local {
    #[must_use]
    pub const fn new(reg: Reg) -> Self {
        Self { reg, version: 0 }
    }
}

impl fmt::Display for Local {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.version == 0 {
            write!(f, "{}", self.reg)
        } else {
            write!(f, "{}_{}", self.reg, self.version)
        }
    }
}

/// Literal operands.
///
/// Numeric literals keep the raw register bits: a `0` may end up typed as
/// an integer, a float or a null reference depending on its uses.
#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    Int(i32),
    Long(i64),
    String(String),
    Class(Type),
    MethodHandle(MethodHandleRef),
    MethodType(ProtoRef),
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Int(i) => write!(f, "{i}"),
            Self::Long(l) => write!(f, "{l}L"),
            Self::String(s) => write!(f, "{s:?}"),
            Self::Class(t) => write!(f, "class {t}"),
            Self::MethodHandle(h) => write!(f, "handle {h}"),
            Self::MethodType(p) => write!(f, "methodtype {p}"),
        }
    }
}

/// An operand: either a local or a literal.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Local(LocalId),
    Const(Constant),
}

impl Value {
    #[must_use]
    pub const fn as_local(&self) -> Option<LocalId> {
        match self {
            Self::Local(id) => Some(*id),
            Self::Const(_) => None,
        }
    }
}

impl From<LocalId> for Value {
    fn from(id: LocalId) -> Self {
        Self::Local(id)
    }
}

impl From<Constant> for Value {
    fn from(c: Constant) -> Self {
        Self::Const(c)
    }
}
