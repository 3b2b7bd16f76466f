use crate::ir::expr::{Expr, InvokeExpr, Place};
use crate::ir::value::{LocalId, Value};
use dl_bytecode::types::Type;
use dl_bytecode::Addr;
use std::fmt;

/// Index of a statement in its body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StmtId(pub usize);

impl fmt::Display for StmtId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[{}]", self.0)
    }
}

/// A branch target.
///
/// Branches are emitted before the statement they jump to may exist, so
/// they first point to a bytecode address which is resolved once the whole
/// body is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Unresolved(Addr),
    Stmt(StmtId),
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Unresolved(addr) => write!(f, "@{addr}"),
            Self::Stmt(id) => write!(f, "{id}"),
        }
    }
}

/// The six comparison operators of conditional branches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Ge,
    Gt,
    Le,
}

impl CmpOp {
    /// Whether the operator compares magnitudes, and thus only applies to
    /// integral operands.
    #[must_use]
    pub const fn is_ordering(self) -> bool {
        matches!(self, Self::Lt | Self::Ge | Self::Gt | Self::Le)
    }
}

impl fmt::Display for CmpOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Ge => ">=",
            Self::Gt => ">",
            Self::Le => "<=",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub op: CmpOp,
    pub lhs: Value,
    pub rhs: Value,
}

/// Values bound on method entry or on handler entry.
#[derive(Debug, Clone, PartialEq)]
pub enum IdentitySource {
    This(Type),
    Parameter(usize, Type),
    CaughtException(Type),
}

impl fmt::Display for IdentitySource {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::This(t) => write!(f, "@this: {t}"),
            Self::Parameter(n, t) => write!(f, "@parameter{n}: {t}"),
            Self::CaughtException(t) => write!(f, "@caughtexception: {t}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Identity {
        local: LocalId,
        source: IdentitySource,
    },
    Assign {
        place: Place,
        expr: Expr,
    },
    Invoke(InvokeExpr),
    /// An expression evaluated for its effects only, whose result may be
    /// claimed by a following result move.
    Eval(Expr),
    If {
        cond: Condition,
        target: Target,
    },
    Goto(Target),
    Switch {
        key: Value,
        cases: Vec<(i32, Target)>,
        default: Target,
    },
    Return(Value),
    ReturnVoid,
    Throw(Value),
    EnterMonitor(Value),
    ExitMonitor(Value),
    Nop,
}

/// An operand position of a statement: a use of a value, or the
/// definition of a local.
#[derive(Debug, PartialEq)]
pub enum Slot<U, D> {
    Use(U),
    Def(D),
}

pub type SlotRef<'a> = Slot<&'a Value, &'a LocalId>;
pub type SlotMut<'a> = Slot<&'a mut Value, &'a mut LocalId>;

/// An addressable operand: the `slot`-th entry of the statement
/// [boxes](Stmt::boxes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ValueBox {
    pub stmt: StmtId,
    pub slot: usize,
}

impl ValueBox {
    #[must_use]
    pub const fn new(stmt: StmtId, slot: usize) -> Self {
        Self { stmt, slot }
    }
}

impl fmt::Display for ValueBox {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}#{}", self.stmt, self.slot)
    }
}

// Both enumerations share their body so that shared and mutable boxes
// always come in the same order.
macro_rules! boxes_walkers {
    ($stmt_fn:ident, $expr_fn:ident $(, $m:tt)?) => {
        fn $expr_fn<'a>(
            expr: &'a $($m)? Expr,
            out: &mut Vec<Slot<&'a $($m)? Value, &'a $($m)? LocalId>>,
        ) {
            match expr {
                Expr::Use(v)
                | Expr::Unary(_, v)
                | Expr::Cast(_, v)
                | Expr::InstanceOf(_, v)
                | Expr::Length(v)
                | Expr::NewArray(_, v)
                | Expr::InstanceField(v, _) => out.push(Slot::Use(v)),
                Expr::Binary(_, a, b) | Expr::Cmp(_, a, b) | Expr::ArrayRef(a, b) => {
                    out.push(Slot::Use(a));
                    out.push(Slot::Use(b));
                }
                Expr::FilledArray(_, values) | Expr::Invoke(InvokeExpr { args: values, .. }) => {
                    for v in values {
                        out.push(Slot::Use(v));
                    }
                }
                Expr::New(_) | Expr::StaticField(_) => (),
            }
        }

        fn $stmt_fn<'a>(stmt: &'a $($m)? Stmt) -> Vec<Slot<&'a $($m)? Value, &'a $($m)? LocalId>> {
            let mut out = Vec::new();
            let mut def = None;
            match stmt {
                Stmt::Identity { local, .. } => def = Some(local),
                Stmt::Assign { place, expr } => {
                    match place {
                        Place::Local(local) => def = Some(local),
                        Place::ArrayElement(array, index) => {
                            out.push(Slot::Use(array));
                            out.push(Slot::Use(index));
                        }
                        Place::InstanceField(object, _) => out.push(Slot::Use(object)),
                        Place::StaticField(_) => (),
                    }
                    $expr_fn(expr, &mut out);
                }
                Stmt::Invoke(InvokeExpr { args, .. }) => {
                    for v in args {
                        out.push(Slot::Use(v));
                    }
                }
                Stmt::Eval(expr) => $expr_fn(expr, &mut out),
                Stmt::If {
                    cond: Condition { lhs, rhs, .. },
                    ..
                } => {
                    out.push(Slot::Use(lhs));
                    out.push(Slot::Use(rhs));
                }
                Stmt::Switch { key: v, .. }
                | Stmt::Return(v)
                | Stmt::Throw(v)
                | Stmt::EnterMonitor(v)
                | Stmt::ExitMonitor(v) => out.push(Slot::Use(v)),
                Stmt::Goto(_) | Stmt::ReturnVoid | Stmt::Nop => (),
            }
            out.extend(def.map(Slot::Def));
            out
        }
    };
}

boxes_walkers!(stmt_boxes, expr_boxes);
boxes_walkers!(stmt_boxes_mut, expr_boxes_mut, mut);

impl Stmt {
    /// Enumerates the statement operand positions: uses in operand order,
    /// then the defined local if any.
    #[must_use]
    pub fn boxes(&self) -> Vec<SlotRef<'_>> {
        stmt_boxes(self)
    }

    pub fn boxes_mut(&mut self) -> Vec<SlotMut<'_>> {
        stmt_boxes_mut(self)
    }

    /// The local defined by this statement.
    #[must_use]
    pub fn def(&self) -> Option<LocalId> {
        match self.boxes().last() {
            Some(Slot::Def(local)) => Some(**local),
            _ => None,
        }
    }

    /// Branch targets held by this statement, in order.
    pub fn targets_mut(&mut self) -> Vec<&mut Target> {
        match self {
            Self::If { target, .. } | Self::Goto(target) => vec![target],
            Self::Switch { cases, default, .. } => cases
                .iter_mut()
                .map(|(_, target)| target)
                .chain(std::iter::once(default))
                .collect(),
            _ => Vec::new(),
        }
    }

    #[must_use]
    pub fn targets(&self) -> Vec<Target> {
        match self {
            Self::If { target, .. } | Self::Goto(target) => vec![*target],
            Self::Switch { cases, default, .. } => cases
                .iter()
                .map(|(_, target)| *target)
                .chain(std::iter::once(*default))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Whether control may continue to the next statement.
    #[must_use]
    pub const fn falls_through(&self) -> bool {
        !matches!(
            self,
            Self::Goto(_) | Self::Switch { .. } | Self::Return(_) | Self::ReturnVoid | Self::Throw(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{BinOp, Constant};

    fn local(n: usize) -> Value {
        Value::Local(LocalId(n))
    }

    #[test]
    fn boxes_order() {
        let stmt = Stmt::Assign {
            place: Place::Local(LocalId(2)),
            expr: Expr::Binary(BinOp::Add, local(0), Value::Const(Constant::Int(1))),
        };
        let boxes = stmt.boxes();
        assert_eq!(boxes.len(), 3);
        assert_eq!(boxes[0], Slot::Use(&local(0)));
        assert_eq!(boxes[1], Slot::Use(&Value::Const(Constant::Int(1))));
        assert_eq!(boxes[2], Slot::Def(&LocalId(2)));
        assert_eq!(stmt.def(), Some(LocalId(2)));
    }

    #[test]
    fn boxes_of_stores() {
        let stmt = Stmt::Assign {
            place: Place::ArrayElement(local(1), local(2)),
            expr: Expr::Use(local(0)),
        };
        let uses: Vec<_> = stmt
            .boxes()
            .into_iter()
            .map(|slot| match slot {
                Slot::Use(v) => v.as_local(),
                Slot::Def(_) => None,
            })
            .collect();
        assert_eq!(
            uses,
            vec![Some(LocalId(1)), Some(LocalId(2)), Some(LocalId(0))]
        );
        assert_eq!(stmt.def(), None);
    }

    #[test]
    fn mutable_boxes_match_shared_ones() {
        let mut stmt = Stmt::If {
            cond: Condition {
                op: CmpOp::Lt,
                lhs: local(3),
                rhs: local(4),
            },
            target: Target::Unresolved(Addr(0)),
        };
        assert_eq!(stmt.boxes().len(), stmt.boxes_mut().len());
        if let Some(Slot::Use(v)) = stmt.boxes_mut().into_iter().nth(1) {
            *v = local(7);
        }
        assert_eq!(stmt.boxes()[1], Slot::Use(&local(7)));
    }

    #[test]
    fn switch_targets() {
        let mut stmt = Stmt::Switch {
            key: local(0),
            cases: vec![(1, Target::Unresolved(Addr(4))), (2, Target::Unresolved(Addr(6)))],
            default: Target::Unresolved(Addr(3)),
        };
        assert_eq!(stmt.targets_mut().len(), 3);
        for target in stmt.targets_mut() {
            *target = Target::Stmt(StmtId(0));
        }
        assert_eq!(stmt.targets(), vec![Target::Stmt(StmtId(0)); 3]);
        assert!(!stmt.falls_through());
    }
}
