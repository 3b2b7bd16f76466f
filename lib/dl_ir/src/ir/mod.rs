//! The three-address intermediate representation.
//!
//! A [`Body`] is an ordered list of [`Stmt`]s over register locals. Every
//! operand position of a statement is addressable through a [`ValueBox`],
//! which is what typing constraints are attached to.

mod body;
mod expr;
mod stmt;
mod value;

pub use body::{Body, Trap};
pub use expr::{BinOp, Callee, CmpKind, Expr, InvokeExpr, InvokeKind, Place, UnOp};
pub use stmt::{CmpOp, Condition, IdentitySource, Slot, SlotMut, SlotRef, Stmt, StmtId, Target, ValueBox};
pub use value::{Constant, Local, LocalId, Value};
