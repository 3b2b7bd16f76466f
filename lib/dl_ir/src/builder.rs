//! Two-phase body construction: statements are appended while decoding,
//! branch targets are resolved once every statement exists.

use crate::errors::{IrError, IrResult};
use crate::ir::{Body, Local, Stmt, StmtId, Target, Trap};
use dl_bytecode::pools::MethodRef;
use dl_bytecode::types::Type;
use dl_bytecode::Addr;
use std::collections::BTreeMap;

/// An exception range in bytecode addresses, before linking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrapRange {
    pub start: Addr,
    pub end: Addr,
    pub handler: Addr,
    pub exception: Option<Type>,
}

#[derive(Debug, Default)]
pub struct BodyBuilder {
    stmts: Vec<Stmt>,
    addrs: Vec<Addr>,
    throwing: Vec<bool>,
    by_addr: BTreeMap<Addr, StmtId>,
    placeholders: usize,
}

fn offset_between(from: Addr, to: Addr) -> i64 {
    // addresses are bounded by the 32-bit instructions array size
    to.0 as i64 - from.0 as i64
}

impl BodyBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a statement lifted from the instruction at `addr`. The first
    /// statement of an address is the one branches to it land on.
    pub fn push(&mut self, addr: Addr, stmt: Stmt, throws: bool) -> StmtId {
        let id = StmtId(self.stmts.len());
        self.stmts.push(stmt);
        self.addrs.push(addr);
        self.throwing.push(throws);
        self.by_addr.entry(addr).or_insert(id);
        id
    }

    /// Appends a method entry statement, which no branch can target.
    pub fn push_entry(&mut self, stmt: Stmt) -> StmtId {
        let id = StmtId(self.stmts.len());
        self.stmts.push(stmt);
        self.addrs.push(Addr::entry());
        self.throwing.push(false);
        id
    }

    /// Returns a target for a branch at `branch` jumping `offset` code
    /// units away, to be resolved by [`link`](Self::link).
    pub fn placeholder(&mut self, branch: Addr, offset: i32) -> IrResult<Target> {
        let target = branch
            .offset_by(offset)
            .ok_or(IrError::UnresolvedTarget {
                branch,
                offset: i64::from(offset),
            })?;
        self.placeholders += 1;
        Ok(Target::Unresolved(target))
    }

    /// Returns a target to the instruction at `addr`.
    pub fn placeholder_at(&mut self, addr: Addr) -> Target {
        self.placeholders += 1;
        Target::Unresolved(addr)
    }

    #[must_use]
    pub fn last(&self) -> Option<(StmtId, &Stmt)> {
        self.stmts.last().map(|s| (StmtId(self.stmts.len() - 1), s))
    }

    /// Address of the last statement pushed.
    #[must_use]
    pub fn last_addr(&self) -> Option<Addr> {
        self.addrs.last().copied()
    }

    #[must_use]
    pub fn stmt(&self, id: StmtId) -> Option<&Stmt> {
        self.stmts.get(id.0)
    }

    /// Replaces an already pushed statement.
    pub fn replace(&mut self, id: StmtId, stmt: Stmt) {
        if let Some(slot) = self.stmts.get_mut(id.0) {
            *slot = stmt;
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.stmts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stmts.is_empty()
    }

    fn resolve(&self, target: Addr) -> Option<StmtId> {
        self.by_addr.get(&target).copied()
    }

    /// Resolves every outstanding target and exception range, producing the
    /// final body.
    pub fn link(
        mut self,
        method: MethodRef,
        locals: Vec<Local>,
        traps: &[TrapRange],
    ) -> IrResult<Body> {
        log::debug!(
            "linking {} statements, {} branch targets",
            self.stmts.len(),
            self.placeholders
        );

        let mut resolved = Vec::with_capacity(self.stmts.len());
        for (i, stmt) in self.stmts.iter().enumerate() {
            let mut targets = Vec::new();
            for target in stmt.targets() {
                match target {
                    Target::Unresolved(addr) => {
                        let id = self.resolve(addr).ok_or(IrError::UnresolvedTarget {
                            branch: self.addrs[i],
                            offset: offset_between(self.addrs[i], addr),
                        })?;
                        targets.push(Target::Stmt(id));
                    }
                    Target::Stmt(id) => targets.push(Target::Stmt(id)),
                }
            }
            resolved.push(targets);
        }
        for (stmt, targets) in self.stmts.iter_mut().zip(resolved) {
            for (slot, target) in stmt.targets_mut().into_iter().zip(targets) {
                *slot = target;
            }
        }

        let mut body_traps = Vec::new();
        for range in traps {
            let start = self.by_addr.range(range.start..).next().map(|(_, id)| *id);
            let end = self
                .by_addr
                .range(range.end..)
                .next()
                .map_or(StmtId(self.stmts.len()), |(_, id)| *id);
            let Some(start) = start.filter(|start| *start < end) else {
                log::debug!("skipping empty exception range {}..{}", range.start, range.end);
                continue;
            };
            let handler = self.resolve(range.handler).ok_or(IrError::UnresolvedTarget {
                branch: range.start,
                offset: offset_between(range.start, range.handler),
            })?;
            body_traps.push(Trap {
                start,
                end,
                handler,
                exception: range.exception.clone(),
            });
        }

        Ok(Body {
            method,
            locals,
            stmts: self.stmts,
            addrs: self.addrs,
            throwing: self.throwing,
            traps: body_traps,
            types: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Constant, Value};
    use dl_bytecode::pools::ProtoRef;

    fn method() -> MethodRef {
        MethodRef {
            class: Type::class("a/B"),
            name: "m".to_string(),
            proto: ProtoRef {
                params: vec![],
                ret: Type::Void,
            },
        }
    }

    #[test]
    fn forward_and_backward_targets() {
        let mut builder = BodyBuilder::new();
        let back = builder.placeholder(Addr(2), -2).unwrap();
        builder.push(Addr(0), Stmt::Nop, false);
        let fwd = builder.placeholder(Addr(1), 3).unwrap();
        builder.push(Addr(1), Stmt::Goto(fwd), false);
        builder.push(Addr(2), Stmt::Goto(back), false);
        builder.push(Addr(4), Stmt::ReturnVoid, false);
        let body = builder.link(method(), Vec::new(), &[]).unwrap();
        assert_eq!(body.stmts[1], Stmt::Goto(Target::Stmt(StmtId(3))));
        assert_eq!(body.stmts[2], Stmt::Goto(Target::Stmt(StmtId(0))));
    }

    #[test]
    fn target_before_entry() {
        let mut builder = BodyBuilder::new();
        assert!(matches!(
            builder.placeholder(Addr(1), -2),
            Err(IrError::UnresolvedTarget {
                branch: Addr(1),
                offset: -2
            })
        ));
    }

    #[test]
    fn target_inside_instruction() {
        let mut builder = BodyBuilder::new();
        let target = builder.placeholder(Addr(0), 1).unwrap();
        builder.push(Addr(0), Stmt::Goto(target), false);
        builder.push(Addr(2), Stmt::ReturnVoid, false);
        assert!(matches!(
            builder.link(method(), Vec::new(), &[]),
            Err(IrError::UnresolvedTarget {
                branch: Addr(0),
                offset: 1
            })
        ));
    }

    #[test]
    fn entry_statements_are_not_targets() {
        let mut builder = BodyBuilder::new();
        builder.push_entry(Stmt::Nop);
        let target = builder.placeholder(Addr(0), 0).unwrap();
        builder.push(Addr(0), Stmt::Goto(target), false);
        let body = builder.link(method(), Vec::new(), &[]).unwrap();
        assert_eq!(body.stmts[1], Stmt::Goto(Target::Stmt(StmtId(1))));
    }

    #[test]
    fn traps() {
        let mut builder = BodyBuilder::new();
        builder.push(Addr(0), Stmt::Nop, false);
        builder.push(
            Addr(1),
            Stmt::Throw(Value::Const(Constant::Int(0))),
            true,
        );
        builder.push(Addr(2), Stmt::ReturnVoid, false);
        let ranges = vec![
            TrapRange {
                start: Addr(1),
                end: Addr(2),
                handler: Addr(2),
                exception: None,
            },
            TrapRange {
                start: Addr(3),
                end: Addr(5),
                handler: Addr(2),
                exception: None,
            },
        ];
        let body = builder.link(method(), Vec::new(), &ranges).unwrap();
        assert_eq!(
            body.traps,
            vec![Trap {
                start: StmtId(1),
                end: StmtId(2),
                handler: StmtId(2),
                exception: None
            }]
        );
        assert!(body.can_throw(StmtId(1)));
    }
}
