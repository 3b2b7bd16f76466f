//! Statement level control flow graph.

use crate::ir::{Body, StmtId, Target};
use petgraph::dot::{Config, Dot};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::{Dfs, DfsPostOrder, EdgeRef};
use petgraph::Direction;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Sequence,
    Branch,
    /// From a statement that may throw to a handler protecting it. Values
    /// flowing along this edge are the ones before the statement executes.
    Exceptional,
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Sequence => write!(f, "<seq>"),
            Self::Branch => write!(f, "<jmp>"),
            Self::Exceptional => write!(f, "<catch>"),
        }
    }
}

#[derive(Debug)]
pub struct StmtGraph {
    inner: DiGraph<StmtId, Edge>,
}

impl StmtGraph {
    #[must_use]
    pub fn build(body: &Body) -> Self {
        let mut graph = DiGraph::with_capacity(body.stmts.len(), body.stmts.len());
        for (id, _) in body.iter_stmts() {
            graph.add_node(id);
        }
        for (id, stmt) in body.iter_stmts() {
            let src = NodeIndex::new(id.0);
            for target in stmt.targets() {
                if let Target::Stmt(dst) = target {
                    graph.update_edge(src, NodeIndex::new(dst.0), Edge::Branch);
                }
            }
            if stmt.falls_through() && id.0 + 1 < body.stmts.len() {
                graph.update_edge(src, NodeIndex::new(id.0 + 1), Edge::Sequence);
            }
            if body.can_throw(id) {
                for trap in body.traps.iter().filter(|trap| trap.covers(id)) {
                    graph.update_edge(src, NodeIndex::new(trap.handler.0), Edge::Exceptional);
                }
            }
        }
        Self { inner: graph }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.node_count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.node_count() == 0
    }

    pub fn successors(&self, id: StmtId) -> impl Iterator<Item = (StmtId, Edge)> + '_ {
        self.inner
            .edges_directed(NodeIndex::new(id.0), Direction::Outgoing)
            .map(|edge| (self.inner[edge.target()], *edge.weight()))
    }

    pub fn predecessors(&self, id: StmtId) -> impl Iterator<Item = (StmtId, Edge)> + '_ {
        self.inner
            .edges_directed(NodeIndex::new(id.0), Direction::Incoming)
            .map(|edge| (self.inner[edge.source()], *edge.weight()))
    }

    /// Flags the statements reachable from the entry, exceptional edges
    /// included.
    #[must_use]
    pub fn reachable(&self) -> Vec<bool> {
        let mut seen = vec![false; self.len()];
        if self.is_empty() {
            return seen;
        }
        let mut dfs = Dfs::new(&self.inner, NodeIndex::new(0));
        while let Some(node) = dfs.next(&self.inner) {
            seen[node.index()] = true;
        }
        seen
    }

    /// Statements in reverse postorder from the entry, followed by the
    /// unreachable ones in body order.
    #[must_use]
    pub fn reverse_postorder(&self) -> Vec<StmtId> {
        let mut order = Vec::with_capacity(self.len());
        if self.is_empty() {
            return order;
        }
        let mut visited = vec![false; self.len()];
        let mut postorder = DfsPostOrder::new(&self.inner, NodeIndex::new(0));
        while let Some(node) = postorder.next(&self.inner) {
            visited[node.index()] = true;
            order.push(self.inner[node]);
        }
        order.reverse();
        order.extend(
            visited
                .iter()
                .enumerate()
                .filter(|(_, seen)| !**seen)
                .map(|(i, _)| StmtId(i)),
        );
        order
    }

    #[must_use]
    pub fn to_dot(&self, body: &Body) -> String {
        let edge_attrs = |_, edge: petgraph::graph::EdgeReference<'_, Edge>| {
            let color = match edge.weight() {
                Edge::Sequence => "black",
                Edge::Branch => "blue",
                Edge::Exceptional => "orchid",
            };
            format!("color={color}")
        };
        let node_attrs = |_, (_, id): (_, &StmtId)| {
            let addr = body.addr(*id).map(|a| a.to_string()).unwrap_or_default();
            format!("shape=box,label=\"{addr} {id}\"")
        };
        let dot = Dot::with_attr_getters(
            &self.inner,
            &[Config::GraphContentOnly, Config::EdgeNoLabel, Config::NodeNoLabel],
            &edge_attrs,
            &node_attrs,
        );
        format!("digraph {{\n{dot}}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{CmpOp, Condition, Constant, Stmt, Trap, Value};
    use dl_bytecode::pools::{MethodRef, ProtoRef};
    use dl_bytecode::types::Type;
    use dl_bytecode::Addr;

    fn body(stmts: Vec<Stmt>, traps: Vec<Trap>) -> Body {
        let n = stmts.len();
        Body {
            method: MethodRef {
                class: Type::class("a/B"),
                name: "m".to_string(),
                proto: ProtoRef {
                    params: vec![],
                    ret: Type::Void,
                },
            },
            locals: Vec::new(),
            stmts,
            addrs: (0..n).map(Addr).collect(),
            throwing: vec![true; n],
            traps,
            types: None,
        }
    }

    #[test]
    fn edges() {
        let zero = Value::Const(Constant::Int(0));
        let body = body(
            vec![
                Stmt::If {
                    cond: Condition {
                        op: CmpOp::Eq,
                        lhs: zero.clone(),
                        rhs: zero.clone(),
                    },
                    target: Target::Stmt(StmtId(2)),
                },
                Stmt::Throw(zero),
                Stmt::ReturnVoid,
                Stmt::Goto(Target::Stmt(StmtId(2))),
            ],
            vec![Trap {
                start: StmtId(1),
                end: StmtId(2),
                handler: StmtId(2),
                exception: None,
            }],
        );
        let graph = StmtGraph::build(&body);
        let mut succs: Vec<_> = graph.successors(StmtId(0)).collect();
        succs.sort_by_key(|(id, _)| *id);
        assert_eq!(
            succs,
            vec![(StmtId(1), Edge::Sequence), (StmtId(2), Edge::Branch)]
        );
        assert_eq!(
            graph.successors(StmtId(1)).collect::<Vec<_>>(),
            vec![(StmtId(2), Edge::Exceptional)]
        );
        assert_eq!(graph.successors(StmtId(2)).count(), 0);
        assert_eq!(
            graph.reverse_postorder(),
            vec![StmtId(0), StmtId(1), StmtId(2), StmtId(3)]
        );
        assert_eq!(graph.predecessors(StmtId(2)).count(), 3);
        assert_eq!(graph.reachable(), vec![true, true, true, false]);

        let dot = graph.to_dot(&body);
        assert!(dot.starts_with("digraph {\n"));
        assert!(dot.ends_with('}'));
        assert!(dot.contains("label=\"0003 [3]\""));
        assert!(dot.contains("color=orchid"));
        assert!(dot.contains("color=blue"));
    }
}
