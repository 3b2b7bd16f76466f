//! Constraint propagation over webs and literal operands.

use crate::ir::{Body, Local, LocalId, Slot, StmtId, Value, ValueBox};
use crate::repo::SymbolTable;
use crate::typing::constraints::{Constraint, ConstraintCollector, Seed};
use crate::typing::errors::{ConflictSite, TypeError, TypeResult};
use crate::typing::types::RegType;
use crate::typing::webs::Webs;
use crate::typing::TypeAssignment;
use petgraph::graph::{NodeIndex, UnGraph};
use std::collections::{BTreeMap, BTreeSet, VecDeque};

struct Nodes {
    webs: Webs,
    literals: BTreeMap<ValueBox, usize>,
}

impl Nodes {
    fn new(webs: Webs, constraints: &[Constraint], seeds: &[Seed]) -> Self {
        let mut unbound = BTreeSet::new();
        for c in constraints {
            unbound.extend([c.a, c.b].into_iter().filter(|b| webs.web_of(*b).is_none()));
        }
        unbound.extend(
            seeds
                .iter()
                .map(|s| s.at)
                .filter(|b| webs.web_of(*b).is_none()),
        );
        let literals = unbound
            .into_iter()
            .enumerate()
            .map(|(i, at)| (at, webs.len() + i))
            .collect();
        Self { webs, literals }
    }

    fn len(&self) -> usize {
        self.webs.len() + self.literals.len()
    }

    fn node_of(&self, at: ValueBox) -> usize {
        self.webs
            .web_of(at)
            .or_else(|| self.literals.get(&at).copied())
            .unwrap_or_default()
    }

    fn first_box(&self, node: usize) -> ValueBox {
        if node < self.webs.len() {
            self.webs.first_box(node)
        } else {
            self.literals
                .iter()
                .find(|(_, n)| **n == node)
                .map_or(ValueBox::new(StmtId(0), 0), |(at, _)| *at)
        }
    }
}

fn conflict(
    body: &Body,
    first: (ValueBox, &RegType),
    second: (ValueBox, &RegType),
) -> TypeError {
    let site = |(at, hint): (ValueBox, &RegType)| ConflictSite {
        addr: body.addr(at.stmt).unwrap_or_default(),
        stmt: body.display_stmt(at.stmt),
        hint: hint.to_string(),
    };
    TypeError::TypeConflict {
        first: site(first),
        second: site(second),
    }
}

/// Solves the types of `body` locals, splitting registers holding
/// independent values into distinct locals.
pub fn solve(
    body: &mut Body,
    collector: ConstraintCollector,
    symbols: &dyn SymbolTable,
) -> TypeResult<()> {
    let webs = Webs::compute(body)?;
    let (mut constraints, mut seeds) = collector.into_parts();
    constraints.sort_unstable();
    constraints.dedup();
    seeds.sort_by_key(|seed| seed.at);

    let nodes = Nodes::new(webs, &constraints, &seeds);
    let mut graph: UnGraph<(), ()> = UnGraph::with_capacity(nodes.len(), constraints.len());
    for _ in 0..nodes.len() {
        graph.add_node(());
    }
    for c in &constraints {
        let (a, b) = (nodes.node_of(c.a), nodes.node_of(c.b));
        if a != b {
            graph.update_edge(NodeIndex::new(a), NodeIndex::new(b), ());
        }
    }

    let mut hints = vec![RegType::Top; nodes.len()];
    let mut origins: Vec<ValueBox> = (0..nodes.len()).map(|n| nodes.first_box(n)).collect();
    for seed in &seeds {
        let node = nodes.node_of(seed.at);
        match hints[node].merge(&seed.hint, symbols) {
            Some(hint) => {
                if hint != hints[node] {
                    hints[node] = hint;
                    origins[node] = seed.at;
                }
            }
            None => {
                return Err(conflict(
                    body,
                    (origins[node], &hints[node]),
                    (seed.at, &seed.hint),
                ))
            }
        }
    }

    let mut worklist: VecDeque<usize> = (0..nodes.len()).filter(|n| !hints[*n].is_top()).collect();
    let mut queued: Vec<bool> = hints.iter().map(|hint| !hint.is_top()).collect();
    let mut iterations = 0;
    while let Some(node) = worklist.pop_front() {
        queued[node] = false;
        iterations += 1;
        let neighbors: Vec<usize> = graph
            .neighbors(NodeIndex::new(node))
            .map(NodeIndex::index)
            .collect();
        for next in neighbors {
            let merged = hints[next].merge(&hints[node], symbols).ok_or_else(|| {
                conflict(
                    body,
                    (origins[next], &hints[next]),
                    (origins[node], &hints[node]),
                )
            })?;
            if merged != hints[next] {
                hints[next] = merged;
                origins[next] = origins[node];
                if !queued[next] {
                    queued[next] = true;
                    worklist.push_back(next);
                }
            }
        }
    }
    log::debug!(
        "{} typing nodes stable after {iterations} iterations",
        nodes.len()
    );

    let webs = &nodes.webs;
    let mut web_types = Vec::with_capacity(webs.len());
    for (web, hint) in hints.iter().take(webs.len()).enumerate() {
        let local = body
            .local(webs.local(web))
            .map_or_else(|| webs.local(web).to_string(), Local::to_string);
        let ty = hint
            .default_type()
            .ok_or_else(|| TypeError::Untypable(local.clone()))?;
        if !matches!(hint, RegType::Concrete(_)) {
            log::warn!("{}: defaulting {local} from {hint} to {ty}", body.method);
        }
        web_types.push(ty);
    }

    // the first web of a register keeps its local, the following ones get
    // fresh versions
    let mut web_locals = Vec::with_capacity(webs.len());
    let mut versions: BTreeMap<LocalId, usize> = BTreeMap::new();
    let mut split = 0;
    for web in 0..webs.len() {
        let original = webs.local(web);
        let version = versions.entry(original).or_insert(0);
        if *version == 0 {
            web_locals.push(original);
        } else {
            let reg = body.locals[original.0].reg;
            split += 1;
            web_locals.push(LocalId(body.locals.len()));
            body.locals.push(Local {
                reg,
                version: *version,
            });
        }
        *version += 1;
    }
    if split > 0 {
        log::debug!("{}: {split} register locals split", body.method);
    }

    for (i, stmt) in body.stmts.iter_mut().enumerate() {
        for (slot, operand) in stmt.boxes_mut().into_iter().enumerate() {
            let Some(web) = webs.web_of(ValueBox::new(StmtId(i), slot)) else {
                continue;
            };
            match operand {
                Slot::Use(Value::Local(id)) | Slot::Def(id) => *id = web_locals[web],
                Slot::Use(Value::Const(_)) => (),
            }
        }
    }

    let mut assignment = TypeAssignment::default();
    for (web, ty) in web_types.into_iter().enumerate() {
        assignment.insert(web_locals[web], ty);
    }
    body.types = Some(assignment);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::decode_method;
    use crate::errors::IrError;
    use crate::testing::{pools, static_method};
    use crate::unit::LiftOptions;
    use crate::lift_method;
    use dl_bytecode::instrs::Instr;
    use dl_bytecode::pools::Index;
    use dl_bytecode::registers::Reg;
    use dl_bytecode::types::Type;

    fn r(n: u8) -> Reg {
        Reg::from(n)
    }

    fn decoded(descriptor: &str, registers: u16, instrs: &[Instr]) -> (Body, ConstraintCollector) {
        let method = static_method(descriptor, registers, instrs);
        let (body, collector) = decode_method(&method, &pools(), LiftOptions::default()).unwrap();
        (body, collector.unwrap())
    }

    #[test]
    fn constraint_order_does_not_matter() {
        let instrs = [
            Instr::Const4(r(0), 0),
            Instr::IfEqz(r(2), 4),
            Instr::Move(r(0), r(2)),
            Instr::Goto(3),
            Instr::AddIntLit8(r(0), r(2), 1),
            Instr::Move(r(1), r(0)),
            Instr::Return(r(1)),
        ];
        let (body, collector) = decoded("(C)I", 3, &instrs);

        let mut reversed = ConstraintCollector::new();
        let constraints: Vec<_> = collector.iter_constraints().copied().collect();
        let seeds: Vec<_> = collector.iter_seeds().cloned().collect();
        for c in constraints.iter().rev() {
            reversed.constrain(c.b, c.a);
        }
        for seed in seeds.into_iter().rev() {
            reversed.seed(seed.at, seed.hint);
        }

        let pools = pools();
        let mut first = body.clone();
        let mut second = body;
        solve(&mut first, collector, &pools).unwrap();
        solve(&mut second, reversed, &pools).unwrap();
        assert_eq!(first.types, second.types);
        assert_eq!(first.to_string(), second.to_string());
    }

    #[test]
    fn int_float_conflict() {
        let method = static_method(
            "()V",
            3,
            &[
                Instr::Const4(r(0), 1),
                Instr::AddInt(r(1), r(0), r(0)),
                Instr::AddFloat(r(2), r(0), r(0)),
                Instr::ReturnVoid,
            ],
        );
        let err = lift_method(&method, &pools(), LiftOptions::default()).unwrap_err();
        let IrError::Typing(TypeError::TypeConflict { first, second }) = err else {
            panic!("expected a conflict, got {err}");
        };
        let hints = [first.hint.as_str(), second.hint.as_str()];
        assert!(hints.contains(&"I") && hints.contains(&"F"));
    }

    #[test]
    fn reused_register_is_split() {
        let method = static_method(
            "()Ljava/lang/String;",
            2,
            &[
                Instr::Const4(r(0), 1),
                Instr::AddInt(r(1), r(0), r(0)),
                Instr::ConstString(r(0), Index::new(0)),
                Instr::ReturnObject(r(0)),
            ],
        );
        let body = lift_method(&method, &pools(), LiftOptions::default()).unwrap();
        assert_eq!(body.locals.len(), 3);
        let names: Vec<String> = body.locals.iter().map(ToString::to_string).collect();
        assert_eq!(names, vec!["v0", "v1", "v0_1"]);
        assert_eq!(body.type_of(LocalId(0)), Some(&Type::Int));
        assert_eq!(body.type_of(LocalId(1)), Some(&Type::Int));
        assert_eq!(
            body.type_of(LocalId(2)),
            Some(&Type::class("java/lang/String"))
        );
        assert!(matches!(
            &body.stmts[3],
            crate::ir::Stmt::Return(Value::Local(LocalId(2)))
        ));
    }

    #[test]
    fn undefined_register() {
        let method = static_method("()I", 1, &[Instr::Return(r(0))]);
        assert!(matches!(
            lift_method(&method, &pools(), LiftOptions::default()),
            Err(IrError::Typing(TypeError::UndefinedRegister { .. }))
        ));
    }

    #[test]
    fn untypable_without_seeds() {
        let (mut body, _) = decoded(
            "(II)I",
            3,
            &[
                Instr::AddInt(r(0), r(1), r(2)),
                Instr::Return(r(0)),
            ],
        );
        assert!(matches!(
            solve(&mut body, ConstraintCollector::new(), &pools()),
            Err(TypeError::Untypable(_))
        ));
    }

    #[test]
    fn partial_hints_default() {
        let method = static_method(
            "()V",
            3,
            &[
                Instr::Const4(r(0), 0),
                Instr::ConstWide16(r(1), 3),
                Instr::ReturnVoid,
            ],
        );
        let body = lift_method(&method, &pools(), LiftOptions::default()).unwrap();
        assert_eq!(body.type_of(LocalId(0)), Some(&Type::Int));
        assert_eq!(body.type_of(LocalId(1)), Some(&Type::Long));
    }
}
