//! Splitting register locals into webs of related definitions and uses.
//!
//! A register reused for unrelated values (the receiver register holding
//! an integer later on, for instance) must not be typed as a single value.
//! A web is a maximal set of definitions and uses connected through
//! reaching definitions: each use belongs to the same web as every
//! definition that may reach it.

use crate::controlflow::{Edge, StmtGraph};
use crate::ir::{Body, LocalId, Slot, StmtId, ValueBox};
use crate::typing::errors::{TypeError, TypeResult};
use fixedbitset::FixedBitSet;
use petgraph::unionfind::UnionFind;
use std::collections::{BTreeMap, HashMap, VecDeque};

#[derive(Debug)]
struct LocalBox {
    at: ValueBox,
    local: LocalId,
    is_def: bool,
}

#[derive(Debug)]
pub struct Webs {
    web_of: HashMap<ValueBox, usize>,
    locals: Vec<LocalId>,
    first_boxes: Vec<ValueBox>,
}

impl Webs {
    /// Computes the webs of every local of `body`.
    pub fn compute(body: &Body) -> TypeResult<Self> {
        let graph = StmtGraph::build(body);

        let mut boxes = Vec::new();
        for (id, stmt) in body.iter_stmts() {
            for (slot, operand) in stmt.boxes().into_iter().enumerate() {
                let at = ValueBox::new(id, slot);
                match operand {
                    Slot::Use(value) => {
                        if let Some(local) = value.as_local() {
                            boxes.push(LocalBox {
                                at,
                                local,
                                is_def: false,
                            });
                        }
                    }
                    Slot::Def(local) => boxes.push(LocalBox {
                        at,
                        local: *local,
                        is_def: true,
                    }),
                }
            }
        }

        // definitions are numbered in box order
        let defs: Vec<usize> = (0..boxes.len()).filter(|i| boxes[*i].is_def).collect();
        let mut stmt_def: BTreeMap<StmtId, usize> = BTreeMap::new();
        let mut local_defs: BTreeMap<LocalId, FixedBitSet> = BTreeMap::new();
        for (d, b) in defs.iter().enumerate() {
            let lbox = &boxes[*b];
            stmt_def.insert(lbox.at.stmt, d);
            local_defs
                .entry(lbox.local)
                .or_insert_with(|| FixedBitSet::with_capacity(defs.len()))
                .insert(d);
        }

        let reaching = reaching_definitions(body, &graph, &boxes, &defs, &stmt_def, &local_defs);

        let mut sets = UnionFind::<usize>::new(boxes.len());
        let empty = FixedBitSet::with_capacity(defs.len());
        for (i, lbox) in boxes.iter().enumerate() {
            if lbox.is_def {
                continue;
            }
            let Some(entry) = &reaching[lbox.at.stmt.0] else {
                log::debug!("unreachable use at {}", lbox.at);
                continue;
            };
            let mut reaching_local = entry.clone();
            reaching_local.intersect_with(local_defs.get(&lbox.local).unwrap_or(&empty));
            if reaching_local.count_ones(..) == 0 {
                let reg = body
                    .local(lbox.local)
                    .map(|local| local.reg)
                    .unwrap_or_default();
                return Err(TypeError::UndefinedRegister {
                    addr: body.addr(lbox.at.stmt).unwrap_or_default(),
                    reg,
                });
            }
            for d in reaching_local.ones() {
                sets.union(i, defs[d]);
            }
        }

        let mut web_of = HashMap::new();
        let mut locals = Vec::new();
        let mut first_boxes = Vec::new();
        let mut numbering = HashMap::new();
        for (i, lbox) in boxes.iter().enumerate() {
            let root = sets.find(i);
            let web = *numbering.entry(root).or_insert_with(|| {
                locals.push(lbox.local);
                first_boxes.push(lbox.at);
                locals.len() - 1
            });
            web_of.insert(lbox.at, web);
        }
        log::debug!("{} local boxes grouped into {} webs", boxes.len(), locals.len());

        Ok(Self {
            web_of,
            locals,
            first_boxes,
        })
    }

    /// The web an operand position belongs to, `None` for literals.
    #[must_use]
    pub fn web_of(&self, at: ValueBox) -> Option<usize> {
        self.web_of.get(&at).copied()
    }

    /// The original local of a web.
    #[must_use]
    pub fn local(&self, web: usize) -> LocalId {
        self.locals[web]
    }

    /// The first operand position of a web, in statement order.
    #[must_use]
    pub fn first_box(&self, web: usize) -> ValueBox {
        self.first_boxes[web]
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.locals.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locals.is_empty()
    }
}

// Forward may-reach analysis. Returns the set of definitions reaching the
// entry of each statement, `None` for unreachable statements.
fn reaching_definitions(
    body: &Body,
    graph: &StmtGraph,
    boxes: &[LocalBox],
    defs: &[usize],
    stmt_def: &BTreeMap<StmtId, usize>,
    local_defs: &BTreeMap<LocalId, FixedBitSet>,
) -> Vec<Option<FixedBitSet>> {
    let n = body.stmts.len();
    let mut entries: Vec<Option<FixedBitSet>> = vec![None; n];
    let mut exits: Vec<FixedBitSet> = vec![FixedBitSet::with_capacity(defs.len()); n];

    let mut worklist: VecDeque<StmtId> = VecDeque::new();
    let mut queued = vec![false; n];
    if n > 0 {
        worklist.push_back(StmtId(0));
        queued[0] = true;
    }
    let order: HashMap<StmtId, usize> = graph
        .reverse_postorder()
        .into_iter()
        .enumerate()
        .map(|(i, id)| (id, i))
        .collect();

    let mut iterations = 0;
    while let Some(id) = worklist.pop_front() {
        queued[id.0] = false;
        iterations += 1;

        let mut entry = FixedBitSet::with_capacity(defs.len());
        for (pred, edge) in graph.predecessors(id) {
            match edge {
                Edge::Exceptional => {
                    if let Some(pred_entry) = &entries[pred.0] {
                        entry.union_with(pred_entry);
                    }
                }
                Edge::Sequence | Edge::Branch => {
                    if entries[pred.0].is_some() {
                        entry.union_with(&exits[pred.0]);
                    }
                }
            }
        }
        if entries[id.0].as_ref() == Some(&entry) {
            continue;
        }

        let mut exit = entry.clone();
        if let Some(d) = stmt_def.get(&id) {
            let local = boxes[defs[*d]].local;
            if let Some(kill) = local_defs.get(&local) {
                exit.difference_with(kill);
            }
            exit.insert(*d);
        }
        entries[id.0] = Some(entry);
        exits[id.0] = exit;

        let mut succs: Vec<StmtId> = graph.successors(id).map(|(succ, _)| succ).collect();
        succs.sort_by_key(|succ| order.get(succ).copied().unwrap_or(usize::MAX));
        for succ in succs {
            if !queued[succ.0] {
                queued[succ.0] = true;
                worklist.push_back(succ);
            }
        }
    }
    log::debug!("reaching definitions stable after {iterations} iterations");

    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::decode_method;
    use crate::repo::AccessFlags;
    use crate::testing::{method, pools, static_method};
    use crate::unit::LiftOptions;
    use dl_bytecode::code::{CatchHandler, TryItem};
    use dl_bytecode::instrs::Instr;
    use dl_bytecode::pools::Index;
    use dl_bytecode::registers::{Reg, RegList};
    use dl_bytecode::Addr;

    fn r(n: u8) -> Reg {
        Reg::from(n)
    }

    fn at(stmt: usize, slot: usize) -> ValueBox {
        ValueBox::new(StmtId(stmt), slot)
    }

    #[test]
    fn definitions_merged_at_join() {
        let method = static_method(
            "(Z)I",
            2,
            &[
                Instr::IfEqz(r(1), 4),
                Instr::Const4(r(0), 1),
                Instr::Goto(2),
                Instr::Const4(r(0), 2),
                Instr::Return(r(0)),
            ],
        );
        let (body, _) = decode_method(&method, &pools(), LiftOptions::default()).unwrap();
        let webs = Webs::compute(&body).unwrap();
        assert_eq!(webs.len(), 2);
        assert_eq!(webs.web_of(at(2, 1)), webs.web_of(at(4, 1)));
        assert_eq!(webs.web_of(at(2, 1)), webs.web_of(at(5, 0)));
        assert_ne!(webs.web_of(at(0, 0)), webs.web_of(at(5, 0)));
        // literal operands belong to no web
        assert_eq!(webs.web_of(at(2, 0)), None);
    }

    #[test]
    fn handlers_see_definitions_before_throwing_statement() {
        let tries = vec![TryItem {
            start: Addr(1),
            count: 3,
            handler: CatchHandler {
                catches: Vec::new(),
                catch_all: Some(Addr(6)),
            },
        }];
        let method = method(
            "test",
            "()I",
            AccessFlags::ACC_STATIC,
            1,
            &[
                Instr::Const4(r(0), 1),
                Instr::InvokeStatic(RegList::from(Vec::<u8>::new()), Index::new(0)),
                Instr::MoveResult(r(0)),
                Instr::Return(r(0)),
                Instr::Return(r(0)),
            ],
            tries,
        );
        let (body, _) = decode_method(&method, &pools(), LiftOptions::default()).unwrap();
        let webs = Webs::compute(&body).unwrap();
        assert_eq!(webs.len(), 2);
        assert_eq!(webs.web_of(at(0, 1)), webs.web_of(at(3, 0)));
        assert_eq!(webs.web_of(at(1, 0)), webs.web_of(at(2, 0)));
        assert_ne!(webs.web_of(at(0, 1)), webs.web_of(at(1, 0)));
        assert_eq!(webs.local(0), webs.local(1));
    }
}
