//! Typing facts gathered while decoding a body.

use crate::ir::{StmtId, ValueBox};
use crate::typing::types::RegType;

/// Two operand positions that must hold values of the same type.
///
/// Constraints are unordered: `(a, b)` and `(b, a)` are the same
/// constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Constraint {
    pub a: ValueBox,
    pub b: ValueBox,
}

impl Constraint {
    #[must_use]
    pub fn new(a: ValueBox, b: ValueBox) -> Self {
        if a <= b {
            Self { a, b }
        } else {
            Self { a: b, b: a }
        }
    }
}

/// A statically known type hint for an operand position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Seed {
    pub at: ValueBox,
    pub hint: RegType,
}

/// Collects constraints and seeds for one body.
///
/// The collector is consumed by the solver once the body is linked.
#[derive(Debug, Default)]
pub struct ConstraintCollector {
    constraints: Vec<Constraint>,
    seeds: Vec<Seed>,
}

impl ConstraintCollector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `a` and `b` hold values of the same type.
    pub fn constrain(&mut self, a: ValueBox, b: ValueBox) {
        if a != b {
            self.constraints.push(Constraint::new(a, b));
        }
    }

    /// Records a statically known hint for `at`.
    pub fn seed<H: Into<RegType>>(&mut self, at: ValueBox, hint: H) {
        let hint = hint.into();
        if !hint.is_top() {
            self.seeds.push(Seed { at, hint });
        }
    }

    #[inline]
    pub fn iter_constraints(&self) -> impl Iterator<Item = &Constraint> {
        self.constraints.iter()
    }

    #[inline]
    pub fn iter_seeds(&self) -> impl Iterator<Item = &Seed> {
        self.seeds.iter()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty() && self.seeds.is_empty()
    }

    /// Follows a renumbering of the body statements (`remap[old]` is the
    /// new id), dropping the facts about removed statements.
    pub(crate) fn renumber(&mut self, remap: &[Option<StmtId>]) {
        let moved = |at: ValueBox| {
            remap
                .get(at.stmt.0)
                .copied()
                .flatten()
                .map(|stmt| ValueBox::new(stmt, at.slot))
        };
        self.constraints = self
            .constraints
            .iter()
            .filter_map(|c| Some(Constraint::new(moved(c.a)?, moved(c.b)?)))
            .collect();
        self.seeds = std::mem::take(&mut self.seeds)
            .into_iter()
            .filter_map(|seed| {
                Some(Seed {
                    at: moved(seed.at)?,
                    hint: seed.hint,
                })
            })
            .collect();
    }

    pub(crate) fn into_parts(self) -> (Vec<Constraint>, Vec<Seed>) {
        (self.constraints, self.seeds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unordered_constraints() {
        let a = ValueBox::new(StmtId(3), 0);
        let b = ValueBox::new(StmtId(1), 2);
        assert_eq!(Constraint::new(a, b), Constraint::new(b, a));
        let mut collector = ConstraintCollector::new();
        collector.constrain(a, a);
        collector.seed(a, RegType::Top);
        assert!(collector.is_empty());
        collector.constrain(a, b);
        collector.seed(b, RegType::Wide);
        assert_eq!(collector.iter_constraints().count(), 1);
        assert_eq!(collector.iter_seeds().next().map(|s| s.at), Some(b));
    }
}
