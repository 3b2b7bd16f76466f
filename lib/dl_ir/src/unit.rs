//! Translation units: the bodies of a set of methods lifted together.
//!
//! A unit decodes all its bodies first, then solves their types. Both
//! phases run in parallel over the bodies; solving only starts once every
//! body has been decoded and linked.

use crate::decoder::decode_method;
use crate::errors::{IrError, IrResult};
use crate::ir::Body;
use crate::repo::{MethodDef, SymbolTable};
use crate::typing;
use rayon::prelude::*;
use std::collections::BTreeMap;

/// Lifting options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiftOptions {
    typing: bool,
}

impl Default for LiftOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl LiftOptions {
    /// Options with typing enabled.
    #[must_use]
    pub const fn new() -> Self {
        Self { typing: true }
    }

    /// Bodies are decoded only, their locals stay untyped.
    #[must_use]
    pub const fn without_typing(self) -> Self {
        self.with_typing(false)
    }

    #[must_use]
    pub const fn with_typing(mut self, typing: bool) -> Self {
        self.typing = typing;
        self
    }

    #[inline]
    #[must_use]
    pub const fn typing(&self) -> bool {
        self.typing
    }
}

/// Methods waiting to be lifted, sharing a symbol table.
pub struct TranslationUnit<'a> {
    symbols: &'a dyn SymbolTable,
    options: LiftOptions,
    methods: Vec<&'a MethodDef>,
}

impl<'a> TranslationUnit<'a> {
    #[must_use]
    pub fn new(symbols: &'a dyn SymbolTable, options: LiftOptions) -> Self {
        Self {
            symbols,
            options,
            methods: Vec::new(),
        }
    }

    pub fn add(&mut self, method: &'a MethodDef) {
        self.methods.push(method);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.methods.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    /// Lifts every method of the unit, consuming it.
    #[must_use]
    pub fn finish(self) -> LiftedUnit {
        let symbols = self.symbols;
        let options = self.options;
        log::info!("decoding {} bodies", self.methods.len());

        let decoded: Vec<_> = self
            .methods
            .par_iter()
            .map(|method| (method.signature(), decode_method(method, symbols, options)))
            .collect();

        if options.typing() {
            log::info!("solving types of {} bodies", decoded.len());
        }
        let lifted: Vec<(String, IrResult<Body>)> = decoded
            .into_par_iter()
            .map(|(signature, decoded)| {
                let body = decoded.and_then(|(mut body, collector)| {
                    if let Some(collector) = collector {
                        typing::solve(&mut body, collector, symbols)?;
                    }
                    Ok(body)
                });
                (signature, body)
            })
            .collect();

        let mut unit = LiftedUnit::default();
        for (signature, body) in lifted {
            match body {
                Ok(body) => {
                    unit.bodies.insert(signature, body);
                }
                Err(err) => {
                    log::warn!("{signature}: {err}");
                    unit.failures.insert(signature, err);
                }
            }
        }
        log::info!(
            "lifted {} bodies, {} failures",
            unit.bodies.len(),
            unit.failures.len()
        );
        unit
    }
}

/// Lifted bodies, and lifting errors, by method signature.
#[derive(Debug, Default)]
pub struct LiftedUnit {
    bodies: BTreeMap<String, Body>,
    failures: BTreeMap<String, IrError>,
}

impl LiftedUnit {
    #[must_use]
    pub fn get(&self, signature: &str) -> Option<&Body> {
        self.bodies.get(signature)
    }

    pub fn iter_bodies(&self) -> impl Iterator<Item = (&str, &Body)> {
        self.bodies.iter().map(|(sig, body)| (sig.as_str(), body))
    }

    pub fn iter_failures(&self) -> impl Iterator<Item = (&str, &IrError)> {
        self.failures.iter().map(|(sig, err)| (sig.as_str(), err))
    }

    #[must_use]
    pub fn nb_bodies(&self) -> usize {
        self.bodies.len()
    }

    #[must_use]
    pub fn nb_failures(&self) -> usize {
        self.failures.len()
    }

    /// Splits the unit into its bodies and its failures.
    #[must_use]
    pub fn into_parts(self) -> (BTreeMap<String, Body>, BTreeMap<String, IrError>) {
        (self.bodies, self.failures)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{pools, static_method};
    use dl_bytecode::instrs::Instr;
    use dl_bytecode::registers::Reg;
    use dl_bytecode::types::Type;

    fn methods() -> Vec<MethodDef> {
        let mut add = static_method(
            "(II)I",
            3,
            &[
                Instr::AddInt(Reg::from(0u8), Reg::from(1u8), Reg::from(2u8)),
                Instr::Return(Reg::from(0u8)),
            ],
        );
        add.method.name = "add".to_string();
        let mut broken = static_method("()V", 1, &[Instr::MoveResult(Reg::from(0u8))]);
        broken.method.name = "broken".to_string();
        vec![add, broken]
    }

    #[test]
    fn typed_unit() {
        let pools = pools();
        let methods = methods();
        let mut unit = TranslationUnit::new(&pools, LiftOptions::default());
        for method in &methods {
            unit.add(method);
        }
        assert_eq!(unit.len(), 2);
        let lifted = unit.finish();
        assert_eq!(lifted.nb_bodies(), 1);
        assert_eq!(lifted.nb_failures(), 1);

        let body = lifted.get("La/C;->add(II)I").unwrap();
        let types = body.types.as_ref().unwrap();
        assert!(types.iter().all(|(_, ty)| *ty == Type::Int));
        assert!(matches!(
            lifted.iter_failures().next(),
            Some(("La/C;->broken()V", IrError::BadFormat { .. }))
        ));
    }

    #[test]
    fn untyped_unit() {
        let pools = pools();
        let methods = methods();
        let mut unit = TranslationUnit::new(&pools, LiftOptions::new().without_typing());
        unit.add(&methods[0]);
        let lifted = unit.finish();
        let body = lifted.get("La/C;->add(II)I").unwrap();
        assert!(body.types.is_none());
        assert_eq!(body.stmts.len(), 4);
    }

    #[test]
    fn options() {
        assert!(LiftOptions::default().typing());
        assert!(!LiftOptions::default().without_typing().typing());
        assert!(LiftOptions::new().with_typing(false).with_typing(true).typing());
    }
}
