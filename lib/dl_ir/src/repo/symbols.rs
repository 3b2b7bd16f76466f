//! Resolved symbol lookups needed while lifting.

use crate::errors::{IrError, IrResult};
use dl_bytecode::errors::BytecodeError;
use dl_bytecode::pools::{
    CallSiteId, CallSiteRef, FieldId, FieldRef, Index, MethodHandleId, MethodHandleRef, MethodId,
    MethodRef, PoolKind, Pools, ProtoId, ProtoRef, StringId, TypeId,
};
use dl_bytecode::types::Type;

/// Symbol table queried by instruction handlers and by the type solver.
///
/// Lookups are by typed pool index; implementations must be shareable
/// between the threads lifting the bodies of a unit.
pub trait SymbolTable: Sync {
    fn string(&self, idx: Index<StringId>) -> IrResult<&str>;

    fn type_of(&self, idx: Index<TypeId>) -> IrResult<&Type>;

    fn field(&self, idx: Index<FieldId>) -> IrResult<&FieldRef>;

    fn method(&self, idx: Index<MethodId>) -> IrResult<&MethodRef>;

    fn proto(&self, idx: Index<ProtoId>) -> IrResult<&ProtoRef>;

    fn call_site(&self, idx: Index<CallSiteId>) -> IrResult<&CallSiteRef>;

    fn method_handle(&self, idx: Index<MethodHandleId>) -> IrResult<&MethodHandleRef>;

    /// Internal name of the direct superclass of `class`, if known.
    fn superclass(&self, class: &str) -> Option<&str>;

    /// Checks that a referenced method can be found from its defining
    /// class.
    fn check_method(&self, _method: &MethodRef) -> IrResult<()> {
        Ok(())
    }

    /// Checks that a referenced field can be found from its defining class.
    fn check_field(&self, _field: &FieldRef) -> IrResult<()> {
        Ok(())
    }
}

pub(crate) fn pool_entry<K: PoolKind>(pools: &Pools, idx: Index<K>) -> IrResult<&K::Entry> {
    idx.get(pools).map_err(|err| match err {
        BytecodeError::IndexOutOfPool { kind, index } => IrError::SymbolNotFound {
            expected: format!("{kind}@{index}"),
            candidates: Vec::new(),
        },
        err => IrError::Bytecode(err),
    })
}

/// Bare pools, without any class hierarchy.
impl SymbolTable for Pools {
    fn string(&self, idx: Index<StringId>) -> IrResult<&str> {
        pool_entry(self, idx).map(String::as_str)
    }

    fn type_of(&self, idx: Index<TypeId>) -> IrResult<&Type> {
        pool_entry(self, idx)
    }

    fn field(&self, idx: Index<FieldId>) -> IrResult<&FieldRef> {
        pool_entry(self, idx)
    }

    fn method(&self, idx: Index<MethodId>) -> IrResult<&MethodRef> {
        pool_entry(self, idx)
    }

    fn proto(&self, idx: Index<ProtoId>) -> IrResult<&ProtoRef> {
        pool_entry(self, idx)
    }

    fn call_site(&self, idx: Index<CallSiteId>) -> IrResult<&CallSiteRef> {
        pool_entry(self, idx)
    }

    fn method_handle(&self, idx: Index<MethodHandleId>) -> IrResult<&MethodHandleRef> {
        pool_entry(self, idx)
    }

    fn superclass(&self, _class: &str) -> Option<&str> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_index() {
        let pools = Pools {
            strings: vec!["hello".to_string()],
            ..Pools::default()
        };
        assert_eq!(pools.string(Index::new(0)).unwrap(), "hello");
        match pools.string(Index::new(3)) {
            Err(IrError::SymbolNotFound { expected, .. }) => assert_eq!(expected, "string@3"),
            other => panic!("unexpected {other:?}"),
        }
    }
}
