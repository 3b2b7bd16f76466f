//! Constant pools referenced by instructions operands.
//!
//! Instructions never embed strings, types or member references: they hold
//! typed [indices](Index) into pools. The pools here are already resolved
//! (entries carry their full descriptors), as provided by the container
//! loader.

use crate::errors::{BytecodeError, BytecodeResult};
use crate::types::Type;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;

/// A typed pool index.
#[derive(Debug)]
pub struct Index<T: ?Sized> {
    value: usize,
    marker: PhantomData<T>,
}

impl<T> Clone for Index<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Index<T> {}

impl<T> PartialEq for Index<T> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<T> Eq for Index<T> {}

impl<T> Index<T> {
    #[must_use]
    pub const fn new(value: usize) -> Self {
        Self {
            value,
            marker: PhantomData,
        }
    }

    #[inline]
    #[must_use]
    pub const fn as_usize(&self) -> usize {
        self.value
    }
}

impl<K: PoolKind> Index<K> {
    /// Returns the pool entry referenced by this index.
    pub fn get(self, pools: &Pools) -> BytecodeResult<&K::Entry> {
        K::entries(pools)
            .get(self.value)
            .ok_or(BytecodeError::IndexOutOfPool {
                kind: K::TAG.name(),
                index: self.value,
            })
    }
}

/// Tag of the pool an index points into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolTag {
    String,
    Type,
    Field,
    Method,
    Proto,
    CallSite,
    MethodHandle,
}

impl PoolTag {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Type => "type",
            Self::Field => "field",
            Self::Method => "method",
            Self::Proto => "proto",
            Self::CallSite => "call_site",
            Self::MethodHandle => "method_handle",
        }
    }
}

/// Marker types implement this trait to bind an index type to its pool.
pub trait PoolKind {
    type Entry;
    const TAG: PoolTag;

    fn entries(pools: &Pools) -> &[Self::Entry];
}

macro_rules! pool_kind {
    ($marker:ident, $entry:ty, $tag:ident, $field:ident) => {
        #[derive(Debug)]
        pub enum $marker {}

        impl PoolKind for $marker {
            type Entry = $entry;
            const TAG: PoolTag = PoolTag::$tag;

            fn entries(pools: &Pools) -> &[Self::Entry] {
                &pools.$field
            }
        }
    };
}

pool_kind!(StringId, String, String, strings);
pool_kind!(TypeId, Type, Type, types);
pool_kind!(FieldId, FieldRef, Field, fields);
pool_kind!(MethodId, MethodRef, Method, methods);
pool_kind!(ProtoId, ProtoRef, Proto, protos);
pool_kind!(CallSiteId, CallSiteRef, CallSite, call_sites);
pool_kind!(MethodHandleId, MethodHandleRef, MethodHandle, method_handles);

/// A method prototype: parameter types and return type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProtoRef {
    pub params: Vec<Type>,
    pub ret: Type,
}

impl ProtoRef {
    /// Number of register slots taken by the parameters, wide ones counting
    /// twice.
    #[must_use]
    pub fn params_slots(&self) -> usize {
        self.params.iter().map(Type::slots).sum()
    }
}

impl fmt::Display for ProtoRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "(")?;
        for param in &self.params {
            write!(f, "{param}")?;
        }
        write!(f, "){}", self.ret)
    }
}

impl TryFrom<String> for ProtoRef {
    type Error = BytecodeError;

    fn try_from(s: String) -> BytecodeResult<Self> {
        let (params, ret) = Type::parse_proto(&s)?;
        Ok(Self { params, ret })
    }
}

impl From<ProtoRef> for String {
    fn from(proto: ProtoRef) -> Self {
        proto.to_string()
    }
}

/// A field reference: declaring class, name and type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldRef {
    pub class: Type,
    pub name: String,
    #[serde(rename = "type")]
    pub type_: Type,
}

impl fmt::Display for FieldRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}->{}:{}", self.class, self.name, self.type_)
    }
}

/// A method reference: defining class, name and prototype.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MethodRef {
    pub class: Type,
    pub name: String,
    pub proto: ProtoRef,
}

impl MethodRef {
    /// Name and prototype, without the defining class.
    #[must_use]
    pub fn subsignature(&self) -> String {
        format!("{}{}", self.name, self.proto)
    }
}

impl fmt::Display for MethodRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}->{}{}", self.class, self.name, self.proto)
    }
}

/// A call site, as far as invocation typing is concerned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallSiteRef {
    pub name: String,
    pub proto: ProtoRef,
}

impl fmt::Display for CallSiteRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "call_site {}{}", self.name, self.proto)
    }
}

/// A method handle constant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodHandleRef {
    pub kind: String,
    pub target: String,
}

impl fmt::Display for MethodHandleRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}@{}", self.kind, self.target)
    }
}

/// The resolved pools of a translation unit.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct Pools {
    #[serde(default)]
    pub strings: Vec<String>,
    #[serde(default)]
    pub types: Vec<Type>,
    #[serde(default)]
    pub fields: Vec<FieldRef>,
    #[serde(default)]
    pub methods: Vec<MethodRef>,
    #[serde(default)]
    pub protos: Vec<ProtoRef>,
    #[serde(default)]
    pub call_sites: Vec<CallSiteRef>,
    #[serde(default)]
    pub method_handles: Vec<MethodHandleRef>,
}

impl Pools {
    /// Human readable form of a pool entry, falling back to `kind@index`
    /// when the index is dangling.
    #[must_use]
    pub fn describe(&self, tag: PoolTag, index: usize) -> String {
        let entry = match tag {
            PoolTag::String => Index::<StringId>::new(index)
                .get(self)
                .ok()
                .map(|s| format!("{s:?}")),
            PoolTag::Type => Index::<TypeId>::new(index).get(self).ok().map(Type::to_string),
            PoolTag::Field => Index::<FieldId>::new(index).get(self).ok().map(FieldRef::to_string),
            PoolTag::Method => Index::<MethodId>::new(index)
                .get(self)
                .ok()
                .map(MethodRef::to_string),
            PoolTag::Proto => Index::<ProtoId>::new(index).get(self).ok().map(ProtoRef::to_string),
            PoolTag::CallSite => Index::<CallSiteId>::new(index)
                .get(self)
                .ok()
                .map(CallSiteRef::to_string),
            PoolTag::MethodHandle => Index::<MethodHandleId>::new(index)
                .get(self)
                .ok()
                .map(MethodHandleRef::to_string),
        };
        entry.unwrap_or_else(|| format!("{}@{index}", tag.name()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_lookups() {
        let pools = Pools {
            strings: vec!["hello".to_string()],
            types: vec![Type::Int],
            ..Pools::default()
        };
        assert_eq!(Index::<StringId>::new(0).get(&pools).ok().map(String::as_str), Some("hello"));
        assert!(matches!(
            Index::<TypeId>::new(3).get(&pools),
            Err(BytecodeError::IndexOutOfPool { kind: "type", index: 3 })
        ));
        assert_eq!(pools.describe(PoolTag::String, 0), "\"hello\"");
        assert_eq!(pools.describe(PoolTag::Field, 2), "field@2");
    }

    #[test]
    fn protos() {
        let proto = ProtoRef::try_from("(JLa/B;)I".to_string()).unwrap();
        assert_eq!(proto.params_slots(), 3);
        assert_eq!(proto.to_string(), "(JLa/B;)I");
    }
}
