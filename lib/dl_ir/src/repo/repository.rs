//! A repository centralizing the classes of a unit and their pools.

use crate::errors::{IrError, IrResult};
use crate::repo::class::{ClassDef, MethodDef};
use crate::repo::extract::{extract, BodyExtractor};
use crate::repo::symbols::{pool_entry, SymbolTable};
use dl_bytecode::code::Code;
use dl_bytecode::pools::{
    CallSiteId, CallSiteRef, FieldId, FieldRef, Index, MethodHandleId, MethodHandleRef, MethodId,
    MethodRef, Pools, ProtoId, ProtoRef, StringId, TypeId,
};
use dl_bytecode::types::Type;
use regex::Regex;
use std::collections::BTreeMap;

#[derive(Debug, Default)]
pub struct Repo {
    pools: Pools,
    classes: BTreeMap<String, ClassDef>,
}

impl Repo {
    #[must_use]
    pub fn new(pools: Pools) -> Self {
        Self {
            pools,
            classes: BTreeMap::new(),
        }
    }

    #[inline]
    #[must_use]
    pub const fn pools(&self) -> &Pools {
        &self.pools
    }

    pub fn register_class(&mut self, class: ClassDef) {
        log::trace!("pushing '{}' in repository", class.name);
        if self.classes.contains_key(&class.name) {
            log::warn!("class '{}' has already been pushed in repository", class.name);
            return;
        }
        self.classes.insert(class.name.clone(), class);
    }

    #[inline]
    pub fn iter_classes(&self) -> impl Iterator<Item = &ClassDef> {
        self.classes.values()
    }

    /// Names of classes referenced as superclass or interface but not
    /// defined in the repository.
    pub fn iter_missing_classes(&self) -> impl Iterator<Item = &str> {
        let mut missing: Vec<&str> = self
            .classes
            .values()
            .flat_map(|class| class.superclass.iter().chain(class.interfaces.iter()))
            .map(String::as_str)
            .filter(|name| !self.classes.contains_key(*name))
            .collect();
        missing.sort_unstable();
        missing.dedup();
        missing.into_iter()
    }

    #[must_use]
    pub fn get_class_by_name(&self, name: &str) -> Option<&ClassDef> {
        self.classes.get(name)
    }

    pub fn find_classes<'a>(&'a self, pattern: &'a Regex) -> impl Iterator<Item = &'a ClassDef> {
        self.classes
            .values()
            .filter(|class| pattern.is_match(&class.name))
    }

    pub fn iter_classes_methods(&self) -> impl Iterator<Item = (&ClassDef, &MethodDef)> {
        self.iter_classes()
            .flat_map(|class| class.iter_methods().map(move |method| (class, method)))
    }

    #[must_use]
    pub fn nb_classes(&self) -> usize {
        self.classes.len()
    }

    #[must_use]
    pub fn nb_methods(&self) -> usize {
        self.classes.values().map(|class| class.methods.len()).sum()
    }

    /// Class names sharing the simple name of `name`, for diagnostics.
    fn class_candidates(&self, name: &str) -> Vec<String> {
        let simple = name.rsplit('/').next().unwrap_or(name);
        self.classes
            .values()
            .filter(|class| class.simple_name() == simple)
            .map(|class| class.name.clone())
            .collect()
    }

    /// Binds `code` to the method `subsignature` of `class_name`.
    pub fn attach_body(&mut self, class_name: &str, subsignature: &str, code: Code) -> IrResult<()> {
        let candidates = self.class_candidates(class_name);
        let class = self
            .classes
            .get_mut(class_name)
            .ok_or_else(|| IrError::SymbolNotFound {
                expected: Type::class(class_name).to_string(),
                candidates,
            })?;
        BodyExtractor::new(class).attach(class_name, subsignature, code)?;
        Ok(())
    }

    /// Returns the concrete method `subsignature` of `class_name`, which
    /// must have a body.
    pub fn extract_body(&self, class_name: &str, subsignature: &str) -> IrResult<&MethodDef> {
        let class = self
            .classes
            .get(class_name)
            .ok_or_else(|| IrError::SymbolNotFound {
                expected: Type::class(class_name).to_string(),
                candidates: self.class_candidates(class_name),
            })?;
        extract(class, class_name, subsignature)
    }

    // Visits `class` and its ancestors (superclasses and interfaces),
    // stopping at the first one `found` accepts. Returns `None` when an
    // ancestor is not defined in the repository, in which case nothing can
    // be concluded.
    fn search_hierarchy<F>(&self, class: &str, found: &F) -> Option<bool>
    where
        F: Fn(&ClassDef) -> bool,
    {
        let mut stack = vec![class];
        let mut visited = Vec::new();
        while let Some(name) = stack.pop() {
            if visited.contains(&name) {
                continue;
            }
            visited.push(name);
            let def = self.classes.get(name)?;
            if found(def) {
                return Some(true);
            }
            stack.extend(def.superclass.iter().map(String::as_str));
            stack.extend(def.interfaces.iter().map(String::as_str));
        }
        Some(false)
    }

    fn member_candidates<F>(&self, class: &str, name: &str, describe: F) -> Vec<String>
    where
        F: Fn(&ClassDef) -> Vec<(String, String)>,
    {
        let Some(def) = self.classes.get(class) else {
            return Vec::new();
        };
        let members = describe(def);
        let same_name: Vec<String> = members
            .iter()
            .filter(|(member, _)| member == name)
            .map(|(_, full)| full.clone())
            .collect();
        if same_name.is_empty() {
            members.into_iter().map(|(_, full)| full).collect()
        } else {
            same_name
        }
    }
}

impl SymbolTable for Repo {
    fn string(&self, idx: Index<StringId>) -> IrResult<&str> {
        pool_entry(&self.pools, idx).map(String::as_str)
    }

    fn type_of(&self, idx: Index<TypeId>) -> IrResult<&Type> {
        pool_entry(&self.pools, idx)
    }

    fn field(&self, idx: Index<FieldId>) -> IrResult<&FieldRef> {
        pool_entry(&self.pools, idx)
    }

    fn method(&self, idx: Index<MethodId>) -> IrResult<&MethodRef> {
        pool_entry(&self.pools, idx)
    }

    fn proto(&self, idx: Index<ProtoId>) -> IrResult<&ProtoRef> {
        pool_entry(&self.pools, idx)
    }

    fn call_site(&self, idx: Index<CallSiteId>) -> IrResult<&CallSiteRef> {
        pool_entry(&self.pools, idx)
    }

    fn method_handle(&self, idx: Index<MethodHandleId>) -> IrResult<&MethodHandleRef> {
        pool_entry(&self.pools, idx)
    }

    fn superclass(&self, class: &str) -> Option<&str> {
        self.classes.get(class)?.superclass.as_deref()
    }

    fn check_method(&self, method: &MethodRef) -> IrResult<()> {
        // array methods (clone) are not declared anywhere
        let Some(class) = method.class.class_name() else {
            return Ok(());
        };
        let subsignature = method.subsignature();
        match self.search_hierarchy(class, &|def| def.get_method(&subsignature).is_some()) {
            Some(false) => Err(IrError::SymbolNotFound {
                expected: method.to_string(),
                candidates: self.member_candidates(class, &method.name, |def| {
                    def.iter_methods()
                        .map(|m| (m.name().to_string(), m.signature()))
                        .collect()
                }),
            }),
            Some(true) | None => Ok(()),
        }
    }

    fn check_field(&self, field: &FieldRef) -> IrResult<()> {
        let Some(class) = field.class.class_name() else {
            return Ok(());
        };
        match self.search_hierarchy(class, &|def| def.has_field(field)) {
            Some(false) => Err(IrError::SymbolNotFound {
                expected: field.to_string(),
                candidates: self.member_candidates(class, &field.name, |def| {
                    def.fields
                        .iter()
                        .map(|f| (f.name.clone(), f.to_string()))
                        .collect()
                }),
            }),
            Some(true) | None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repo::AccessFlags;
    use dl_bytecode::pools::ProtoRef;

    fn method(class: &str, name: &str, proto: &str) -> MethodRef {
        MethodRef {
            class: Type::class(class),
            name: name.to_string(),
            proto: ProtoRef::try_from(proto.to_string()).unwrap(),
        }
    }

    fn repo() -> Repo {
        let mut repo = Repo::new(Pools::default());
        let mut base = ClassDef::new("a/Base", Some("java/lang/Object"), AccessFlags::ACC_PUBLIC);
        base.methods.push(MethodDef::new(
            method("a/Base", "run", "(I)V"),
            AccessFlags::ACC_PUBLIC,
        ));
        let derived = ClassDef::new("a/Derived", Some("a/Base"), AccessFlags::ACC_PUBLIC);
        let mut object = ClassDef::new("java/lang/Object", None, AccessFlags::ACC_PUBLIC);
        object.methods.push(MethodDef::new(
            method("java/lang/Object", "<init>", "()V"),
            AccessFlags::ACC_PUBLIC | AccessFlags::ACC_CONSTRUCTOR,
        ));
        repo.register_class(base);
        repo.register_class(derived);
        repo.register_class(object);
        repo
    }

    #[test]
    fn hierarchy() {
        let repo = repo();
        assert_eq!(repo.superclass("a/Derived"), Some("a/Base"));
        assert_eq!(repo.superclass("java/lang/Object"), None);
        assert_eq!(repo.iter_missing_classes().count(), 0);
        assert_eq!(repo.nb_classes(), 3);
        assert_eq!(repo.nb_methods(), 2);
        let pattern = Regex::new("^a/").unwrap();
        assert_eq!(repo.find_classes(&pattern).count(), 2);
    }

    #[test]
    fn inherited_methods() {
        let repo = repo();
        assert!(repo.check_method(&method("a/Derived", "run", "(I)V")).is_ok());
        assert!(repo.check_method(&method("x/Unknown", "run", "()V")).is_ok());
        match repo.check_method(&method("a/Derived", "run", "(J)V")) {
            Err(IrError::SymbolNotFound {
                expected,
                candidates,
            }) => {
                assert_eq!(expected, "La/Derived;->run(J)V");
                assert!(candidates.is_empty());
            }
            other => panic!("unexpected {other:?}"),
        }
        match repo.check_method(&method("a/Base", "run", "(J)V")) {
            Err(IrError::SymbolNotFound { candidates, .. }) => {
                assert_eq!(candidates, vec!["La/Base;->run(I)V".to_string()]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn missing_class() {
        let mut repo = repo();
        let code = Code::from_units(1, 0, 0, &[0x000e], Vec::new()).unwrap();
        match repo.attach_body("b/Base", "run(I)V", code) {
            Err(IrError::SymbolNotFound {
                expected,
                candidates,
            }) => {
                assert_eq!(expected, "Lb/Base;");
                assert_eq!(candidates, vec!["a/Base".to_string()]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
