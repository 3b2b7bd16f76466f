//! Binding method bodies to the methods declared by their class.
//!
//! Bodies come separately from class declarations, so each one names the
//! class and method it belongs to. The class it is bound to must be that
//! class, the method must be declared, and only concrete methods may carry
//! a body.

use crate::errors::{IrError, IrResult};
use crate::repo::class::{ClassDef, MethodDef};
use dl_bytecode::code::Code;
use dl_bytecode::types::Type;

fn check_class(class: &ClassDef, declared_class: &str) -> IrResult<()> {
    if class.name == declared_class {
        Ok(())
    } else {
        Err(IrError::ClassMismatch {
            expected: Type::class(declared_class).to_string(),
            found: Type::class(&class.name).to_string(),
        })
    }
}

fn not_found(class: &ClassDef, subsignature: &str) -> IrError {
    IrError::SymbolNotFound {
        expected: format!("{}->{subsignature}", Type::class(&class.name)),
        candidates: class.iter_methods().map(MethodDef::signature).collect(),
    }
}

/// Binds bodies to the methods of a class.
pub struct BodyExtractor<'a> {
    class: &'a mut ClassDef,
}

impl<'a> BodyExtractor<'a> {
    #[must_use]
    pub fn new(class: &'a mut ClassDef) -> Self {
        Self { class }
    }

    /// Binds `code` to the method `subsignature` of the class, which the
    /// body declares to belong to `declared_class`.
    pub fn attach(
        self,
        declared_class: &str,
        subsignature: &str,
        code: Code,
    ) -> IrResult<&'a MethodDef> {
        check_class(self.class, declared_class)?;
        let class = self.class;
        let index = class
            .method_index(subsignature)
            .ok_or_else(|| not_found(class, subsignature))?;
        let method = &mut class.methods[index];
        if !method.is_concrete() {
            return Err(IrError::NonConcreteBody(method.signature()));
        }
        if method.code.is_some() {
            return Err(IrError::DuplicateBody(method.signature()));
        }
        log::trace!("binding body of {}", method.signature());
        method.code = Some(code);
        Ok(method)
    }
}

/// Returns the method `subsignature` of `class`, checking it is concrete
/// and has a body.
pub fn extract<'a>(
    class: &'a ClassDef,
    declared_class: &str,
    subsignature: &str,
) -> IrResult<&'a MethodDef> {
    check_class(class, declared_class)?;
    let method = class
        .get_method(subsignature)
        .ok_or_else(|| not_found(class, subsignature))?;
    if !method.is_concrete() {
        return Err(IrError::NonConcreteBody(method.signature()));
    }
    if method.code().is_none() {
        return Err(IrError::NoCode(method.signature()));
    }
    Ok(method)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repo::AccessFlags;
    use dl_bytecode::pools::{MethodRef, ProtoRef};

    fn class() -> ClassDef {
        let mut class = ClassDef::new("a/C", Some("java/lang/Object"), AccessFlags::ACC_PUBLIC);
        for (name, flags) in [
            ("run", AccessFlags::ACC_PUBLIC),
            ("stub", AccessFlags::ACC_PUBLIC | AccessFlags::ACC_NATIVE),
            ("todo", AccessFlags::ACC_PUBLIC | AccessFlags::ACC_ABSTRACT),
        ] {
            class.methods.push(MethodDef::new(
                MethodRef {
                    class: Type::class("a/C"),
                    name: name.to_string(),
                    proto: ProtoRef {
                        params: vec![],
                        ret: Type::Void,
                    },
                },
                flags,
            ));
        }
        class
    }

    fn code() -> Code {
        Code::from_units(1, 1, 0, &[0x000e], Vec::new()).unwrap()
    }

    #[test]
    fn attach_and_extract() {
        let mut class = class();
        assert!(matches!(
            extract(&class, "a/C", "run()V"),
            Err(IrError::NoCode(_))
        ));
        let method = BodyExtractor::new(&mut class)
            .attach("a/C", "run()V", code())
            .unwrap();
        assert_eq!(method.signature(), "La/C;->run()V");
        assert!(extract(&class, "a/C", "run()V").is_ok());
        assert!(matches!(
            BodyExtractor::new(&mut class).attach("a/C", "run()V", code()),
            Err(IrError::DuplicateBody(_))
        ));
    }

    #[test]
    fn class_mismatch() {
        let mut class = class();
        match BodyExtractor::new(&mut class).attach("a/D", "run()V", code()) {
            Err(IrError::ClassMismatch { expected, found }) => {
                assert_eq!(expected, "La/D;");
                assert_eq!(found, "La/C;");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(
            extract(&class, "a/D", "run()V"),
            Err(IrError::ClassMismatch { .. })
        ));
    }

    #[test]
    fn unknown_method() {
        let mut class = class();
        match BodyExtractor::new(&mut class).attach("a/C", "walk()V", code()) {
            Err(IrError::SymbolNotFound {
                expected,
                candidates,
            }) => {
                assert_eq!(expected, "La/C;->walk()V");
                assert_eq!(candidates.len(), 3);
                assert!(candidates.contains(&"La/C;->run()V".to_string()));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(class.method_index("stub()V"), Some(1));
        assert!(BodyExtractor::new(&mut class)
            .attach("a/C", "run()V", code())
            .is_ok());
        assert!(class.methods[0].code().is_some());
    }

    #[test]
    fn non_concrete_bodies() {
        let mut class = class();
        assert!(matches!(
            BodyExtractor::new(&mut class).attach("a/C", "stub()V", code()),
            Err(IrError::NonConcreteBody(_))
        ));
        assert!(matches!(
            BodyExtractor::new(&mut class).attach("a/C", "todo()V", code()),
            Err(IrError::NonConcreteBody(_))
        ));
        assert!(matches!(
            extract(&class, "a/C", "todo()V"),
            Err(IrError::NonConcreteBody(_))
        ));
    }
}
