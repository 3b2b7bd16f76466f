use bitflags::bitflags;
use dl_bytecode::code::Code;
use dl_bytecode::pools::{FieldRef, MethodRef};
use regex::Regex;
use std::fmt;

bitflags! {
    pub struct AccessFlags: u32 {
        const ACC_PUBLIC                = 0x00001;
        const ACC_PRIVATE               = 0x00002;
        const ACC_PROTECTED             = 0x00004;
        const ACC_STATIC                = 0x00008;
        const ACC_FINAL                 = 0x00010;
        const ACC_SYNCHRONIZED          = 0x00020;
        const ACC_BRIDGE                = 0x00040;
        const ACC_VARARGS               = 0x00080;
        const ACC_NATIVE                = 0x00100;
        const ACC_INTERFACE             = 0x00200;
        const ACC_ABSTRACT              = 0x00400;
        const ACC_SYNTHETIC             = 0x01000;
        const ACC_CONSTRUCTOR           = 0x10000;
    }
}

impl AccessFlags {
    /// Parses a flag from its source keyword (`"public"`, `"static"`, ...).
    #[must_use]
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        let flag = match keyword {
            "public" => Self::ACC_PUBLIC,
            "private" => Self::ACC_PRIVATE,
            "protected" => Self::ACC_PROTECTED,
            "static" => Self::ACC_STATIC,
            "final" => Self::ACC_FINAL,
            "synchronized" => Self::ACC_SYNCHRONIZED,
            "bridge" => Self::ACC_BRIDGE,
            "varargs" => Self::ACC_VARARGS,
            "native" => Self::ACC_NATIVE,
            "interface" => Self::ACC_INTERFACE,
            "abstract" => Self::ACC_ABSTRACT,
            "synthetic" => Self::ACC_SYNTHETIC,
            "constructor" => Self::ACC_CONSTRUCTOR,
            _ => return None,
        };
        Some(flag)
    }
}

impl fmt::Display for AccessFlags {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let keywords = [
            (Self::ACC_PUBLIC, "public"),
            (Self::ACC_PRIVATE, "private"),
            (Self::ACC_PROTECTED, "protected"),
            (Self::ACC_STATIC, "static"),
            (Self::ACC_FINAL, "final"),
            (Self::ACC_SYNCHRONIZED, "synchronized"),
            (Self::ACC_NATIVE, "native"),
            (Self::ACC_ABSTRACT, "abstract"),
        ];
        for (flag, keyword) in keywords {
            if self.contains(flag) {
                write!(f, "{keyword} ")?;
            }
        }
        Ok(())
    }
}

/// A method declared by a class, with its code once bound.
#[derive(Debug, Clone)]
pub struct MethodDef {
    pub method: MethodRef,
    pub flags: AccessFlags,
    pub code: Option<Code>,
}

impl MethodDef {
    #[must_use]
    pub const fn new(method: MethodRef, flags: AccessFlags) -> Self {
        Self {
            method,
            flags,
            code: None,
        }
    }

    #[inline]
    #[must_use]
    pub const fn is_static(&self) -> bool {
        self.flags.contains(AccessFlags::ACC_STATIC)
    }

    #[inline]
    #[must_use]
    pub const fn is_abstract(&self) -> bool {
        self.flags.contains(AccessFlags::ACC_ABSTRACT)
    }

    #[inline]
    #[must_use]
    pub const fn is_native(&self) -> bool {
        self.flags.contains(AccessFlags::ACC_NATIVE)
    }

    /// Only concrete methods may have a body.
    #[inline]
    #[must_use]
    pub const fn is_concrete(&self) -> bool {
        !self.is_abstract() && !self.is_native()
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.method.name
    }

    #[must_use]
    pub fn subsignature(&self) -> String {
        self.method.subsignature()
    }

    /// Full signature, `Lpkg/Class;->name(params)ret`.
    #[must_use]
    pub fn signature(&self) -> String {
        self.method.to_string()
    }

    #[must_use]
    pub const fn code(&self) -> Option<&Code> {
        self.code.as_ref()
    }
}

/// A class definition: hierarchy links and declared members.
#[derive(Debug, Clone)]
pub struct ClassDef {
    /// Internal name, `pkg/Name`.
    pub name: String,
    pub superclass: Option<String>,
    pub interfaces: Vec<String>,
    pub flags: AccessFlags,
    pub methods: Vec<MethodDef>,
    pub fields: Vec<FieldRef>,
}

impl ClassDef {
    #[must_use]
    pub fn new(name: &str, superclass: Option<&str>, flags: AccessFlags) -> Self {
        Self {
            name: name.to_string(),
            superclass: superclass.map(str::to_string),
            interfaces: Vec::new(),
            flags,
            methods: Vec::new(),
            fields: Vec::new(),
        }
    }

    #[must_use]
    pub fn simple_name(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }

    #[inline]
    pub fn iter_methods(&self) -> impl Iterator<Item = &MethodDef> {
        self.methods.iter()
    }

    /// Methods whose name matches `pattern`.
    pub fn find_methods<'a>(&'a self, pattern: &'a Regex) -> impl Iterator<Item = &'a MethodDef> {
        self.methods
            .iter()
            .filter(|method| pattern.is_match(method.name()))
    }

    #[must_use]
    pub fn get_method(&self, subsignature: &str) -> Option<&MethodDef> {
        self.methods
            .iter()
            .find(|method| method.subsignature() == subsignature)
    }

    /// Position of the method `subsignature` in [`methods`](Self::methods).
    #[must_use]
    pub fn method_index(&self, subsignature: &str) -> Option<usize> {
        self.methods
            .iter()
            .position(|method| method.subsignature() == subsignature)
    }

    #[must_use]
    pub fn has_field(&self, field: &FieldRef) -> bool {
        self.fields
            .iter()
            .any(|f| f.name == field.name && f.type_ == field.type_)
    }
}

impl fmt::Display for ClassDef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}class {}", self.flags, self.name.replace('/', "."))?;
        if let Some(superclass) = &self.superclass {
            write!(f, " extends {}", superclass.replace('/', "."))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dl_bytecode::pools::ProtoRef;
    use dl_bytecode::types::Type;

    fn method(name: &str, flags: AccessFlags) -> MethodDef {
        MethodDef::new(
            MethodRef {
                class: Type::class("a/b/C"),
                name: name.to_string(),
                proto: ProtoRef {
                    params: vec![Type::Int],
                    ret: Type::Void,
                },
            },
            flags,
        )
    }

    #[test]
    fn flags() {
        assert_eq!(AccessFlags::from_keyword("static"), Some(AccessFlags::ACC_STATIC));
        assert_eq!(AccessFlags::from_keyword("transient"), None);
        let flags = AccessFlags::ACC_PUBLIC | AccessFlags::ACC_STATIC;
        assert_eq!(flags.to_string(), "public static ");
    }

    #[test]
    fn methods() {
        let mut class = ClassDef::new("a/b/C", Some("java/lang/Object"), AccessFlags::ACC_PUBLIC);
        class.methods.push(method("getName", AccessFlags::ACC_PUBLIC));
        class.methods.push(method("getId", AccessFlags::ACC_NATIVE));
        class.methods.push(method("run", AccessFlags::ACC_ABSTRACT));
        assert_eq!(class.simple_name(), "C");
        assert_eq!(class.to_string(), "public class a.b.C extends java.lang.Object");

        let pattern = Regex::new("^get").unwrap();
        let names: Vec<&str> = class.find_methods(&pattern).map(MethodDef::name).collect();
        assert_eq!(names, vec!["getName", "getId"]);

        let concrete: Vec<&str> = class
            .iter_methods()
            .filter(|m| m.is_concrete())
            .map(MethodDef::name)
            .collect();
        assert_eq!(concrete, vec!["getName"]);
        assert_eq!(class.get_method("run(I)V").map(MethodDef::signature).as_deref(), Some("La/b/C;->run(I)V"));
    }
}
