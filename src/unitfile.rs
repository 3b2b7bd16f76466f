//! Translation unit files.
//!
//! A unit file is a JSON document holding the resolved pools of a unit,
//! its class declarations and, separately, the method bodies. Each body
//! names the class and the method it implements:
//!
//! ```json
//! {
//!   "pools": { "types": ["La/C;"], "methods": [] },
//!   "classes": [
//!     {
//!       "name": "a/C",
//!       "superclass": "java/lang/Object",
//!       "flags": ["public"],
//!       "methods": [{ "name": "run", "proto": "()V", "flags": ["public", "static"] }]
//!     }
//!   ],
//!   "bodies": [
//!     {
//!       "class": "a/C",
//!       "method": "run()V",
//!       "code": { "registers_size": 1, "ins_size": 0, "insns": [14] }
//!     }
//!   ]
//! }
//! ```
//!
//! Code is given either as 16-bit code units with exception ranges, or as
//! the bytes of a complete code item (`{"item": [..]}`).

use crate::errors::{DlError, DlResult};
use dl_bytecode::code::{CatchHandler, Code, TryItem};
use dl_bytecode::parse_code;
use dl_bytecode::pools::{FieldRef, Index, MethodRef, Pools, ProtoRef};
use dl_bytecode::types::Type;
use dl_bytecode::Addr;
use dl_ir::repo::{AccessFlags, ClassDef, MethodDef, Repo};
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize)]
pub struct UnitFile {
    #[serde(default)]
    pub pools: Pools,
    #[serde(default)]
    pub classes: Vec<ClassFile>,
    #[serde(default)]
    pub bodies: Vec<BodyFile>,
}

#[derive(Debug, Deserialize)]
pub struct ClassFile {
    /// Internal name, `pkg/Name`.
    pub name: String,
    #[serde(default)]
    pub superclass: Option<String>,
    #[serde(default)]
    pub interfaces: Vec<String>,
    #[serde(default)]
    pub flags: Vec<String>,
    #[serde(default)]
    pub fields: Vec<FieldFile>,
    #[serde(default)]
    pub methods: Vec<MethodFile>,
}

#[derive(Debug, Deserialize)]
pub struct FieldFile {
    pub name: String,
    #[serde(rename = "type")]
    pub type_: Type,
}

#[derive(Debug, Deserialize)]
pub struct MethodFile {
    pub name: String,
    pub proto: ProtoRef,
    #[serde(default)]
    pub flags: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct BodyFile {
    /// Internal name of the class the body is declared in.
    pub class: String,
    /// Method sub-signature, `name(params)ret`.
    pub method: String,
    pub code: CodeFile,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum CodeFile {
    Item {
        item: Vec<u8>,
    },
    Units {
        registers_size: u16,
        ins_size: u16,
        #[serde(default)]
        outs_size: u16,
        insns: Vec<u16>,
        #[serde(default)]
        tries: Vec<TryFile>,
    },
}

#[derive(Debug, Deserialize)]
pub struct TryFile {
    pub start: usize,
    pub count: usize,
    #[serde(default)]
    pub catches: Vec<CatchFile>,
    #[serde(default)]
    pub catch_all: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct CatchFile {
    /// Index of the caught class in the types pool.
    #[serde(rename = "type")]
    pub type_idx: usize,
    pub handler: usize,
}

fn parse_flags(flags: &[String]) -> DlResult<AccessFlags> {
    flags.iter().try_fold(AccessFlags::empty(), |acc, keyword| {
        AccessFlags::from_keyword(keyword)
            .map(|flag| acc | flag)
            .ok_or_else(|| DlError::UnitFile(format!("unknown access flag '{keyword}'")))
    })
}

impl ClassFile {
    fn into_def(self) -> DlResult<ClassDef> {
        let flags = parse_flags(&self.flags)?;
        let mut class = ClassDef::new(&self.name, self.superclass.as_deref(), flags);
        class.interfaces = self.interfaces;
        let class_type = Type::class(&self.name);
        for field in self.fields {
            class.fields.push(FieldRef {
                class: class_type.clone(),
                name: field.name,
                type_: field.type_,
            });
        }
        for method in self.methods {
            let flags = parse_flags(&method.flags)?;
            class.methods.push(MethodDef::new(
                MethodRef {
                    class: class_type.clone(),
                    name: method.name,
                    proto: method.proto,
                },
                flags,
            ));
        }
        Ok(class)
    }
}

impl TryFile {
    fn into_item(self) -> TryItem {
        TryItem {
            start: Addr(self.start),
            count: self.count,
            handler: CatchHandler {
                catches: self
                    .catches
                    .into_iter()
                    .map(|catch| (Index::new(catch.type_idx), Addr(catch.handler)))
                    .collect(),
                catch_all: self.catch_all.map(Addr),
            },
        }
    }
}

impl CodeFile {
    fn into_code(self) -> DlResult<Code> {
        let code = match self {
            Self::Item { item } => parse_code(&item)?,
            Self::Units {
                registers_size,
                ins_size,
                outs_size,
                insns,
                tries,
            } => Code::from_units(
                registers_size,
                ins_size,
                outs_size,
                &insns,
                tries.into_iter().map(TryFile::into_item).collect(),
            )?,
        };
        Ok(code)
    }
}

impl UnitFile {
    /// Registers the classes of the unit in a new repository, then binds
    /// each body to the method it declares.
    pub fn into_repo(self) -> DlResult<Repo> {
        let mut repo = Repo::new(self.pools);
        for class in self.classes {
            repo.register_class(class.into_def()?);
        }
        for missing in repo.iter_missing_classes() {
            log::debug!("class '{missing}' is referenced but not defined");
        }

        let nb_bodies = self.bodies.len();
        for body in self.bodies {
            let code = body.code.into_code()?;
            repo.attach_body(&body.class, &body.method, code)?;
        }
        log::info!(
            "unit loaded: {} classes, {} methods, {} bodies",
            repo.nb_classes(),
            repo.nb_methods(),
            nb_bodies
        );
        Ok(repo)
    }
}

/// Reads a unit from its JSON form.
pub fn load_str(json: &str) -> DlResult<Repo> {
    let unit: UnitFile = serde_json::from_str(json)?;
    unit.into_repo()
}

/// Reads a unit file.
pub fn load<P: AsRef<Path>>(path: P) -> DlResult<Repo> {
    log::debug!("reading unit file {}", path.as_ref().display());
    let json = fs::read_to_string(path)?;
    load_str(&json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dl_ir::errors::IrError;
    use dl_ir::repo::SymbolTable;

    const UNIT: &str = r#"{
        "pools": {
            "types": ["La/C;", "Ljava/lang/Exception;"],
            "fields": [{ "class": "La/C;", "name": "count", "type": "I" }]
        },
        "classes": [
            {
                "name": "a/C",
                "superclass": "a/B",
                "flags": ["public"],
                "fields": [{ "name": "count", "type": "I" }],
                "methods": [
                    { "name": "run", "proto": "()V", "flags": ["public", "static"] },
                    { "name": "id", "proto": "(I)I", "flags": ["public", "static"] },
                    { "name": "stub", "proto": "()V", "flags": ["public", "native"] }
                ]
            },
            { "name": "a/B", "superclass": "java/lang/Object" }
        ],
        "bodies": [
            {
                "class": "a/C",
                "method": "run()V",
                "code": {
                    "registers_size": 1,
                    "ins_size": 0,
                    "insns": [14],
                    "tries": [{ "start": 0, "count": 1, "catch_all": 0 }]
                }
            },
            {
                "class": "a/C",
                "method": "id(I)I",
                "code": { "item": [1, 0, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1, 0, 0, 0, 15, 0] }
            }
        ]
    }"#;

    #[test]
    fn load_unit() {
        let repo = load_str(UNIT).unwrap();
        assert_eq!(repo.nb_classes(), 2);
        assert_eq!(repo.nb_methods(), 3);
        assert_eq!(repo.superclass("a/C"), Some("a/B"));

        let run = repo.extract_body("a/C", "run()V").unwrap();
        assert!(run.is_static());
        let code = run.code().unwrap();
        assert_eq!(code.tries.len(), 1);
        assert_eq!(code.tries[0].handler.catch_all, Some(Addr(0)));

        let id = repo.extract_body("a/C", "id(I)I").unwrap();
        assert_eq!(id.code().unwrap().insns.len(), 1);

        assert!(matches!(
            repo.extract_body("a/C", "stub()V"),
            Err(IrError::NonConcreteBody(_))
        ));
    }

    #[test]
    fn unknown_flag() {
        let json = r#"{ "classes": [{ "name": "a/C", "flags": ["volatile"] }] }"#;
        assert!(matches!(load_str(json), Err(DlError::UnitFile(_))));
    }

    #[test]
    fn body_of_undeclared_method() {
        let json = r#"{
            "classes": [{ "name": "a/C", "methods": [{ "name": "run", "proto": "()V" }] }],
            "bodies": [{
                "class": "a/C",
                "method": "walk()V",
                "code": { "registers_size": 1, "ins_size": 0, "insns": [14] }
            }]
        }"#;
        match load_str(json) {
            Err(DlError::Ir(IrError::SymbolNotFound { candidates, .. })) => {
                assert_eq!(candidates, vec!["La/C;->run()V".to_string()]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn body_of_native_method() {
        let json = r#"{
            "classes": [{
                "name": "a/C",
                "methods": [{ "name": "run", "proto": "()V", "flags": ["native"] }]
            }],
            "bodies": [{
                "class": "a/C",
                "method": "run()V",
                "code": { "registers_size": 1, "ins_size": 0, "insns": [14] }
            }]
        }"#;
        assert!(matches!(
            load_str(json),
            Err(DlError::Ir(IrError::NonConcreteBody(_)))
        ));
    }

    #[test]
    fn malformed_json() {
        assert!(matches!(load_str("{ \"classes\": 3 }"), Err(DlError::Json(_))));
    }
}
