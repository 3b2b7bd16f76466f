//! # `DroidLift`
//!
//! `droidlift` is the main crate of the `DroidLift` project, lifting register
//! VM bytecode into a typed three-address intermediate representation. The
//! project is subdivided into multiple crates, `droidlift` acts as entry
//! point by reexporting important structs and functions from those
//! sub-crates. Most of the reexport are done within the
//! `droidlift::prelude` namespace.
//!
//! ## Library basics
//!
//! A translation unit is loaded into a [`Repo`](prelude::Repo) holding its
//! classes, constant pools and method bodies. The bodies are then lifted
//! together, decoding first and solving the types of their locals once
//! every body has been decoded:
//!
//! ```rust
//! use droidlift::prelude::*;
//! use droidlift::unitfile;
//!
//! let repo = unitfile::load_str(r#"{
//!     "classes": [{ "name": "a/C", "methods": [{ "name": "run", "proto": "()V", "flags": ["static"] }] }],
//!     "bodies": [{ "class": "a/C", "method": "run()V", "code": { "registers_size": 0, "ins_size": 0, "insns": [14] } }]
//! }"#)?;
//! let mut unit = TranslationUnit::new(&repo, LiftOptions::default());
//! for (_, method) in repo.iter_classes_methods() {
//!     unit.add(method);
//! }
//! let lifted = unit.finish();
//! println!("{}", lifted.get("La/C;->run()V").unwrap());
//! # Ok::<(), DlError>(())
//! ```
//!
//! ## Sub-crates
//!
//!  - [`dl_bytecode`] contains the instruction set, code items and constant
//!    pools definitions, with their parsers and writers,
//!  - [`dl_ir`] contains the intermediate representation, the instruction
//!    decoder and the type solver,
//!  - [`dl_utils`] contain the small functions all the other crates can benefit.

mod errors;

pub mod cli;
pub mod dl_disas;
pub mod dl_lift;
pub mod filter;
pub mod unitfile;

pub use dl_bytecode as bytecode;
pub use dl_ir as ir;
pub use dl_utils as utils;

/// Reexport module of commonly used structures and functions from `DroidLift` project
/// sub-crates:
///
/// ```rust
/// use droidlift::prelude::*;
/// ```
pub mod prelude {
    pub use crate::errors::{DlError, DlResult};

    pub use dl_bytecode::{Addr, PrettyPrinter};

    pub use dl_ir::ir::Body;
    pub use dl_ir::repo::{ClassDef, MethodDef, Repo, SymbolTable};
    pub use dl_ir::unit::{LiftOptions, LiftedUnit, TranslationUnit};
    pub use dl_ir::{lift_method, typing};

    use clap::ArgMatches;

    pub fn init_logger(args: &ArgMatches) {
        let env = env_logger::Env::new()
            .filter_or("DL_LOG", "info")
            .write_style("DL_LOG_STYLE");

        let mut builder = env_logger::Builder::from_env(env);
        if args.get_flag("verbose") {
            builder.filter_level(log::LevelFilter::Trace);
        } else if args.get_flag("debug") {
            builder.filter_level(log::LevelFilter::Debug);
        }
        if args.get_flag("ecslog") {
            builder.format(ecs_logger::format);
        }
        builder.init();
    }
}
