//! Classes, symbol lookups and body extraction.

mod class;
pub mod extract;
mod repository;
mod symbols;

pub use class::{AccessFlags, ClassDef, MethodDef};
pub use extract::BodyExtractor;
pub use repository::Repo;
pub use symbols::SymbolTable;
