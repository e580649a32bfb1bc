//! Semantic validation and Z80 code generation (spec §4.5, §4.6), the two
//! consumers of the `ZAST` binary format that don't produce one.

pub mod codegen;
pub mod semantic;
pub mod symtab;

pub use codegen::{generate, GenReport};
pub use semantic::validate;
