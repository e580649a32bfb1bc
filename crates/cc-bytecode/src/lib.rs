//! The `ZAST` binary AST codec (spec §4.4): tag numbering, the on-disk
//! type-info triple, and the two-pass writer / full-streaming-skip reader.

pub mod reader;
pub mod strings;
pub mod tag;
pub mod typeinfo;
pub mod writer;

pub use reader::AstReader;
pub use tag::{BinOpCode, Tag, UnOpCode};
pub use typeinfo::TypeInfo;
pub use writer::{write_program, WriteReport};
