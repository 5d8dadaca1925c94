//! Type-directed struct rewriting
//!
//! This crate generates a new type declaration from the fully resolved shape
//! of a record type. Rewrite rules keyed by dotted field paths replace nested
//! field types with literal text or unroll them into their parent; every
//! named type left untouched is emitted as an opaque reference and the
//! imports it needs are collected, partitioned and annotated from a
//! dependency manifest.

pub mod catalog;
pub mod emit;
pub mod error;
pub mod format;
pub mod generate;
pub mod imports;
pub mod manifest;
pub mod resolve;
pub mod rewrite;
pub mod rules;
pub mod types;

pub use catalog::*;
pub use error::*;
pub use format::{BuiltinFormatter, CommandFormatter, Formatter, FormatterKind, NoopFormatter};
pub use generate::*;
pub use imports::{ImportBlock, ImportLine, ImportReference, ImportSet};
pub use manifest::*;
pub use resolve::*;
pub use rewrite::*;
pub use rules::*;
pub use types::*;
