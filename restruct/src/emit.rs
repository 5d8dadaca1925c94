//! Declaration assembly

use crate::error::{RestructError, Result};
use crate::format::Formatter;
use crate::imports::ImportBlock;

pub const HEADER: &str = "// DO NOT EDIT\n// This file has been auto-generated by restruct.\n";

/// Concatenate header, package clause, imports and the rewritten declaration.
pub fn assemble(package: &str, type_name: &str, imports: &ImportBlock, body: &str) -> String {
    let mut out = String::with_capacity(HEADER.len() + body.len() + 128);
    out.push_str(HEADER);
    out.push('\n');
    out.push_str("package ");
    out.push_str(package);
    out.push_str("\n\n");

    let import_clause = imports.render();
    if !import_clause.is_empty() {
        out.push_str(&import_clause);
        out.push('\n');
    }

    out.push_str("type ");
    out.push_str(type_name);
    out.push(' ');
    out.push_str(body);
    out.push('\n');
    out
}

/// Assemble and format. A formatter failure carries the raw text along.
pub fn emit(
    package: &str,
    type_name: &str,
    imports: &ImportBlock,
    body: &str,
    formatter: &dyn Formatter,
) -> Result<String> {
    let raw = assemble(package, type_name, imports, body);
    tracing::debug!(formatter = formatter.name(), bytes = raw.len(), "formatting declaration");
    formatter
        .format(&raw)
        .map_err(|message| RestructError::Format { message, raw })
}
