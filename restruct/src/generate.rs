//! End-to-end generation pipeline
//!
//! Every step that can fail runs before the target file is touched; the
//! generated bytes are written once, at the end.

use crate::emit::emit;
use crate::error::{ResolveError, RestructError, Result};
use crate::format::Formatter;
use crate::manifest::Manifest;
use crate::resolve::{SourceRef, TypeResolver};
use crate::rewrite::rewrite;
use crate::rules::RuleTable;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub source: SourceRef,
    /// Package clause stamped on the generated file.
    pub package: String,
    /// Rewrite rules, applied in order.
    pub rules: Vec<String>,
}

pub fn generate(
    request: &GenerateRequest,
    resolver: &dyn TypeResolver,
    manifest: &Manifest,
    formatter: &dyn Formatter,
) -> Result<String> {
    let type_name = request.source.type_name()?;
    let rules = RuleTable::parse(&request.rules)?;

    let tree = resolver
        .resolve(&request.source, &type_name)
        .map_err(|err| match err {
            ResolveError::SubjectNotFound { module, name } => {
                RestructError::TypeNotFound { module, name }
            }
            other => RestructError::Resolve(other),
        })?;

    let rendered = rewrite(&tree, &rules)?;
    let imports = rendered.imports.partition(manifest);
    let source = emit(
        &request.package,
        &tree.name,
        &imports,
        &rendered.body,
        formatter,
    )?;

    tracing::info!(
        subject = %type_name,
        rules = request.rules.len(),
        imports = imports.len(),
        "declaration generated"
    );
    Ok(source)
}

pub fn write_generated(path: &Path, content: &str) -> Result<()> {
    fs::write(path, content).map_err(|source| RestructError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!(path = %path.display(), bytes = content.len(), "generated file written");
    Ok(())
}

/// Generate and, only if that fully succeeds, overwrite `target`.
pub fn generate_to(
    request: &GenerateRequest,
    target: &Path,
    resolver: &dyn TypeResolver,
    manifest: &Manifest,
    formatter: &dyn Formatter,
) -> Result<String> {
    let source = generate(request, resolver, manifest, formatter)?;
    write_generated(target, &source)?;
    Ok(source)
}
