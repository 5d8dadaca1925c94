//! Subject type resolution
//!
//! The rewriter consumes a [`TypeTree`] and never looks at source code
//! itself. Producing that tree is the job of a [`TypeResolver`]; the shipped
//! [`CatalogResolver`] expands types from a JSON [`Catalog`] and reads the
//! caller's import aliases from the annotated source file.

use crate::catalog::Catalog;
use crate::error::{ResolveError, RestructError, Result};
use crate::types::{NamedRef, TypeTree};
use regex::Regex;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// The keyword an anchored line must start with.
const TYPE_KEYWORD: &str = "type";

/// A source file and the line immediately preceding the subject declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRef {
    pub file: PathBuf,
    /// 1-based anchor line.
    pub line: usize,
}

impl SourceRef {
    pub fn new(file: impl Into<PathBuf>, line: usize) -> Self {
        Self {
            file: file.into(),
            line,
        }
    }

    /// Read the name of the type declared right after the anchor line.
    pub fn type_name(&self) -> Result<String> {
        let content = fs::read_to_string(&self.file).map_err(|source| RestructError::Io {
            path: self.file.clone(),
            source,
        })?;
        parse_type_name(&content, self.line, &self.file)
    }
}

pub fn parse_type_name(content: &str, anchor: usize, file: &Path) -> Result<String> {
    let declaration = content
        .lines()
        .nth(anchor)
        .ok_or_else(|| RestructError::AnchorPastEof {
            file: file.to_path_buf(),
            line: anchor + 1,
        })?;

    let mut fields = declaration.split_whitespace();
    match (fields.next(), fields.next()) {
        (Some(TYPE_KEYWORD), Some(name)) => Ok(name.to_string()),
        _ => Err(RestructError::NotATypeDeclaration {
            file: file.to_path_buf(),
            line: anchor,
        }),
    }
}

fn import_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"^\s*(?:import\s+)?(?:([A-Za-z_][A-Za-z0-9_]*|\.)\s+)?"([^"]+)""#)
            .expect("import regex is valid")
    })
}

/// Collect explicit import aliases from Go source, keyed by module path.
///
/// Blank (`_`) and dot imports expose no qualifier and are skipped.
pub fn parse_import_aliases(content: &str) -> BTreeMap<String, String> {
    let mut aliases = BTreeMap::new();
    let mut in_group = false;
    for line in content.lines() {
        let trimmed = line.trim();
        if in_group {
            if trimmed.starts_with(')') {
                in_group = false;
                continue;
            }
        } else if let Some(rest) = trimmed.strip_prefix("import") {
            if rest.trim_start().starts_with('(') {
                in_group = true;
                continue;
            }
        } else {
            continue;
        }

        if let Some(captures) = import_regex().captures(trimmed) {
            if let (Some(alias), Some(path)) = (captures.get(1), captures.get(2)) {
                if alias.as_str() != "_" && alias.as_str() != "." {
                    aliases.insert(path.as_str().to_string(), alias.as_str().to_string());
                }
            }
        }
    }
    aliases
}

/// Produces the fully expanded structure of one named type.
pub trait TypeResolver {
    fn resolve(&self, source: &SourceRef, type_name: &str) -> std::result::Result<TypeTree, ResolveError>;
}

/// Resolves types against a [`Catalog`]. The annotated source file is
/// assumed to belong to `module`.
#[derive(Debug, Clone)]
pub struct CatalogResolver {
    catalog: Catalog,
    module: String,
}

impl CatalogResolver {
    pub fn new(catalog: Catalog, module: impl Into<String>) -> Self {
        Self {
            catalog,
            module: module.into(),
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Expand the subject without consulting any source file.
    pub fn resolve_type(&self, type_name: &str) -> std::result::Result<TypeTree, ResolveError> {
        let module = self
            .catalog
            .module(&self.module)
            .ok_or_else(|| ResolveError::UnknownModule(self.module.clone()))?;
        let root = module
            .types
            .get(type_name)
            .ok_or_else(|| ResolveError::SubjectNotFound {
                module: self.module.clone(),
                name: type_name.to_string(),
            })?;

        let mut tree = TypeTree::new(type_name, root.clone());
        let mut pending: Vec<NamedRef> = Vec::new();
        root.collect_named_refs(&mut pending);

        while let Some(named) = pending.pop() {
            if tree.named.contains_key(&named) {
                continue;
            }
            let owner = self
                .catalog
                .module(&named.module)
                .ok_or_else(|| ResolveError::UnknownModule(named.module.clone()))?;
            let definition =
                owner
                    .types
                    .get(&named.name)
                    .ok_or_else(|| ResolveError::UnknownType {
                        module: named.module.clone(),
                        name: named.name.clone(),
                    })?;
            tree.modules
                .entry(owner.path.clone())
                .or_insert_with(|| owner.module_ref());
            definition.collect_named_refs(&mut pending);
            tree.named.insert(named, definition.clone());
        }

        // `type State specs.Process` is rendered from Process's shape.
        let shape = tree.underlying(&tree.root)?.clone();
        tree.root = shape;

        tracing::debug!(
            subject = type_name,
            named = tree.named.len(),
            modules = tree.modules.len(),
            "type resolved"
        );
        Ok(tree)
    }
}

impl TypeResolver for CatalogResolver {
    fn resolve(&self, source: &SourceRef, type_name: &str) -> std::result::Result<TypeTree, ResolveError> {
        let content = fs::read_to_string(&source.file).map_err(|err| ResolveError::Source {
            path: source.file.clone(),
            source: err,
        })?;
        let mut tree = self.resolve_type(type_name)?;
        tree.aliases = parse_import_aliases(&content);
        Ok(tree)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::parse_catalog_content;
    use crate::types::TypeNode;

    const SOURCE: &str = r#"package upgrade

import (
	"encoding/json"
	_ "embed"
	. "strings"

	rc "github.com/crosbymichael/upgrade/rc3"
	specs "github.com/opencontainers/runtime-spec/specs-go"
)

import yaml "gopkg.in/yaml.v2"

//go:generate restruct generate -- process.go .Process->
type ProcessState struct {
	specs.Process
}
"#;

    #[test]
    fn test_parse_type_name() {
        let name = parse_type_name(SOURCE, 14, Path::new("upgrade.go")).unwrap();
        assert_eq!(name, "ProcessState");
    }

    #[test]
    fn test_parse_type_name_requires_type_keyword() {
        let err = parse_type_name(SOURCE, 13, Path::new("upgrade.go")).unwrap_err();
        assert!(matches!(err, RestructError::NotATypeDeclaration { line: 13, .. }));
    }

    #[test]
    fn test_parse_type_name_past_eof() {
        let err = parse_type_name("package x\n", 1, Path::new("x.go")).unwrap_err();
        assert!(matches!(err, RestructError::AnchorPastEof { .. }));
    }

    #[test]
    fn test_parse_import_aliases() {
        let aliases = parse_import_aliases(SOURCE);

        assert_eq!(aliases.len(), 3);
        assert_eq!(
            aliases.get("github.com/opencontainers/runtime-spec/specs-go"),
            Some(&"specs".to_string())
        );
        assert_eq!(
            aliases.get("github.com/crosbymichael/upgrade/rc3"),
            Some(&"rc".to_string())
        );
        assert_eq!(aliases.get("gopkg.in/yaml.v2"), Some(&"yaml".to_string()));
        assert!(!aliases.contains_key("embed"));
        assert!(!aliases.contains_key("strings"));
    }

    fn resolver() -> CatalogResolver {
        let catalog = parse_catalog_content(
            r#"{
                "modules": [
                    {
                        "path": "example.com/app",
                        "types": {
                            "Node": {
                                "kind": "struct",
                                "fields": [
                                    { "name": "Next", "type": { "kind": "pointer", "elem": { "kind": "named", "module": "example.com/app", "name": "Node" } } },
                                    { "name": "Meta", "type": { "kind": "named", "module": "example.com/meta", "name": "Meta" } }
                                ]
                            },
                            "State": { "kind": "named", "module": "example.com/meta", "name": "Record" },
                            "Chain": { "kind": "named", "module": "example.com/app", "name": "State" },
                            "Broken": {
                                "kind": "struct",
                                "fields": [
                                    { "name": "Gone", "type": { "kind": "named", "module": "example.com/meta", "name": "Gone" } }
                                ]
                            }
                        }
                    },
                    {
                        "path": "example.com/meta",
                        "types": {
                            "Meta": { "kind": "map", "key": { "kind": "basic", "name": "string" }, "elem": { "kind": "named", "module": "time", "name": "Time" } },
                            "Record": { "kind": "struct", "fields": [ { "name": "User", "type": { "kind": "basic", "name": "uint32" } } ] }
                        }
                    },
                    { "path": "time", "types": { "Time": { "kind": "struct" } } }
                ]
            }"#,
        )
        .unwrap();
        CatalogResolver::new(catalog, "example.com/app")
    }

    #[test]
    fn test_resolve_collects_transitive_references() {
        let tree = resolver().resolve_type("Node").unwrap();

        assert_eq!(tree.name, "Node");
        assert_eq!(tree.named.len(), 3);
        assert!(tree.modules.contains_key("example.com/app"));
        assert!(tree.modules.contains_key("example.com/meta"));
        assert_eq!(tree.module("time").unwrap().name, "time");
        assert_eq!(
            tree.underlying(&TypeNode::named("example.com/meta", "Meta"))
                .unwrap()
                .kind_name(),
            "map"
        );
    }

    #[test]
    fn test_resolve_peels_named_subject() {
        let expected = TypeNode::structure(vec![crate::types::Field::new(
            "User",
            TypeNode::basic("uint32"),
        )]);

        let tree = resolver().resolve_type("State").unwrap();
        assert_eq!(tree.root, expected);

        let chained = resolver().resolve_type("Chain").unwrap();
        assert_eq!(chained.root, expected);
        assert_eq!(chained.name, "Chain");
    }

    #[test]
    fn test_resolve_unknown_subject() {
        let err = resolver().resolve_type("Missing").unwrap_err();
        assert!(matches!(err, ResolveError::SubjectNotFound { .. }));
    }

    #[test]
    fn test_resolve_unknown_reference() {
        let err = resolver().resolve_type("Broken").unwrap_err();
        assert!(
            matches!(err, ResolveError::UnknownType { ref name, .. } if name == "Gone"),
            "unexpected error: {err}"
        );
    }
}
