//! Structural type model consumed by the rewriter

use crate::error::ResolveError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A module (package) that owns named types.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ModuleRef {
    /// Full import path, e.g. `github.com/opencontainers/runtime-spec/specs-go`.
    pub path: String,
    /// Name the module exposes to importers, e.g. `specs`.
    pub name: String,
}

/// Reference to a named type, qualified by the path of its owning module.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NamedRef {
    pub module: String,
    pub name: String,
}

impl fmt::Display for NamedRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.module, self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TypeNode {
    Named(NamedRef),
    Pointer {
        elem: Box<TypeNode>,
    },
    Struct {
        #[serde(default)]
        fields: Vec<Field>,
    },
    Array {
        len: u64,
        elem: Box<TypeNode>,
    },
    Slice {
        elem: Box<TypeNode>,
    },
    Map {
        key: Box<TypeNode>,
        elem: Box<TypeNode>,
    },
    Basic {
        name: String,
    },
    // Shapes the catalog can describe but the rewriter refuses to render.
    Interface,
    Func,
    Chan {
        elem: Box<TypeNode>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    #[serde(rename = "type")]
    pub type_: TypeNode,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub tag: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub anonymous: bool,
}

impl Field {
    pub fn new(name: impl Into<String>, type_: TypeNode) -> Self {
        Self {
            name: name.into(),
            type_,
            tag: String::new(),
            anonymous: false,
        }
    }

    /// An embedded field. Its name is the embedded type's name and never
    /// appears in field paths.
    pub fn embedded(name: impl Into<String>, type_: TypeNode) -> Self {
        Self {
            anonymous: true,
            ..Self::new(name, type_)
        }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }
}

impl TypeNode {
    pub fn named(module: impl Into<String>, name: impl Into<String>) -> Self {
        TypeNode::Named(NamedRef {
            module: module.into(),
            name: name.into(),
        })
    }

    pub fn basic(name: impl Into<String>) -> Self {
        TypeNode::Basic { name: name.into() }
    }

    pub fn pointer(elem: TypeNode) -> Self {
        TypeNode::Pointer {
            elem: Box::new(elem),
        }
    }

    pub fn slice(elem: TypeNode) -> Self {
        TypeNode::Slice {
            elem: Box::new(elem),
        }
    }

    pub fn array(len: u64, elem: TypeNode) -> Self {
        TypeNode::Array {
            len,
            elem: Box::new(elem),
        }
    }

    pub fn map(key: TypeNode, elem: TypeNode) -> Self {
        TypeNode::Map {
            key: Box::new(key),
            elem: Box::new(elem),
        }
    }

    pub fn structure(fields: Vec<Field>) -> Self {
        TypeNode::Struct { fields }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            TypeNode::Named(_) => "named",
            TypeNode::Pointer { .. } => "pointer",
            TypeNode::Struct { .. } => "struct",
            TypeNode::Array { .. } => "array",
            TypeNode::Slice { .. } => "slice",
            TypeNode::Map { .. } => "map",
            TypeNode::Basic { .. } => "basic",
            TypeNode::Interface => "interface",
            TypeNode::Func => "func",
            TypeNode::Chan { .. } => "chan",
        }
    }

    /// Collect every named reference reachable from this node without
    /// crossing into other named types' definitions.
    pub fn collect_named_refs(&self, out: &mut Vec<NamedRef>) {
        match self {
            TypeNode::Named(named) => out.push(named.clone()),
            TypeNode::Pointer { elem }
            | TypeNode::Array { elem, .. }
            | TypeNode::Slice { elem }
            | TypeNode::Chan { elem } => elem.collect_named_refs(out),
            TypeNode::Map { key, elem } => {
                key.collect_named_refs(out);
                elem.collect_named_refs(out);
            }
            TypeNode::Struct { fields } => {
                for field in fields {
                    field.type_.collect_named_refs(out);
                }
            }
            TypeNode::Basic { .. } | TypeNode::Interface | TypeNode::Func => {}
        }
    }
}

/// Fully resolved subject type together with everything it can reach.
#[derive(Debug, Clone)]
pub struct TypeTree {
    /// Name of the subject type.
    pub name: String,
    /// Underlying shape of the subject type.
    pub root: TypeNode,
    /// Modules owning every reachable named type, keyed by path.
    pub modules: BTreeMap<String, ModuleRef>,
    /// Underlying definition of every reachable named type.
    pub named: BTreeMap<NamedRef, TypeNode>,
    /// Aliases the source file gives to imported modules, keyed by module path.
    pub aliases: BTreeMap<String, String>,
}

impl TypeTree {
    pub fn new(name: impl Into<String>, root: TypeNode) -> Self {
        Self {
            name: name.into(),
            root,
            modules: BTreeMap::new(),
            named: BTreeMap::new(),
            aliases: BTreeMap::new(),
        }
    }

    pub fn with_module(mut self, path: impl Into<String>, name: impl Into<String>) -> Self {
        let path = path.into();
        self.modules.insert(
            path.clone(),
            ModuleRef {
                path,
                name: name.into(),
            },
        );
        self
    }

    pub fn with_named(
        mut self,
        module: impl Into<String>,
        name: impl Into<String>,
        definition: TypeNode,
    ) -> Self {
        self.named.insert(
            NamedRef {
                module: module.into(),
                name: name.into(),
            },
            definition,
        );
        self
    }

    pub fn with_alias(mut self, path: impl Into<String>, alias: impl Into<String>) -> Self {
        self.aliases.insert(path.into(), alias.into());
        self
    }

    pub fn module(&self, path: &str) -> Option<&ModuleRef> {
        self.modules.get(path)
    }

    /// Peel named types until a structural shape is reached.
    pub fn underlying<'t>(&'t self, node: &'t TypeNode) -> Result<&'t TypeNode, ResolveError> {
        let mut current = node;
        // A chain longer than the named table can only be a cycle.
        for _ in 0..=self.named.len() {
            let TypeNode::Named(named) = current else {
                return Ok(current);
            };
            current = self
                .named
                .get(named)
                .ok_or_else(|| ResolveError::UnknownType {
                    module: named.module.clone(),
                    name: named.name.clone(),
                })?;
        }
        match current {
            TypeNode::Named(named) => Err(ResolveError::CyclicDefinition(named.to_string())),
            shape => Ok(shape),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_json_shape() {
        let json = r#"{
            "kind": "struct",
            "fields": [
                { "name": "Process", "type": { "kind": "named", "module": "example.com/specs", "name": "Process" }, "anonymous": true },
                { "name": "Args", "type": { "kind": "slice", "elem": { "kind": "basic", "name": "string" } }, "tag": "json:\"args\"" },
                { "name": "Env", "type": { "kind": "map", "key": { "kind": "basic", "name": "string" }, "elem": { "kind": "pointer", "elem": { "kind": "basic", "name": "int" } } } },
                { "name": "Done", "type": { "kind": "chan", "elem": { "kind": "basic", "name": "bool" } } },
                { "name": "Any", "type": { "kind": "interface" } }
            ]
        }"#;
        let node: TypeNode = serde_json::from_str(json).unwrap();

        let expected = TypeNode::structure(vec![
            Field::embedded("Process", TypeNode::named("example.com/specs", "Process")),
            Field::new("Args", TypeNode::slice(TypeNode::basic("string")))
                .with_tag("json:\"args\""),
            Field::new(
                "Env",
                TypeNode::map(
                    TypeNode::basic("string"),
                    TypeNode::pointer(TypeNode::basic("int")),
                ),
            ),
            Field::new(
                "Done",
                TypeNode::Chan {
                    elem: Box::new(TypeNode::basic("bool")),
                },
            ),
            Field::new("Any", TypeNode::Interface),
        ]);
        assert_eq!(node, expected);
    }

    #[test]
    fn test_collect_named_refs() {
        let node = TypeNode::structure(vec![
            Field::new("A", TypeNode::pointer(TypeNode::named("m", "A"))),
            Field::new(
                "B",
                TypeNode::map(TypeNode::named("m", "K"), TypeNode::named("n", "V")),
            ),
        ]);
        let mut refs = Vec::new();
        node.collect_named_refs(&mut refs);

        let names: Vec<String> = refs.iter().map(|r| r.to_string()).collect();
        assert_eq!(names, vec!["m.A", "m.K", "n.V"]);
    }

    #[test]
    fn test_underlying_peels_named_chain() {
        let tree = TypeTree::new("T", TypeNode::basic("int"))
            .with_named("m", "Outer", TypeNode::named("m", "Inner"))
            .with_named("m", "Inner", TypeNode::slice(TypeNode::basic("byte")));

        let outer = TypeNode::named("m", "Outer");
        assert_eq!(
            tree.underlying(&outer).unwrap(),
            &TypeNode::slice(TypeNode::basic("byte"))
        );
    }

    #[test]
    fn test_underlying_detects_cycle() {
        let tree = TypeTree::new("T", TypeNode::basic("int"))
            .with_named("m", "A", TypeNode::named("m", "B"))
            .with_named("m", "B", TypeNode::named("m", "A"));

        let err = tree.underlying(&TypeNode::named("m", "A")).unwrap_err();
        assert!(matches!(err, ResolveError::CyclicDefinition(_)));
    }

    #[test]
    fn test_underlying_unknown_type() {
        let tree = TypeTree::new("T", TypeNode::basic("int"));
        let err = tree.underlying(&TypeNode::named("m", "Missing")).unwrap_err();
        assert!(matches!(err, ResolveError::UnknownType { .. }));
    }
}
