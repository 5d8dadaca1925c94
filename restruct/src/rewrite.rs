//! Structural rewriter
//!
//! Walks a resolved [`TypeTree`] alongside a [`RuleTable`] and emits the
//! body of a new type declaration in compact form (`struct{A int;B string;}`),
//! recording every module an opaque named reference pulls in.
//!
//! Pointer markers are not written eagerly. Consecutive pointers only bump
//! a pending counter that is flushed right before the next non-pointer
//! content, so a replacement further down the same path can still drop them,
//! and embedded positions discard them entirely.

use crate::error::{ResolveError, RestructError, Result};
use crate::imports::ImportSet;
use crate::rules::{FieldPath, RuleAction, RuleTable};
use crate::types::{Field, NamedRef, TypeNode, TypeTree};

/// Output of a rewrite: the declaration body and the modules it references.
#[derive(Debug, Clone)]
pub struct Rendered {
    pub body: String,
    pub imports: ImportSet,
}

pub struct Rewriter<'a> {
    tree: &'a TypeTree,
    rules: &'a RuleTable,
    pending_pointers: usize,
    imports: ImportSet,
}

impl<'a> Rewriter<'a> {
    pub fn new(tree: &'a TypeTree, rules: &'a RuleTable) -> Self {
        Self {
            tree,
            rules,
            pending_pointers: 0,
            imports: ImportSet::default(),
        }
    }

    /// Render the subject's underlying shape. A subject declared as another
    /// named type is peeled first so the root is always expanded.
    pub fn render(mut self) -> Result<Rendered> {
        let tree = self.tree;
        let root = tree.underlying(&tree.root)?;
        let mut body = String::new();
        self.write_type(&mut body, &FieldPath::root(), false, root)?;
        Ok(Rendered {
            body,
            imports: self.imports,
        })
    }

    fn flush_pointers(&mut self, out: &mut String, anonymous: bool) {
        if self.pending_pointers > 0 {
            if !anonymous {
                out.extend(std::iter::repeat('*').take(self.pending_pointers));
            }
            self.pending_pointers = 0;
        }
    }

    fn write_type(
        &mut self,
        out: &mut String,
        path: &FieldPath,
        anonymous: bool,
        node: &'a TypeNode,
    ) -> Result<()> {
        let (tree, rules) = (self.tree, self.rules);
        let rule = rules.get(path);
        if let Some(RuleAction::Replace(text)) = rule {
            self.flush_pointers(out, anonymous);
            out.push_str(text);
            return Ok(());
        }

        // Off every rule's ancestor chain a named type stays opaque. Embedded
        // positions always expand so the promoted fields get re-declared.
        if !anonymous && rule.is_none() {
            if let TypeNode::Named(named) = node {
                self.flush_pointers(out, anonymous);
                return self.write_named(out, named);
            }
        }

        let shape = tree.underlying(node)?;
        if let TypeNode::Pointer { elem } = shape {
            self.pending_pointers += 1;
            return self.write_type(out, path, anonymous, elem);
        }
        self.flush_pointers(out, anonymous);

        match shape {
            TypeNode::Struct { fields } => self.write_struct(out, path, anonymous, fields),
            TypeNode::Array { len, elem } => {
                out.push_str(&format!("[{}]", len));
                self.write_type(out, path, anonymous, elem)
            }
            TypeNode::Slice { elem } => {
                out.push_str("[]");
                self.write_type(out, path, anonymous, elem)
            }
            TypeNode::Map { key, elem } => {
                out.push_str("map[");
                self.write_type(out, path, anonymous, key)?;
                out.push(']');
                self.write_type(out, path, anonymous, elem)
            }
            TypeNode::Basic { name } => {
                out.push_str(name);
                Ok(())
            }
            other => Err(RestructError::UnsupportedKind {
                kind: other.kind_name(),
                path: path.to_string(),
                partial: out.clone(),
            }),
        }
    }

    fn write_struct(
        &mut self,
        out: &mut String,
        path: &FieldPath,
        anonymous: bool,
        fields: &'a [Field],
    ) -> Result<()> {
        if !anonymous {
            out.push_str("struct{");
        }
        for field in fields {
            if field.anonymous {
                self.write_type(out, path, true, &field.type_)?;
                continue;
            }

            let field_path = path.child(&field.name);
            if self.is_unrolled_record(&field_path, &field.type_)? {
                self.write_type(out, &field_path, true, &field.type_)?;
                continue;
            }

            out.push_str(&field.name);
            out.push(' ');
            self.write_type(out, &field_path, false, &field.type_)?;
            write_tag(out, &field.tag);
            out.push(';');
        }
        if !anonymous {
            out.push('}');
        }
        Ok(())
    }

    fn write_named(&mut self, out: &mut String, named: &NamedRef) -> Result<()> {
        let tree = self.tree;
        let module = tree
            .module(&named.module)
            .ok_or_else(|| ResolveError::UnknownModule(named.module.clone()))?;
        let (qualifier, aliased) = match tree.aliases.get(&module.path) {
            Some(alias) => (alias.as_str(), true),
            None => (module.name.as_str(), false),
        };
        self.imports.record(&module.path, qualifier, aliased);
        out.push_str(qualifier);
        out.push('.');
        out.push_str(&named.name);
        Ok(())
    }

    /// Whether `path` is an unroll target whose shape, through pointers and
    /// named types, is a record.
    fn is_unrolled_record(&self, path: &FieldPath, node: &TypeNode) -> Result<bool> {
        if self.rules.get(path) != Some(&RuleAction::Unroll) {
            return Ok(false);
        }
        let mut shape = self.tree.underlying(node)?;
        while let TypeNode::Pointer { elem } = shape {
            shape = self.tree.underlying(elem)?;
        }
        Ok(matches!(shape, TypeNode::Struct { .. }))
    }
}

/// Copy a field tag. Tags containing a backquote cannot be raw strings and
/// are written as an interpreted string literal instead.
fn write_tag(out: &mut String, tag: &str) {
    if tag.is_empty() {
        return;
    }
    out.push(' ');
    if tag.contains('`') {
        out.push_str(&quote(tag));
    } else {
        out.push('`');
        out.push_str(tag);
        out.push('`');
    }
}

fn quote(s: &str) -> String {
    let mut quoted = String::with_capacity(s.len() + 2);
    quoted.push('"');
    for c in s.chars() {
        match c {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            '\r' => quoted.push_str("\\r"),
            '\t' => quoted.push_str("\\t"),
            c if c.is_control() && (c as u32) < 0x80 => {
                quoted.push_str(&format!("\\x{:02x}", c as u32))
            }
            c if c.is_control() => quoted.push_str(&format!("\\u{:04x}", c as u32)),
            c => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}

/// Render `tree` with `rules`.
pub fn rewrite(tree: &TypeTree, rules: &RuleTable) -> Result<Rendered> {
    Rewriter::new(tree, rules).render()
}
