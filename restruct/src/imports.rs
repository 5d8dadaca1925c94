//! Import collection and partitioning
//!
//! The rewriter records every module an opaque reference pulls in. At
//! emission time the references are deduplicated, stripped of vendoring
//! indirection, split into standard and external groups and rendered as an
//! import clause.

use crate::manifest::Manifest;
use std::collections::BTreeMap;

const VENDOR_SEGMENT: &str = "/vendor/";

/// A module touched by an opaque reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportReference {
    pub path: String,
    /// Qualifier used in the generated body.
    pub name: String,
    /// Whether `name` came from the caller's own import alias.
    pub aliased: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportClass {
    Standard,
    External,
}

/// Strip everything up to and including the last vendoring segment.
pub fn strip_vendor(path: &str) -> &str {
    if let Some(index) = path.rfind(VENDOR_SEGMENT) {
        &path[index + VENDOR_SEGMENT.len()..]
    } else if let Some(rest) = path.strip_prefix("vendor/") {
        rest
    } else {
        path
    }
}

/// External modules carry a domain-style dot in their first path segment.
pub fn classify(path: &str) -> ImportClass {
    let first = path.split_once('/').map_or(path, |(first, _)| first);
    if first.contains('.') {
        ImportClass::External
    } else {
        ImportClass::Standard
    }
}

/// Module references deduplicated by module path.
#[derive(Debug, Clone, Default)]
pub struct ImportSet {
    refs: BTreeMap<String, ImportReference>,
}

impl ImportSet {
    /// Record a module. The first qualifier recorded for a path is kept.
    pub fn record(&mut self, path: &str, name: &str, aliased: bool) {
        self.refs
            .entry(path.to_string())
            .or_insert_with(|| ImportReference {
                path: path.to_string(),
                name: name.to_string(),
                aliased,
            });
    }

    pub fn iter(&self) -> impl Iterator<Item = &ImportReference> {
        self.refs.values()
    }

    pub fn len(&self) -> usize {
        self.refs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.refs.is_empty()
    }

    pub fn partition(&self, manifest: &Manifest) -> ImportBlock {
        let mut lines: BTreeMap<String, (ImportClass, ImportLine)> = BTreeMap::new();
        for reference in self.refs.values() {
            let path = strip_vendor(&reference.path);
            if lines.contains_key(path) {
                continue;
            }
            let class = classify(path);
            let last_segment = path.rsplit('/').next().unwrap_or(path);
            // A caller's own alias is kept even when it matches the segment.
            let alias = (reference.aliased || last_segment != reference.name)
                .then(|| reference.name.clone());
            let annotation = match class {
                ImportClass::External => manifest.lookup(path).map(|entry| entry.annotation()),
                ImportClass::Standard => None,
            };
            lines.insert(
                path.to_string(),
                (
                    class,
                    ImportLine {
                        path: path.to_string(),
                        alias,
                        annotation,
                    },
                ),
            );
        }

        let mut block = ImportBlock::default();
        for (class, line) in lines.into_values() {
            match class {
                ImportClass::Standard => block.standard.push(line),
                ImportClass::External => block.external.push(line),
            }
        }
        tracing::debug!(
            standard = block.standard.len(),
            external = block.external.len(),
            "imports partitioned"
        );
        block
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportLine {
    pub path: String,
    pub alias: Option<String>,
    pub annotation: Option<String>,
}

impl ImportLine {
    pub fn render(&self) -> String {
        let mut line = String::new();
        if let Some(alias) = &self.alias {
            line.push_str(alias);
            line.push(' ');
        }
        line.push('"');
        line.push_str(&self.path);
        line.push('"');
        if let Some(annotation) = &self.annotation {
            line.push_str(" // ");
            line.push_str(annotation);
        }
        line
    }
}

/// Sorted import groups: standard/local first, then external.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportBlock {
    pub standard: Vec<ImportLine>,
    pub external: Vec<ImportLine>,
}

impl ImportBlock {
    pub fn len(&self) -> usize {
        self.standard.len() + self.external.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Render the import clause, or nothing when there is nothing to import.
    pub fn render(&self) -> String {
        match self.len() {
            0 => String::new(),
            1 => {
                let line = self
                    .standard
                    .iter()
                    .chain(&self.external)
                    .map(ImportLine::render)
                    .collect::<String>();
                format!("import {}\n", line)
            }
            _ => {
                let mut out = String::from("import (\n");
                for line in &self.standard {
                    out.push('\t');
                    out.push_str(&line.render());
                    out.push('\n');
                }
                if !self.standard.is_empty() && !self.external.is_empty() {
                    out.push('\n');
                }
                for line in &self.external {
                    out.push('\t');
                    out.push_str(&line.render());
                    out.push('\n');
                }
                out.push_str(")\n");
                out
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(refs: &[(&str, &str)]) -> ImportSet {
        let mut set = ImportSet::default();
        for (path, name) in refs {
            set.record(path, name, false);
        }
        set
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify("fmt"), ImportClass::Standard);
        assert_eq!(classify("encoding/json"), ImportClass::Standard);
        assert_eq!(classify("example.com/pkg"), ImportClass::External);
        assert_eq!(classify("gopkg.in/yaml.v2"), ImportClass::External);
        assert_eq!(classify("internal/yaml.v2"), ImportClass::Standard);
    }

    #[test]
    fn test_strip_vendor() {
        assert_eq!(
            strip_vendor("example.com/pkg/vendor/other.org/lib"),
            "other.org/lib"
        );
        assert_eq!(strip_vendor("vendor/golang.org/x/sys/unix"), "golang.org/x/sys/unix");
        assert_eq!(
            strip_vendor("a.com/vendor/b.com/vendor/c.org/lib"),
            "c.org/lib"
        );
        assert_eq!(strip_vendor("example.com/vendorized"), "example.com/vendorized");
    }

    #[test]
    fn test_partition_groups_and_sorts() {
        let imports = set(&[
            ("os", "os"),
            ("example.com/zeta", "zeta"),
            ("fmt", "fmt"),
            ("example.com/alpha", "alpha"),
        ])
        .partition(&Manifest::default());

        let standard: Vec<&str> = imports.standard.iter().map(|l| l.path.as_str()).collect();
        let external: Vec<&str> = imports.external.iter().map(|l| l.path.as_str()).collect();
        assert_eq!(standard, vec!["fmt", "os"]);
        assert_eq!(external, vec!["example.com/alpha", "example.com/zeta"]);
    }

    #[test]
    fn test_vendored_reference_is_attributed_to_original_module() {
        let manifest = Manifest::parse("other.org/lib v1.2.3 fork.org/lib\n");
        let imports = set(&[("example.com/pkg/vendor/other.org/lib", "lib")]).partition(&manifest);

        assert!(imports.standard.is_empty());
        assert_eq!(
            imports.external,
            vec![ImportLine {
                path: "other.org/lib".to_string(),
                alias: None,
                annotation: Some("v1.2.3 fork.org/lib".to_string()),
            }]
        );
    }

    #[test]
    fn test_vendored_copies_deduplicate() {
        let imports = set(&[
            ("a.com/x/vendor/other.org/lib", "lib"),
            ("b.com/y/vendor/other.org/lib", "lib"),
        ])
        .partition(&Manifest::default());
        assert_eq!(imports.len(), 1);
    }

    #[test]
    fn test_alias_when_name_differs_from_last_segment() {
        let imports = set(&[
            ("github.com/opencontainers/runtime-spec/specs-go", "specs"),
            ("gopkg.in/yaml.v2", "yaml"),
            ("example.com/plain", "plain"),
        ])
        .partition(&Manifest::default());

        let rendered: Vec<String> = imports.external.iter().map(ImportLine::render).collect();
        assert_eq!(
            rendered,
            vec![
                "\"example.com/plain\"",
                "specs \"github.com/opencontainers/runtime-spec/specs-go\"",
                "yaml \"gopkg.in/yaml.v2\"",
            ]
        );
    }

    #[test]
    fn test_caller_alias_kept_when_equal_to_segment() {
        let mut refs = ImportSet::default();
        refs.record("gopkg.in/yaml.v2", "yaml", true);
        refs.record("example.com/plain", "plain", true);
        refs.record("example.com/bare", "bare", false);
        let imports = refs.partition(&Manifest::default());

        let rendered: Vec<String> = imports.external.iter().map(ImportLine::render).collect();
        assert_eq!(
            rendered,
            vec![
                "\"example.com/bare\"",
                "plain \"example.com/plain\"",
                "yaml \"gopkg.in/yaml.v2\"",
            ]
        );
    }

    #[test]
    fn test_render_single_import() {
        let imports = set(&[("fmt", "fmt")]).partition(&Manifest::default());
        assert_eq!(imports.render(), "import \"fmt\"\n");
    }

    #[test]
    fn test_render_grouped_imports() {
        let manifest = Manifest::parse("example.com v0.1.0\n");
        let imports = set(&[("fmt", "fmt"), ("example.com/pkg", "pkg"), ("os", "os")])
            .partition(&manifest);
        assert_eq!(
            imports.render(),
            "import (\n\t\"fmt\"\n\t\"os\"\n\n\t\"example.com/pkg\" // v0.1.0\n)\n"
        );
    }

    #[test]
    fn test_render_without_separator_for_single_group() {
        let imports = set(&[("fmt", "fmt"), ("os", "os")]).partition(&Manifest::default());
        assert_eq!(imports.render(), "import (\n\t\"fmt\"\n\t\"os\"\n)\n");
    }

    #[test]
    fn test_render_nothing_for_no_imports() {
        assert_eq!(ImportSet::default().partition(&Manifest::default()).render(), "");
    }
}
