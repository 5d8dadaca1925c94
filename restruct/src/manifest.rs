//! Dependency manifest parsing
//!
//! The manifest is line oriented: `module-path-prefix version-ref [fork-label]`.
//! Blank lines and `#` comments are skipped. Entries are only used to
//! annotate external imports in the generated file.

use crate::error::{RestructError, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    pub prefix: String,
    pub version: String,
    pub fork: Option<String>,
}

impl ManifestEntry {
    /// Trailing comment text for an import resolved through this entry.
    pub fn annotation(&self) -> String {
        match &self.fork {
            Some(fork) => format!("{} {}", self.version, fork),
            None => self.version.clone(),
        }
    }

    fn covers(&self, import_path: &str) -> bool {
        match import_path.strip_prefix(self.prefix.as_str()) {
            Some(rest) => rest.is_empty() || rest.starts_with('/'),
            None => false,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Manifest {
    entries: BTreeMap<String, ManifestEntry>,
}

impl Manifest {
    pub fn parse(content: &str) -> Self {
        let mut entries = BTreeMap::new();
        for (index, raw) in content.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let fields: Vec<&str> = line
                .split_whitespace()
                .take_while(|field| !field.starts_with('#'))
                .collect();
            let [prefix, version, rest @ ..] = fields.as_slice() else {
                tracing::warn!(line = index + 1, content = line, "skipping manifest line without a version");
                continue;
            };
            // Later lines for the same prefix replace earlier ones.
            entries.insert(
                prefix.to_string(),
                ManifestEntry {
                    prefix: prefix.to_string(),
                    version: version.to_string(),
                    fork: rest.first().map(|fork| fork.to_string()),
                },
            );
        }
        Self { entries }
    }

    /// Load the manifest at `path`. When `shared` is given it must resolve to
    /// the very same file, which is how a per-directory manifest is kept in
    /// lockstep with the top-level one.
    pub fn load(path: &Path, shared: Option<&Path>) -> Result<Self> {
        let manifest_error = |path: &Path| {
            let path = path.to_path_buf();
            move |source| RestructError::Manifest { path, source }
        };

        let canonical = fs::canonicalize(path).map_err(manifest_error(path))?;
        if let Some(shared) = shared {
            let shared_canonical = fs::canonicalize(shared).map_err(manifest_error(shared))?;
            if canonical != shared_canonical {
                return Err(RestructError::ManifestNotShared {
                    path: path.to_path_buf(),
                    shared: shared.to_path_buf(),
                });
            }
        }

        let content = fs::read_to_string(path).map_err(manifest_error(path))?;
        let manifest = Self::parse(&content);
        tracing::debug!(path = %path.display(), entries = manifest.len(), "manifest loaded");
        Ok(manifest)
    }

    /// The most specific entry whose prefix covers `import_path`.
    pub fn lookup(&self, import_path: &str) -> Option<&ManifestEntry> {
        self.entries
            .values()
            .filter(|entry| entry.covers(import_path))
            .max_by_key(|entry| entry.prefix.len())
    }

    pub fn entries(&self) -> impl Iterator<Item = &ManifestEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
