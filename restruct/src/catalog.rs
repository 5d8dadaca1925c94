//! JSON type catalog
//!
//! A hand-authored structural description of a closed set of modules and
//! the named types they define.

use crate::error::{RestructError, Result};
use crate::types::{ModuleRef, TypeNode};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Catalog {
    #[serde(default)]
    pub modules: Vec<CatalogModule>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CatalogModule {
    pub path: String,
    /// Name exposed to importers. Defaults to the last path segment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub types: BTreeMap<String, TypeNode>,
}

impl CatalogModule {
    pub fn exposed_name(&self) -> &str {
        match &self.name {
            Some(name) => name,
            None => self.path.rsplit('/').next().unwrap_or(&self.path),
        }
    }

    pub fn module_ref(&self) -> ModuleRef {
        ModuleRef {
            path: self.path.clone(),
            name: self.exposed_name().to_string(),
        }
    }
}

impl Catalog {
    pub fn module(&self, path: &str) -> Option<&CatalogModule> {
        self.modules.iter().find(|module| module.path == path)
    }
}

pub fn parse_catalog_file<P: AsRef<Path>>(path: P) -> Result<Catalog> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| RestructError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_catalog_content(&content).map_err(|source| RestructError::Catalog {
        path: path.to_path_buf(),
        source,
    })
}

pub fn parse_catalog_content(content: &str) -> std::result::Result<Catalog, serde_json::Error> {
    serde_json::from_str(content)
}
