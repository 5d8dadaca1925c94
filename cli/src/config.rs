use anyhow::{Context, Result};
use restruct::FormatterKind;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default manifest file, looked up relative to the working directory.
pub const DEFAULT_MANIFEST: &str = "vendor.conf";

/// Configuration read from restruct.toml.
/// The file is OPTIONAL - every value can also be given on the command line.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RestructConfig {
    #[serde(default)]
    pub catalog: Option<CatalogConfig>,

    #[serde(default)]
    pub manifest: Option<ManifestConfig>,

    #[serde(default)]
    pub output: Option<OutputConfig>,
}

/// Where subject types are resolved from
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// JSON type catalog
    pub path: PathBuf,

    /// Module path of the annotated source file
    pub module: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestConfig {
    #[serde(default = "default_manifest_path")]
    pub path: PathBuf,

    /// Second location that must resolve to the same manifest file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shared: Option<PathBuf>,
}

impl Default for ManifestConfig {
    fn default() -> Self {
        Self {
            path: default_manifest_path(),
            shared: None,
        }
    }
}

fn default_manifest_path() -> PathBuf {
    PathBuf::from(DEFAULT_MANIFEST)
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub formatter: FormatterKind,
}

impl RestructConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: RestructConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config.validate()?;
        Ok(config)
    }

    /// Try to load config, returning None if file doesn't exist
    pub fn load_optional<P: AsRef<Path>>(path: P) -> Result<Option<Self>> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(None);
        }
        Self::load(path).map(Some)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if let Some(catalog) = &self.catalog {
            if catalog.path.as_os_str().is_empty() {
                anyhow::bail!("[catalog] path cannot be empty");
            }
            if catalog.module.trim().is_empty() {
                anyhow::bail!("[catalog] module cannot be empty");
            }
        }

        if let Some(manifest) = &self.manifest {
            if manifest.path.as_os_str().is_empty() {
                anyhow::bail!("[manifest] path cannot be empty");
            }
            if manifest.shared.as_deref() == Some(manifest.path.as_path()) {
                anyhow::bail!("[manifest] shared must name a different path than [manifest] path");
            }
        }

        Ok(())
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.manifest
            .as_ref()
            .map(|m| m.path.clone())
            .unwrap_or_else(default_manifest_path)
    }

    pub fn shared_manifest(&self) -> Option<PathBuf> {
        self.manifest.as_ref().and_then(|m| m.shared.clone())
    }

    pub fn formatter(&self) -> FormatterKind {
        self.output
            .as_ref()
            .map(|o| o.formatter)
            .unwrap_or_default()
    }
}
