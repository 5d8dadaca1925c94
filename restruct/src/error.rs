//! Error types for rule parsing, resolution, rendering and formatting

use std::path::PathBuf;
use thiserror::Error;

/// Failure to expand the subject type or something it references.
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("failed to read source file {path}: {source}")]
    Source {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("type `{name}` not found in module `{module}`")]
    SubjectNotFound { module: String, name: String },

    #[error("unknown module `{0}`")]
    UnknownModule(String),

    #[error("unknown type `{name}` referenced from module `{module}`")]
    UnknownType { module: String, name: String },

    #[error("named type `{0}` has no structural definition (cyclic alias)")]
    CyclicDefinition(String),
}

#[derive(Error, Debug)]
pub enum RestructError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse type catalog {path}: {source}")]
    Catalog {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("dependency manifest {path} is unavailable: {source}")]
    Manifest {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(
        "{path} and {shared} are different files; make {shared} a symlink to {path} and re-run"
    )]
    ManifestNotShared { path: PathBuf, shared: PathBuf },

    #[error("expecting rewrite rule of the form .Path.To.Struct.Field->replacement, got: {0}")]
    MalformedRule(String),

    #[error("reached EOF before reaching line {line} in {file}")]
    AnchorPastEof { file: PathBuf, line: usize },

    #[error("line {line} of {file} should be directly above a `type Name Shape` declaration")]
    NotATypeDeclaration { file: PathBuf, line: usize },

    #[error("type `{name}` not found in module `{module}`")]
    TypeNotFound { module: String, name: String },

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("{kind} types are not supported (at field path `{path}`); partial output:\n{partial}")]
    UnsupportedKind {
        kind: &'static str,
        path: String,
        partial: String,
    },

    #[error("failed to format generated source: {message}\n--- unformatted source ---\n{raw}")]
    Format { message: String, raw: String },
}

pub type Result<T> = std::result::Result<T, RestructError>;
