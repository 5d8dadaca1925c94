use anyhow::{Context, Result};
use restruct::{
    generate_to, parse_catalog_file, CatalogResolver, FormatterKind, GenerateRequest, Manifest,
    SourceRef,
};
use std::path::PathBuf;

use crate::config::RestructConfig;
use crate::ui;

/// Marker `go:generate` lines put between the command and its positionals.
const ARGS_SEPARATOR: &str = "--";

/// Command-line inputs of `restruct generate`, before config merging.
pub struct GenerateArgs {
    pub file: PathBuf,
    pub line: usize,
    pub package: String,
    pub catalog: Option<PathBuf>,
    pub module: Option<String>,
    pub manifest: Option<PathBuf>,
    pub shared_manifest: Option<PathBuf>,
    pub formatter: Option<FormatterKind>,
    pub stdout: bool,
    pub args: Vec<String>,
}

/// Fully merged settings; flags win over restruct.toml.
#[derive(Debug, PartialEq)]
struct Settings {
    catalog: PathBuf,
    module: String,
    manifest: PathBuf,
    shared_manifest: Option<PathBuf>,
    formatter: FormatterKind,
}

pub fn generate(config_path: &str, args: GenerateArgs) -> Result<()> {
    let config = RestructConfig::load_optional(config_path)?.unwrap_or_default();
    let (target, rules) = split_target(&args.args)?;
    let settings = merge_settings(&config, &args)?;

    if !args.stdout {
        ui::print_step(&format!(
            "Generating {} from {}:{}",
            target.display(),
            args.file.display(),
            args.line
        ));
    }
    if rules.is_empty() {
        ui::print_warning("No rewrite rules given; nested named types stay opaque");
    }

    let catalog = parse_catalog_file(&settings.catalog)?;
    let resolver = CatalogResolver::new(catalog, settings.module.clone());
    let manifest = Manifest::load(&settings.manifest, settings.shared_manifest.as_deref())
        .context("Failed to load dependency manifest")?;
    let formatter = settings.formatter.formatter();
    tracing::debug!(
        catalog = %settings.catalog.display(),
        module = %settings.module,
        manifest = %settings.manifest.display(),
        formatter = formatter.name(),
        "settings resolved"
    );

    let request = GenerateRequest {
        source: SourceRef::new(&args.file, args.line),
        package: args.package.clone(),
        rules,
    };

    if args.stdout {
        let source = restruct::generate(&request, &resolver, &manifest, formatter.as_ref())?;
        print!("{}", source);
        return Ok(());
    }

    let source = generate_to(&request, &target, &resolver, &manifest, formatter.as_ref())
        .with_context(|| format!("Failed to generate {}", target.display()))?;

    ui::print_success(&format!("Wrote {}", target.display()));
    ui::print_info(&format!("{} bytes", source.len()));
    Ok(())
}

/// Split positionals into the output file and the rules that follow it.
fn split_target(args: &[String]) -> Result<(PathBuf, Vec<String>)> {
    let mut positionals = args.iter();
    let mut target = positionals.next();
    if target.map(String::as_str) == Some(ARGS_SEPARATOR) {
        target = positionals.next();
    }

    let target = target.context("Missing output file: expected `<TARGET> [RULES...]`")?;
    Ok((PathBuf::from(target), positionals.cloned().collect()))
}

fn merge_settings(config: &RestructConfig, args: &GenerateArgs) -> Result<Settings> {
    let catalog = args
        .catalog
        .clone()
        .or_else(|| config.catalog.as_ref().map(|c| c.path.clone()))
        .context("No type catalog configured: pass --catalog or set [catalog].path")?;

    let module = args
        .module
        .clone()
        .or_else(|| config.catalog.as_ref().map(|c| c.module.clone()))
        .context("No source module configured: pass --module or set [catalog].module")?;

    Ok(Settings {
        catalog,
        module,
        manifest: args
            .manifest
            .clone()
            .unwrap_or_else(|| config.manifest_path()),
        shared_manifest: args
            .shared_manifest
            .clone()
            .or_else(|| config.shared_manifest()),
        formatter: args.formatter.unwrap_or_else(|| config.formatter()),
    })
}
