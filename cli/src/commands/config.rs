use anyhow::{Context, Result};
use colored::Colorize;

use crate::config::RestructConfig;
use crate::ui;

pub fn validate(config_path: &str) -> Result<()> {
    ui::print_step("Validating configuration...");

    let config = RestructConfig::load(config_path)
        .context("Failed to load configuration. Create restruct.toml or pass --config.")?;

    ui::print_success("Configuration is valid!");
    println!();

    match &config.catalog {
        Some(catalog) => {
            ui::print_item("Catalog", &catalog.path.display().to_string());
            ui::print_item("Module", &catalog.module);
        }
        None => {
            println!(
                "  {} No [catalog] section; pass {} and {} to generate",
                "!".yellow(),
                "--catalog".cyan(),
                "--module".cyan()
            );
        }
    }

    ui::print_item("Manifest", &config.manifest_path().display().to_string());
    if let Some(shared) = config.shared_manifest() {
        ui::print_item("Shared with", &shared.display().to_string());
    }
    ui::print_item("Formatter", &config.formatter().to_string());

    Ok(())
}
