use anyhow::{Context, Result};
use colored::Colorize;
use restruct::RuleTable;

/// Parse `rules` and print the prefix-closed table they expand to.
pub fn show(rules: &[String]) -> Result<()> {
    let table = RuleTable::parse(rules).context("Failed to parse rewrite rules")?;

    if table.is_empty() {
        println!("{}", "No rules given; every field passes through.".dimmed());
        return Ok(());
    }

    let width = table
        .iter()
        .map(|(path, _)| path.to_string().len())
        .max()
        .unwrap_or(0);

    for (path, action) in table.iter() {
        println!("{:<width$}  {}", path.to_string().bold(), action, width = width);
    }

    Ok(())
}
