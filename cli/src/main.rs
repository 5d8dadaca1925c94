//! # restruct-cli
//!
//! Command-line driver for the `restruct` struct rewriter. It is meant to be
//! called from a `go:generate` directive placed right above a type
//! declaration:
//!
//! ```go
//! //go:generate restruct generate -- process.go .Capabilities-> .User.UID->int
//! type ProcessState struct {
//!     specs.Process
//! }
//! ```
//!
//! ## Commands
//!
//! - `restruct generate <TARGET> [RULES...]` - Generate a rewritten declaration
//! - `restruct rules [RULES...]` - Print the rule table a rule list expands to
//! - `restruct config validate` - Validate `restruct.toml`
//!
//! See `restruct --help` for the full command reference.

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use colored::Colorize;
use restruct::FormatterKind;
use std::io;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod ui;

#[derive(Parser)]
#[command(name = "restruct")]
#[command(about = "Rewrite Go struct declarations from their resolved type", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Path to restruct.toml configuration file
    #[arg(short, long, global = true, default_value = "restruct.toml")]
    config: String,

    /// Enable verbose output
    #[arg(long, global = true)]
    verbose: bool,

    /// Generate shell completions
    #[arg(long, value_name = "SHELL")]
    completions: Option<Shell>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a rewritten type declaration into TARGET
    Generate {
        /// Source file holding the annotated declaration
        #[arg(long, env = "GOFILE")]
        file: PathBuf,

        /// Line of the generate directive; the declaration follows it
        #[arg(long, env = "GOLINE")]
        line: usize,

        /// Package clause of the generated file
        #[arg(long, env = "GOPACKAGE")]
        package: String,

        /// JSON type catalog (overrides [catalog].path)
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Module path of the source file (overrides [catalog].module)
        #[arg(long)]
        module: Option<String>,

        /// Dependency manifest (overrides [manifest].path)
        #[arg(long)]
        manifest: Option<PathBuf>,

        /// Path the manifest must be shared with (overrides [manifest].shared)
        #[arg(long)]
        shared_manifest: Option<PathBuf>,

        /// Formatter to run: builtin, gofmt or none (overrides [output].formatter)
        #[arg(long)]
        formatter: Option<FormatterKind>,

        /// Print the generated source instead of writing TARGET
        #[arg(long)]
        stdout: bool,

        /// Output file followed by rewrite rules (`.path->` or `.path->type`)
        #[arg(required = true, num_args = 1.., allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// Print the rule table a list of rules expands to
    Rules {
        /// Rewrite rules (`.path->` or `.path->type`)
        #[arg(allow_hyphen_values = true)]
        rules: Vec<String>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Validate restruct.toml
    Validate,
}

fn main() {
    let cli = Cli::parse();

    if let Some(shell) = cli.completions {
        let mut cmd = Cli::command();
        generate(shell, &mut cmd, "restruct", &mut io::stdout());
        return;
    }

    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    match command {
        Commands::Generate {
            file,
            line,
            package,
            catalog,
            module,
            manifest,
            shared_manifest,
            formatter,
            stdout,
            args,
        } => commands::generate::generate(
            &cli.config,
            commands::generate::GenerateArgs {
                file,
                line,
                package,
                catalog,
                module,
                manifest,
                shared_manifest,
                formatter,
                stdout,
                args,
            },
        ),
        Commands::Rules { rules } => commands::rules::show(&rules),
        Commands::Config { action } => match action {
            ConfigCommands::Validate => commands::config::validate(&cli.config),
        },
    }
}
