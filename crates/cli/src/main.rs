mod cmd;
mod output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::output::OutputFormat;

/// iisbind - Declarative IIS site binding manager
#[derive(Parser)]
#[command(name = "iisbind")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable debug logging (overridden by RUST_LOG)
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Validate every binding declared in a manifest
  Validate {
    /// Path to the manifest (JSON, or YAML with a .yaml/.yml extension)
    manifest: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value_t)]
    format: OutputFormat,
  },

  /// Show the guarded commands each binding would run
  Plan {
    /// Path to the manifest
    manifest: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value_t)]
    format: OutputFormat,
  },

  /// Run the guarded commands through PowerShell
  Apply {
    /// Path to the manifest
    manifest: PathBuf,

    /// Evaluate guards only; never run mutating commands
    #[arg(long)]
    dry_run: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value_t)]
    format: OutputFormat,
  },
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  let default_level = if cli.verbose { "debug" } else { "warn" };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  match cli.command {
    Commands::Validate { manifest, format } => cmd::cmd_validate(&manifest, format),
    Commands::Plan { manifest, format } => cmd::cmd_plan(&manifest, format),
    Commands::Apply {
      manifest,
      dry_run,
      format,
    } => cmd::cmd_apply(&manifest, dry_run, format),
  }
}
