use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use stratus_lib::consts::APP_NAME;

mod cmd;
mod output;

use crate::cmd::{ContextCommand, cmd_context, cmd_status};
use crate::output::OutputFormat;

/// stratus - Infrastructure synthesis toolkit
#[derive(Parser)]
#[command(name = APP_NAME)]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Project root directory
  #[arg(short, long, global = true, default_value = ".")]
  project: PathBuf,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Inspect and edit the cached synthesis context
  Context {
    #[command(subcommand)]
    command: ContextCommand,
  },

  /// Show the last synthesized assembly
  Status {
    /// List resources and missing references
    #[arg(short, long)]
    verbose: bool,

    /// Output format
    #[arg(short = 'o', long, value_enum, default_value = "text")]
    output: OutputFormat,
  },
}

fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::from_default_env())
    .without_time()
    .init();

  let cli = Cli::parse();
  let project = dunce::canonicalize(&cli.project).unwrap_or(cli.project);

  match cli.command {
    Commands::Context { command } => cmd_context(&project, command),
    Commands::Status { verbose, output } => cmd_status(&project, verbose, output),
  }
}
