//! Context cache commands.
//!
//! Inspect and edit the cached synthesis decisions stored in `context.json`
//! under the project state directory.

use std::io::{self, IsTerminal, Write};
use std::path::Path;

use anyhow::{Result, bail};
use clap::Subcommand;
use stratus_lib::consts::STATE_DIR_NAME;
use stratus_lib::context::{ContextCache, ContextStore};
use tracing::info;

use crate::output::{OutputFormat, format_value_preview, print_info, print_json, print_success};

#[derive(Subcommand, Debug)]
pub enum ContextCommand {
  /// List cached context entries
  List {
    /// Show full values instead of previews
    #[arg(short, long)]
    verbose: bool,

    /// Output format
    #[arg(short = 'o', long, value_enum, default_value = "text")]
    output: OutputFormat,
  },

  /// Show the cached value for a key
  Get {
    /// Context key to look up
    key: String,

    /// Output format
    #[arg(short = 'o', long, value_enum, default_value = "text")]
    output: OutputFormat,
  },

  /// Remove a cached value
  Remove {
    /// Context key to remove
    key: String,
  },

  /// Remove all cached values
  Clear {
    /// Skip confirmation prompt
    #[arg(long)]
    force: bool,
  },
}

pub fn cmd_context(project: &Path, command: ContextCommand) -> Result<()> {
  let cache = ContextCache::new(project.join(STATE_DIR_NAME));

  match command {
    ContextCommand::List { verbose, output } => cmd_list(&cache, verbose, output),
    ContextCommand::Get { key, output } => cmd_get(&cache, &key, output),
    ContextCommand::Remove { key } => cmd_remove(&cache, &key),
    ContextCommand::Clear { force } => cmd_clear(&cache, force),
  }
}

fn cmd_list(cache: &ContextCache, verbose: bool, output: OutputFormat) -> Result<()> {
  let store = cache.load()?;

  if output.is_json() {
    print_json(&store)?;
  } else {
    if store.is_empty() {
      print_info("No cached context entries");
      return Ok(());
    }

    for (key, value) in store.iter() {
      if verbose {
        println!("{} = {}", key, serde_json::to_string(value)?);
      } else {
        println!("{} = {}", key, format_value_preview(value));
      }
    }

    print_info(&format!("{} entry(s) total", store.len()));
  }

  Ok(())
}

fn cmd_get(cache: &ContextCache, key: &str, output: OutputFormat) -> Result<()> {
  let store = cache.load()?;

  let Some(value) = store.get(key) else {
    bail!("No cached value for key '{}'", key);
  };

  if output.is_json() {
    print_json(value)?;
  } else {
    println!("{}", serde_json::to_string_pretty(value)?);
  }

  Ok(())
}

fn cmd_remove(cache: &ContextCache, key: &str) -> Result<()> {
  let mut store = cache.load()?;

  if store.remove(key).is_none() {
    bail!("No cached value for key '{}'", key);
  }

  cache.save(&store)?;

  info!(key = %key, "removed context entry");
  print_success(&format!("Removed context entry '{}'", key));

  Ok(())
}

fn cmd_clear(cache: &ContextCache, force: bool) -> Result<()> {
  let store = cache.load()?;

  if store.is_empty() {
    print_info("No cached context entries");
    return Ok(());
  }

  if !confirm(&format!("Clear {} context entry(s)?", store.len()), force)? {
    print_info("Cancelled");
    return Ok(());
  }

  cache.save(&ContextStore::new())?;

  info!(entries = store.len(), "cleared context cache");
  print_success(&format!("Cleared {} context entry(s)", store.len()));

  Ok(())
}

fn confirm(message: &str, force: bool) -> Result<bool> {
  if force {
    return Ok(true);
  }

  if !io::stdin().is_terminal() || !io::stderr().is_terminal() {
    bail!("Cannot prompt for confirmation in non-interactive mode. Use --force to proceed.");
  }

  write!(io::stderr(), "{} [y/N] ", message)?;
  io::stderr().flush()?;

  let mut input = String::new();
  io::stdin().read_line(&mut input)?;

  Ok(matches!(input.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}
