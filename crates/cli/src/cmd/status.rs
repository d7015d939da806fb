//! Status command implementation.
//!
//! Displays the last synthesized assembly including resource counts, missing
//! references, and the size of the context cache.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use stratus_lib::assembly::{AssemblyManifest, MANIFEST_FILENAME};
use stratus_lib::consts::{DEFAULT_BUILD_DIR, STATE_DIR_NAME};
use stratus_lib::context::ContextCache;

use crate::output::{
  self, OutputFormat, format_bytes, print_error, print_info, print_json, print_stat,
  print_success, print_warning,
};

pub fn cmd_status(project: &Path, verbose: bool, output: OutputFormat) -> Result<()> {
  let manifest_path = project.join(DEFAULT_BUILD_DIR).join(MANIFEST_FILENAME);

  if !manifest_path.exists() {
    print_info("No assembly found. Synthesize the project to create one.");
    return Ok(());
  }

  let content = fs::read_to_string(&manifest_path)
    .with_context(|| format!("Failed to read {}", manifest_path.display()))?;
  let manifest: AssemblyManifest = serde_json::from_str(&content)
    .with_context(|| format!("Failed to parse {}", manifest_path.display()))?;

  let cache = ContextCache::new(project.join(STATE_DIR_NAME));
  let context_entries = match cache.load() {
    Ok(store) => store.len(),
    Err(e) => {
      print_error(&format!("Error loading context cache: {}", e));
      return Err(e.into());
    }
  };

  if output.is_json() {
    let resource_list: Vec<_> = manifest
      .resources
      .values()
      .map(|r| serde_json::json!({ "id": r.id, "kind": r.kind }))
      .collect();
    let missing_list: Vec<_> = manifest
      .missing
      .iter()
      .map(|m| serde_json::json!({ "key": m.key, "provider": m.provider }))
      .collect();
    let json_output = serde_json::json!({ "manifest_version": manifest.version, "path": manifest_path.display().to_string(), "resources": { "count": manifest.resources.len(), "items": resource_list }, "missing": { "count": manifest.missing.len(), "items": missing_list }, "context_entries": context_entries });
    print_json(&json_output)?;
  } else {
    print_success(&format!("Assembly: {}", manifest_path.display()));
    println!();
    print_stat("Resources", &manifest.resources.len().to_string());
    print_stat("Missing", &manifest.missing.len().to_string());
    print_stat("Context", &format!("{} entry(s)", context_entries));

    if verbose {
      if !manifest.resources.is_empty() {
        println!();
        println!("Resources:");
        for resource in manifest.resources.values() {
          println!("  {} {} ({})", output::symbols::INFO, resource.id, resource.kind);
        }
      }

      if !manifest.missing.is_empty() {
        println!();
        println!("Missing references:");
        for missing in &manifest.missing {
          println!("  {} {} ({})", output::symbols::INFO, missing.key, missing.provider);
        }
      }
    }

    println!();
    print_stat("Manifest size", &format_bytes(content.len() as u64));

    if !verbose && !manifest.missing.is_empty() {
      print_warning(&format!(
        "{} unresolved reference(s). Run with --verbose for details.",
        manifest.missing.len()
      ));
    }
  }

  Ok(())
}
