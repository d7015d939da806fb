//! Synthesis orchestration.
//!
//! Drives one synthesis run end to end:
//!
//! 1. Resolve environment facts from the providers.
//! 2. Load the persisted context cache.
//! 3. Hand a fresh application model to the resource definition.
//! 4. Drain deferred tasks in registration order.
//! 5. Finalize the model into an assembly and persist the context.
//!
//! The run is fail-fast: the first phase to error aborts the run and no
//! later phase executes.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::app::deferred::DeferredError;
use crate::app::{App, DefinitionError};
use crate::assembly::{Assembly, AssemblyError, finalize};
use crate::consts::DEFAULT_BUILD_DIR;
use crate::context::{ContextCache, ContextError};
use crate::environment::{EnvironmentError, resolve_environment};
use crate::providers::Providers;

/// Options controlling one synthesis run.
#[derive(Debug, Clone)]
pub struct SynthOptions {
  /// Default output directory, relative to the project root.
  pub build_dir: PathBuf,
  /// Explicit output directory, overriding `build_dir` when set.
  pub out_dir: Option<PathBuf>,
  /// Whether to skip artifact builds this run.
  pub skip_build: bool,
}

impl Default for SynthOptions {
  fn default() -> Self {
    Self {
      build_dir: PathBuf::from(DEFAULT_BUILD_DIR),
      out_dir: None,
      skip_build: false,
    }
  }
}

/// Errors that can occur during a synthesis run.
#[derive(Debug, Error)]
pub enum SynthError {
  /// The environment could not be resolved.
  #[error("environment error: {0}")]
  Environment(#[from] EnvironmentError),

  /// The context cache could not be loaded.
  #[error("context error: {0}")]
  Context(#[from] ContextError),

  /// The resource definition returned an error.
  #[error("resource definition error: {0}")]
  Definition(#[source] DefinitionError),

  /// A deferred task failed or was registered too late.
  #[error("deferred task error: {0}")]
  Deferred(#[from] DeferredError),

  /// The assembly could not be finalized.
  #[error("assembly error: {0}")]
  Assembly(#[from] AssemblyError),
}

/// Resolve the output directory for a run.
///
/// Both `out_dir` and `build_dir` are taken relative to the project root
/// (the parent of the state directory); an absolute `out_dir` is used as
/// given.
pub fn resolve_out_dir(options: &SynthOptions, state_dir: &Path) -> PathBuf {
  let root = state_dir.parent().unwrap_or(state_dir);
  match &options.out_dir {
    Some(dir) => root.join(dir),
    None => root.join(&options.build_dir),
  }
}

/// Run one synthesis pass over the given resource definition.
///
/// Resolves the environment, loads the context cache, runs the definition
/// against a fresh [`App`], drains deferred tasks, and finalizes the result
/// into an [`Assembly`].
pub async fn synthesize<F>(
  providers: &Providers,
  options: &SynthOptions,
  definition: F,
) -> Result<Assembly, SynthError>
where
  F: AsyncFnOnce(&mut App) -> Result<(), DefinitionError>,
{
  debug!("starting synthesis");

  // 1. Resolve environment facts.
  let facts = resolve_environment(providers).await?;

  // 2. Load the persisted context.
  let state_dir = providers.state.state_dir();
  let cache = ContextCache::new(&state_dir);
  let context = cache.load()?;
  debug!(entries = context.len(), "context loaded");

  // 3. Run the resource definition.
  let out_dir = resolve_out_dir(options, &state_dir);
  let mut app = App::new(facts, out_dir, options.skip_build, context);
  definition(&mut app).await.map_err(SynthError::Definition)?;
  debug!(resources = app.resources().len(), "definition complete");

  // 4. Drain deferred tasks.
  let drained = app.run_deferred().await?;
  debug!(tasks = drained, "deferred tasks complete");

  // 5. Finalize into an assembly.
  Ok(finalize(app, &cache)?)
}
