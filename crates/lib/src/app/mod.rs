//! Application model assembled during synthesis.
//!
//! The [`App`] is the mutable model a resource definition builds up: declared
//! resources, context reads and writes, recorded lookup misses, and deferred
//! tasks. It is handed to the user-supplied definition, drained of deferred
//! work, then finalized into an immutable assembly.

pub mod deferred;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::context::ContextStore;
use crate::environment::EnvironmentFacts;
use deferred::{DeferredError, DeferredQueue, DeferredTask};

/// Error returned by resource definitions and deferred tasks.
pub type DefinitionError = Box<dyn std::error::Error + Send + Sync>;

/// A declared infrastructure resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
  /// Identifier, unique within the application.
  pub id: String,
  /// Resource kind (e.g., "aws:s3:Bucket").
  pub kind: String,
  /// Declared properties.
  pub properties: Value,
}

impl Resource {
  /// Create a resource with the given identity and properties.
  pub fn new(id: impl Into<String>, kind: impl Into<String>, properties: Value) -> Self {
    Self {
      id: id.into(),
      kind: kind.into(),
      properties,
    }
  }
}

/// A context lookup that found no cached value.
///
/// Recorded so callers can resolve the value out-of-band and retry the run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissingReference {
  /// Cache key the lookup was made under.
  pub key: String,
  /// Provider able to resolve the value.
  pub provider: String,
  /// Provider-specific lookup arguments.
  pub props: Value,
}

/// Errors that can occur while building the application model.
#[derive(Debug, Error)]
pub enum AppError {
  /// A resource was added under an id that is already taken.
  #[error("duplicate resource id {0}")]
  DuplicateResource(String),
}

/// Mutable model of the application under synthesis.
///
/// Carries the resolved environment facts, the output directory, the context
/// store loaded at the start of the run, and everything the definition
/// declares. Resources and missing references are kept in `BTreeMap`s so the
/// finalized manifest is deterministic.
pub struct App {
  facts: EnvironmentFacts,
  out_dir: PathBuf,
  skip_build: bool,
  context: ContextStore,
  resources: BTreeMap<String, Resource>,
  missing: BTreeMap<String, MissingReference>,
  deferred: DeferredQueue,
}

impl App {
  /// Create an application model for one synthesis run.
  pub fn new(
    facts: EnvironmentFacts,
    out_dir: impl Into<PathBuf>,
    skip_build: bool,
    context: ContextStore,
  ) -> Self {
    Self {
      facts,
      out_dir: out_dir.into(),
      skip_build,
      context,
      resources: BTreeMap::new(),
      missing: BTreeMap::new(),
      deferred: DeferredQueue::new(),
    }
  }

  /// Resolved environment facts for this run.
  pub fn facts(&self) -> &EnvironmentFacts {
    &self.facts
  }

  /// Directory the assembly will be written to.
  pub fn out_dir(&self) -> &Path {
    &self.out_dir
  }

  /// Whether artifact builds are skipped this run.
  pub fn skip_build(&self) -> bool {
    self.skip_build
  }

  /// Context store for this run.
  pub fn context(&self) -> &ContextStore {
    &self.context
  }

  /// Declared resources, keyed by id.
  pub fn resources(&self) -> &BTreeMap<String, Resource> {
    &self.resources
  }

  /// Get a declared resource by id.
  pub fn resource(&self, id: &str) -> Option<&Resource> {
    self.resources.get(id)
  }

  /// Lookup misses recorded so far, keyed by cache key.
  pub fn missing_references(&self) -> &BTreeMap<String, MissingReference> {
    &self.missing
  }

  /// Declare a resource.
  ///
  /// Ids are unique within the application; redeclaring one is an error
  /// rather than a silent overwrite.
  pub fn add_resource(&mut self, resource: Resource) -> Result<(), AppError> {
    if self.resources.contains_key(&resource.id) {
      return Err(AppError::DuplicateResource(resource.id));
    }
    self.resources.insert(resource.id.clone(), resource);
    Ok(())
  }

  /// Read a cached context value.
  pub fn context_value(&self, key: &str) -> Option<&Value> {
    self.context.get(key)
  }

  /// Record a context value, to be persisted when the run finalizes.
  ///
  /// Last writer wins within a run.
  pub fn set_context(&mut self, key: impl Into<String>, value: Value) {
    self.context.set(key, value);
  }

  /// Look up a cached value, recording a missing reference on a miss.
  ///
  /// On a hit the cached value is returned. On a miss the lookup is recorded
  /// under its key (first registration wins) so the caller can resolve it
  /// out-of-band, and `None` is returned.
  pub fn lookup(
    &mut self,
    key: impl Into<String>,
    provider: impl Into<String>,
    props: Value,
  ) -> Option<Value> {
    let key = key.into();
    if let Some(value) = self.context.get(&key) {
      return Some(value.clone());
    }
    self.missing.entry(key.clone()).or_insert_with(|| MissingReference {
      key,
      provider: provider.into(),
      props,
    });
    None
  }

  /// Register a deferred task to run after the definition phase.
  ///
  /// Tasks run in registration order during [`App::run_deferred`]. Registering
  /// a task after the drain has begun fails the run.
  pub fn defer<F>(&mut self, label: impl Into<String>, task: F)
  where
    F: for<'a> FnOnce(&'a mut App) -> BoxFuture<'a, Result<(), DefinitionError>> + Send + 'static,
  {
    self.deferred.defer(label, Box::new(task));
  }

  /// Run all deferred tasks in registration order.
  ///
  /// Drains the queue exactly once; calling again is an error. Stops at the
  /// first task failure. A task registered during the drain fails the run
  /// once the task that registered it completes. Returns the number of tasks
  /// that ran.
  pub async fn run_deferred(&mut self) -> Result<usize, DeferredError> {
    self.deferred.begin_drain()?;
    debug!(tasks = self.deferred.len(), "draining deferred tasks");

    let mut completed = 0;
    while let Some(DeferredTask { label, run }) = self.deferred.next_task() {
      debug!(task = %label, "running deferred task");
      run(self)
        .await
        .map_err(|source| DeferredError::TaskFailed { label, source })?;
      completed += 1;
      if let Some(late) = self.deferred.late_label() {
        return Err(DeferredError::LateRegistration(late.to_string()));
      }
    }

    self.deferred.finish_drain();
    Ok(completed)
  }

  /// Decompose into the pieces persisted at finalization.
  pub(crate) fn into_parts(
    self,
  ) -> (
    PathBuf,
    BTreeMap<String, Resource>,
    BTreeMap<String, MissingReference>,
    ContextStore,
  ) {
    (self.out_dir, self.resources, self.missing, self.context)
  }
}
