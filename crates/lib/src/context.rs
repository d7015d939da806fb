//! Context cache persistence.
//!
//! The context store carries cached synthesis decisions (resolved lookups)
//! across runs so incremental builds avoid redundant external calls. It is
//! persisted as a single versioned JSON document (`context.json`) in the
//! project state directory, read once at the start of a run and written once
//! at the end.
//!
//! # Context File Format
//!
//! ```json
//! {
//!   "version": 1,
//!   "values": {
//!     "vpc:account=123456789012:region=us-east-1": {
//!       "vpcId": "vpc-0a1b2c3d"
//!     }
//!   }
//! }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Current context file format version.
pub const CONTEXT_VERSION: u32 = 1;

/// Context file name within the state directory.
pub const CONTEXT_FILENAME: &str = "context.json";

/// A key/value store of cached synthesis decisions.
///
/// Keys are stable identifiers independent of run order. Writes within a run
/// are last-writer-wins; `BTreeMap` keeps the persisted document
/// deterministically ordered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextStore {
  /// Context file format version.
  pub version: u32,
  /// Cached values, keyed by stable identifier.
  pub values: BTreeMap<String, Value>,
}

/// Errors that can occur when working with the context cache.
#[derive(Debug, Error)]
pub enum ContextError {
  /// Failed to read the context file.
  #[error("failed to read context file: {0}")]
  Read(#[source] io::Error),

  /// Failed to write the context file.
  #[error("failed to write context file: {0}")]
  Write(#[source] io::Error),

  /// Failed to create the state directory.
  #[error("failed to create state directory: {0}")]
  CreateDir(#[source] io::Error),

  /// Failed to parse the context file JSON.
  #[error("failed to parse context file: {0}")]
  Parse(#[source] serde_json::Error),

  /// Failed to serialize the context store.
  #[error("failed to serialize context store: {0}")]
  Serialize(#[source] serde_json::Error),

  /// Context file version is not supported.
  #[error("unsupported context file version {0}, expected {CONTEXT_VERSION}")]
  UnsupportedVersion(u32),
}

impl Default for ContextStore {
  fn default() -> Self {
    Self::new()
  }
}

impl ContextStore {
  /// Create a new empty store.
  pub fn new() -> Self {
    Self {
      version: CONTEXT_VERSION,
      values: BTreeMap::new(),
    }
  }

  /// Get a cached value by key.
  pub fn get(&self, key: &str) -> Option<&Value> {
    self.values.get(key)
  }

  /// Insert or overwrite a cached value.
  pub fn set(&mut self, key: impl Into<String>, value: Value) {
    self.values.insert(key.into(), value);
  }

  /// Remove a cached value, returning it if present.
  pub fn remove(&mut self, key: &str) -> Option<Value> {
    self.values.remove(key)
  }

  /// Iterate entries in key order.
  pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
    self.values.iter()
  }

  /// Number of cached entries.
  pub fn len(&self) -> usize {
    self.values.len()
  }

  /// Whether the store has no entries.
  pub fn is_empty(&self) -> bool {
    self.values.is_empty()
  }
}

/// Handle to the on-disk context cache of one project.
///
/// Reads and writes `context.json` under the state directory. Saves are
/// atomic (write to temp, then rename) so a concurrent crash can never leave
/// a partially-written document behind. Single writer per run; concurrent
/// runs against one project are unsupported.
#[derive(Debug, Clone)]
pub struct ContextCache {
  /// State directory holding the context file.
  state_dir: PathBuf,
}

impl ContextCache {
  /// Create a cache handle for the given state directory.
  pub fn new(state_dir: impl Into<PathBuf>) -> Self {
    Self {
      state_dir: state_dir.into(),
    }
  }

  /// Path of the context file.
  pub fn path(&self) -> PathBuf {
    self.state_dir.join(CONTEXT_FILENAME)
  }

  /// Ensure the state directory exists.
  fn ensure_dir(&self) -> Result<(), ContextError> {
    fs::create_dir_all(&self.state_dir).map_err(ContextError::CreateDir)
  }

  /// Load the persisted store.
  ///
  /// Returns an empty store if the file doesn't exist. A file that exists
  /// but can't be read, parsed, or whose version is unsupported is an error;
  /// cached decisions are never silently discarded.
  pub fn load(&self) -> Result<ContextStore, ContextError> {
    let path = self.path();

    let content = match fs::read_to_string(&path) {
      Ok(content) => content,
      Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(ContextStore::new()),
      Err(e) => return Err(ContextError::Read(e)),
    };

    let store: ContextStore = serde_json::from_str(&content).map_err(ContextError::Parse)?;

    if store.version != CONTEXT_VERSION {
      return Err(ContextError::UnsupportedVersion(store.version));
    }

    Ok(store)
  }

  /// Persist the store.
  ///
  /// Uses atomic write (write to temp, then rename) so a subsequent `load`
  /// can never observe a partial document.
  pub fn save(&self, store: &ContextStore) -> Result<(), ContextError> {
    self.ensure_dir()?;

    let path = self.path();
    let temp_path = self.state_dir.join(format!("{}.tmp", CONTEXT_FILENAME));

    let content = serde_json::to_string_pretty(store).map_err(ContextError::Serialize)?;
    fs::write(&temp_path, &content).map_err(ContextError::Write)?;
    fs::rename(&temp_path, &path).map_err(ContextError::Write)?;

    Ok(())
  }
}
