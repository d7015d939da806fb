//! Assembly finalization.
//!
//! Once the definition phase and the deferred drain complete, the application
//! model is sealed into an [`Assembly`]: a versioned manifest written to the
//! output directory, plus the persisted context cache. Finalization is
//! deterministic; synthesizing the same definition against the same facts and
//! context produces a byte-identical manifest.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::app::{App, MissingReference, Resource};
use crate::context::{ContextCache, ContextError};

/// Current assembly manifest format version.
pub const MANIFEST_VERSION: u32 = 1;

/// Manifest file name within the output directory.
pub const MANIFEST_FILENAME: &str = "manifest.json";

/// The persisted description of one synthesized application.
///
/// Resources are keyed by id and missing references listed in key order, so
/// serialization is deterministic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssemblyManifest {
  /// Manifest format version.
  pub version: u32,
  /// Declared resources, keyed by id.
  pub resources: BTreeMap<String, Resource>,
  /// Context lookups that found no cached value.
  pub missing: Vec<MissingReference>,
}

impl AssemblyManifest {
  /// Serialize to the canonical pretty-printed JSON form.
  pub fn to_json(&self) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(self)
  }
}

/// The immutable result of one synthesis run.
#[derive(Debug, Clone)]
pub struct Assembly {
  /// The finalized manifest.
  pub manifest: AssemblyManifest,
  /// Directory the manifest was written to.
  pub out_dir: PathBuf,
}

impl Assembly {
  /// Path of the manifest file.
  pub fn manifest_path(&self) -> PathBuf {
    self.out_dir.join(MANIFEST_FILENAME)
  }
}

/// Errors that can occur while finalizing an assembly.
#[derive(Debug, Error)]
pub enum AssemblyError {
  /// Failed to serialize the manifest.
  #[error("failed to serialize assembly manifest: {0}")]
  Serialize(#[source] serde_json::Error),

  /// Failed to create the output directory.
  #[error("failed to create output directory: {0}")]
  CreateDir(#[source] io::Error),

  /// Failed to write the manifest file.
  #[error("failed to write assembly manifest: {0}")]
  Write(#[source] io::Error),

  /// Failed to persist the context cache.
  #[error("failed to persist context cache: {0}")]
  Context(#[from] ContextError),
}

/// Seal the application model into an assembly.
///
/// Serializes the manifest before touching the filesystem, so a
/// serialization failure can never leave a partial assembly or corrupt the
/// context cache. The manifest is then written to the output directory
/// (write to temp, then rename) and the context store persisted.
pub fn finalize(app: App, cache: &ContextCache) -> Result<Assembly, AssemblyError> {
  let (out_dir, resources, missing, context) = app.into_parts();

  let manifest = AssemblyManifest {
    version: MANIFEST_VERSION,
    resources,
    missing: missing.into_values().collect(),
  };
  let content = manifest.to_json().map_err(AssemblyError::Serialize)?;

  fs::create_dir_all(&out_dir).map_err(AssemblyError::CreateDir)?;
  let path = out_dir.join(MANIFEST_FILENAME);
  let temp_path = out_dir.join(format!("{}.tmp", MANIFEST_FILENAME));
  fs::write(&temp_path, &content).map_err(AssemblyError::Write)?;
  fs::rename(&temp_path, &path).map_err(AssemblyError::Write)?;

  cache.save(&context)?;

  info!(
    resources = manifest.resources.len(),
    missing = manifest.missing.len(),
    "synthesis complete"
  );

  Ok(Assembly { manifest, out_dir })
}

#[cfg(test)]
mod tests {
  use serde_json::json;
  use tempfile::TempDir;

  use super::*;
  use crate::context::ContextStore;
  use crate::util::testutil::test_facts;

  struct Fixture {
    _temp: TempDir,
    out_dir: PathBuf,
    cache: ContextCache,
  }

  fn fixture() -> Fixture {
    let temp = TempDir::new().unwrap();
    let out_dir = temp.path().join(".sst").join("out");
    let cache = ContextCache::new(temp.path().join(".sst"));
    Fixture {
      _temp: temp,
      out_dir,
      cache,
    }
  }

  fn demo_app(out_dir: &PathBuf) -> App {
    let mut app = App::new(test_facts(), out_dir.clone(), false, ContextStore::new());
    app
      .add_resource(Resource::new("web", "aws:s3:Bucket", json!({"versioned": true})))
      .unwrap();
    app
      .add_resource(Resource::new("api", "aws:lambda:Function", json!({"memory": 512})))
      .unwrap();
    app.lookup("vpc:default", "aws:vpc", json!({"default": true}));
    app
  }

  #[test]
  fn finalize_writes_manifest_to_out_dir() {
    let fx = fixture();
    let app = demo_app(&fx.out_dir);

    let assembly = finalize(app, &fx.cache).unwrap();

    assert_eq!(assembly.out_dir, fx.out_dir);
    let written = fs::read_to_string(assembly.manifest_path()).unwrap();
    let parsed: AssemblyManifest = serde_json::from_str(&written).unwrap();
    assert_eq!(parsed, assembly.manifest);
    assert_eq!(parsed.version, MANIFEST_VERSION);
    assert_eq!(parsed.resources.len(), 2);
  }

  #[test]
  fn finalize_records_missing_references() {
    let fx = fixture();
    let app = demo_app(&fx.out_dir);

    let assembly = finalize(app, &fx.cache).unwrap();

    assert_eq!(assembly.manifest.missing.len(), 1);
    let missing = &assembly.manifest.missing[0];
    assert_eq!(missing.key, "vpc:default");
    assert_eq!(missing.provider, "aws:vpc");
    assert_eq!(missing.props, json!({"default": true}));
  }

  #[test]
  fn finalize_persists_context() {
    let fx = fixture();
    let mut app = App::new(test_facts(), fx.out_dir.clone(), false, ContextStore::new());
    app.set_context("ami:arm64", json!("ami-456"));

    finalize(app, &fx.cache).unwrap();

    let store = fx.cache.load().unwrap();
    assert_eq!(store.get("ami:arm64"), Some(&json!("ami-456")));
  }

  #[test]
  fn finalize_leaves_no_temp_file() {
    let fx = fixture();
    let app = demo_app(&fx.out_dir);

    let assembly = finalize(app, &fx.cache).unwrap();

    let temp_path = assembly.manifest_path().with_extension("json.tmp");
    assert!(!temp_path.exists());
  }

  #[test]
  fn repeated_finalization_is_byte_identical() {
    let fx = fixture();

    let first = finalize(demo_app(&fx.out_dir), &fx.cache).unwrap();
    let first_bytes = fs::read(first.manifest_path()).unwrap();

    let second = finalize(demo_app(&fx.out_dir), &fx.cache).unwrap();
    let second_bytes = fs::read(second.manifest_path()).unwrap();

    assert_eq!(first_bytes, second_bytes);
  }

  #[test]
  fn manifest_orders_entries_by_key() {
    let fx = fixture();
    let mut app = App::new(test_facts(), fx.out_dir.clone(), false, ContextStore::new());
    for id in ["c", "a", "b"] {
      app.add_resource(Resource::new(id, "aws:s3:Bucket", json!({}))).unwrap();
    }
    app.lookup("z:lookup", "aws:vpc", json!({}));
    app.lookup("m:lookup", "aws:vpc", json!({}));

    let assembly = finalize(app, &fx.cache).unwrap();

    let ids: Vec<&String> = assembly.manifest.resources.keys().collect();
    assert_eq!(ids, ["a", "b", "c"]);
    let keys: Vec<&str> = assembly.manifest.missing.iter().map(|m| m.key.as_str()).collect();
    assert_eq!(keys, ["m:lookup", "z:lookup"]);
  }

  #[test]
  fn manifest_json_shape_is_stable() {
    let fx = fixture();
    let assembly = finalize(demo_app(&fx.out_dir), &fx.cache).unwrap();

    let json = assembly.manifest.to_json().unwrap();

    assert!(json.contains(r#""version": 1"#));
    assert!(json.contains(r#""resources""#));
    assert!(json.contains(r#""missing""#));
    assert!(json.contains(r#""kind": "aws:s3:Bucket""#));
  }
}
