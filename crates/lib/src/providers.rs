//! Provider interfaces for ambient deployment facts.
//!
//! Synthesis needs four facts about the world it runs in: who the caller is,
//! how the project is configured, which bootstrap resources exist, and where
//! per-project state lives. Each comes from a trait so integrations (real
//! cloud lookups, test doubles) can be injected explicitly instead of read
//! from process-global state.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;

use crate::consts::STATE_DIR_NAME;

/// Error type surfaced by provider implementations.
///
/// Providers wrap external systems with their own error types, so the
/// boundary carries a boxed error rather than forcing a shared enum.
pub type ProviderError = Box<dyn std::error::Error + Send + Sync>;

/// Identity of the account the run operates against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
  /// Cloud account identifier.
  pub account_id: String,
}

/// Project-level configuration, read-only to the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectConfig {
  /// Deployment stage (e.g., "dev", "production").
  pub stage: String,
  /// Project name.
  pub name: String,
  /// Target region.
  pub region: String,
}

/// Pre-provisioned support infrastructure required before deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapAssets {
  /// Artifact bucket name.
  pub bucket_name: String,
  /// Bootstrap stack version.
  pub version: String,
  /// Name of the bootstrap stack.
  pub stack_name: String,
}

/// Resolves the caller's identity.
#[async_trait]
pub trait CredentialsProvider: Send + Sync {
  async fn caller_identity(&self) -> Result<CallerIdentity, ProviderError>;
}

/// Loads project configuration.
#[async_trait]
pub trait ConfigProvider: Send + Sync {
  async fn project_config(&self) -> Result<ProjectConfig, ProviderError>;
}

/// Describes pre-provisioned bootstrap resources.
#[async_trait]
pub trait BootstrapProvider: Send + Sync {
  async fn bootstrap_assets(&self) -> Result<BootstrapAssets, ProviderError>;
}

/// Supplies the single directory under which build output and the context
/// cache live.
pub trait StateDirectory: Send + Sync {
  fn state_dir(&self) -> PathBuf;
}

/// The full set of providers a synthesis run draws from.
///
/// Passed explicitly into [`crate::synth::synthesize`] so runs stay pure and
/// independently testable.
#[derive(Clone)]
pub struct Providers {
  /// Caller identity resolution.
  pub credentials: Arc<dyn CredentialsProvider>,
  /// Project configuration.
  pub config: Arc<dyn ConfigProvider>,
  /// Bootstrap resource descriptors.
  pub bootstrap: Arc<dyn BootstrapProvider>,
  /// Per-project state directory.
  pub state: Arc<dyn StateDirectory>,
}

impl Providers {
  /// Bundle the four providers for a run.
  pub fn new(
    credentials: Arc<dyn CredentialsProvider>,
    config: Arc<dyn ConfigProvider>,
    bootstrap: Arc<dyn BootstrapProvider>,
    state: Arc<dyn StateDirectory>,
  ) -> Self {
    Self {
      credentials,
      config,
      bootstrap,
      state,
    }
  }
}

/// Standard project layout: state lives in `.sst` under the project root.
#[derive(Debug, Clone)]
pub struct ProjectLayout {
  root: PathBuf,
}

impl ProjectLayout {
  /// Create a layout rooted at the given project directory.
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self { root: root.into() }
  }

  /// The project root directory.
  pub fn root(&self) -> &PathBuf {
    &self.root
  }
}

impl StateDirectory for ProjectLayout {
  fn state_dir(&self) -> PathBuf {
    self.root.join(STATE_DIR_NAME)
  }
}
