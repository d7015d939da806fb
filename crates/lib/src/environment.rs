//! Environment resolution for a synthesis run.
//!
//! A run depends on three independent facts: the caller's identity, the
//! project configuration, and the bootstrap resource descriptors. They are
//! fetched concurrently and joined all-or-fail; a partial set of facts is
//! never produced. Retry policy, if any, belongs to the providers
//! themselves.

use thiserror::Error;
use tracing::debug;

use crate::providers::{BootstrapAssets, ProviderError, Providers};

/// The resolved deployment environment, immutable for the rest of the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentFacts {
  /// Cloud account the run operates against.
  pub account_id: String,
  /// Deployment stage.
  pub stage: String,
  /// Project name.
  pub project_name: String,
  /// Target region.
  pub region: String,
  /// Pre-provisioned bootstrap resources.
  pub bootstrap: BootstrapAssets,
}

/// Errors that can occur while resolving the environment.
#[derive(Debug, Error)]
pub enum EnvironmentError {
  /// Caller identity could not be resolved.
  #[error("failed to resolve caller identity: {0}")]
  Identity(#[source] ProviderError),

  /// Project configuration could not be loaded.
  #[error("failed to load project configuration: {0}")]
  Config(#[source] ProviderError),

  /// Bootstrap resources could not be resolved.
  #[error("failed to resolve bootstrap resources: {0}")]
  Bootstrap(#[source] ProviderError),
}

/// Resolve the full set of environment facts.
///
/// The three provider calls run concurrently; the first failure aborts the
/// join and in-flight siblings are discarded. Nothing is retried here.
pub async fn resolve_environment(providers: &Providers) -> Result<EnvironmentFacts, EnvironmentError> {
  let (identity, config, bootstrap) = tokio::try_join!(
    async {
      providers
        .credentials
        .caller_identity()
        .await
        .map_err(EnvironmentError::Identity)
    },
    async {
      providers
        .config
        .project_config()
        .await
        .map_err(EnvironmentError::Config)
    },
    async {
      providers
        .bootstrap
        .bootstrap_assets()
        .await
        .map_err(EnvironmentError::Bootstrap)
    },
  )?;

  let facts = EnvironmentFacts {
    account_id: identity.account_id,
    stage: config.stage,
    project_name: config.name,
    region: config.region,
    bootstrap,
  };

  debug!(
    account_id = %facts.account_id,
    stage = %facts.stage,
    region = %facts.region,
    "environment resolved"
  );

  Ok(facts)
}
