//! Test utilities for stratus-lib.
//!
//! Provider fixtures with fixed answers, failing counterparts for error-path
//! tests, and the environment facts the fixtures resolve to.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;

use crate::environment::EnvironmentFacts;
use crate::providers::{
  BootstrapAssets, BootstrapProvider, CallerIdentity, ConfigProvider, CredentialsProvider,
  ProjectConfig, ProjectLayout, ProviderError, Providers,
};

/// Credentials provider returning a fixed identity.
pub struct StaticCredentials;

#[async_trait]
impl CredentialsProvider for StaticCredentials {
  async fn caller_identity(&self) -> Result<CallerIdentity, ProviderError> {
    Ok(CallerIdentity {
      account_id: "123456789012".to_string(),
    })
  }
}

/// Config provider returning a fixed project configuration.
pub struct StaticConfig;

#[async_trait]
impl ConfigProvider for StaticConfig {
  async fn project_config(&self) -> Result<ProjectConfig, ProviderError> {
    Ok(ProjectConfig {
      stage: "test".to_string(),
      name: "demo".to_string(),
      region: "us-east-1".to_string(),
    })
  }
}

/// Bootstrap provider returning fixed bootstrap resources.
pub struct StaticBootstrap;

#[async_trait]
impl BootstrapProvider for StaticBootstrap {
  async fn bootstrap_assets(&self) -> Result<BootstrapAssets, ProviderError> {
    Ok(BootstrapAssets {
      bucket_name: "demo-bootstrap-assets".to_string(),
      version: "1".to_string(),
      stack_name: "demo-bootstrap".to_string(),
    })
  }
}

/// Credentials provider that always fails with the given message.
pub struct FailingCredentials {
  message: String,
}

impl FailingCredentials {
  pub fn new(message: impl Into<String>) -> Self {
    Self {
      message: message.into(),
    }
  }
}

#[async_trait]
impl CredentialsProvider for FailingCredentials {
  async fn caller_identity(&self) -> Result<CallerIdentity, ProviderError> {
    Err(self.message.clone().into())
  }
}

/// Config provider that always fails with the given message.
pub struct FailingConfig {
  message: String,
}

impl FailingConfig {
  pub fn new(message: impl Into<String>) -> Self {
    Self {
      message: message.into(),
    }
  }
}

#[async_trait]
impl ConfigProvider for FailingConfig {
  async fn project_config(&self) -> Result<ProjectConfig, ProviderError> {
    Err(self.message.clone().into())
  }
}

/// Bootstrap provider that always fails with the given message.
pub struct FailingBootstrap {
  message: String,
}

impl FailingBootstrap {
  pub fn new(message: impl Into<String>) -> Self {
    Self {
      message: message.into(),
    }
  }
}

#[async_trait]
impl BootstrapProvider for FailingBootstrap {
  async fn bootstrap_assets(&self) -> Result<BootstrapAssets, ProviderError> {
    Err(self.message.clone().into())
  }
}

/// Providers bundle backed by the static fixtures, rooted at the given
/// project directory.
pub fn static_providers(root: impl Into<PathBuf>) -> Providers {
  Providers::new(
    Arc::new(StaticCredentials),
    Arc::new(StaticConfig),
    Arc::new(StaticBootstrap),
    Arc::new(ProjectLayout::new(root)),
  )
}

/// Environment facts matching what [`static_providers`] resolves to.
pub fn test_facts() -> EnvironmentFacts {
  EnvironmentFacts {
    account_id: "123456789012".to_string(),
    stage: "test".to_string(),
    project_name: "demo".to_string(),
    region: "us-east-1".to_string(),
    bootstrap: BootstrapAssets {
      bucket_name: "demo-bootstrap-assets".to_string(),
      version: "1".to_string(),
      stack_name: "demo-bootstrap".to_string(),
    },
  }
}
