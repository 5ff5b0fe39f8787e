//! Connection settings for the remote JEB API.

use std::{path::PathBuf, time::Duration};

use serde::{Deserialize, Serialize};

/// Placeholder replaced by the resource name in [`SyncConfig::candidate_paths`].
pub const RESOURCE_PLACEHOLDER: &str = "{resource}";

/// Placeholder replaced by the remote id in [`SyncConfig::detail_paths`].
pub const ID_PLACEHOLDER: &str = "{id}";

/// Everything the sync side needs to reach the remote API.
///
/// Built once by the caller and handed to [`crate::Syncer::new`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
  /// Scheme, host and optional path prefix, without a trailing slash.
  pub api_base:            String,
  /// Sent verbatim in the `X-Group-Authorization` header.
  pub api_token:           String,
  /// Extra PEM root certificate(s) to trust.
  #[serde(default)]
  pub ca_bundle:           Option<PathBuf>,
  #[serde(default = "default_list_timeout_secs")]
  pub list_timeout_secs:   u64,
  #[serde(default = "default_detail_timeout_secs")]
  pub detail_timeout_secs: u64,
  /// Listing paths, tried in order.
  #[serde(default = "default_candidate_paths")]
  pub candidate_paths:     Vec<String>,
  /// Startup detail paths, tried in order.
  #[serde(default = "default_detail_paths")]
  pub detail_paths:        Vec<String>,
}

fn default_list_timeout_secs() -> u64 { 30 }

fn default_detail_timeout_secs() -> u64 { 20 }

fn default_candidate_paths() -> Vec<String> {
  [
    "/{resource}/",
    "/{resource}",
    "/api/{resource}/",
    "/api/{resource}",
    "/api/v1/{resource}/",
    "/api/v1/{resource}",
    "/v1/{resource}/",
    "/v1/{resource}",
  ]
  .map(String::from)
  .to_vec()
}

fn default_detail_paths() -> Vec<String> {
  [
    "/startups/{id}",
    "/startups/{id}/",
    "/api/startups/{id}",
    "/api/v1/startups/{id}",
  ]
  .map(String::from)
  .to_vec()
}

impl SyncConfig {
  /// Settings with every optional field at its default.
  pub fn new(api_base: impl Into<String>, api_token: impl Into<String>) -> Self {
    Self {
      api_base:            api_base.into(),
      api_token:           api_token.into(),
      ca_bundle:           None,
      list_timeout_secs:   default_list_timeout_secs(),
      detail_timeout_secs: default_detail_timeout_secs(),
      candidate_paths:     default_candidate_paths(),
      detail_paths:        default_detail_paths(),
    }
  }

  pub fn list_timeout(&self) -> Duration { Duration::from_secs(self.list_timeout_secs) }

  pub fn detail_timeout(&self) -> Duration { Duration::from_secs(self.detail_timeout_secs) }

  /// Absolute listing URLs for `resource`, in probe order.
  pub fn candidate_urls(&self, resource: &str) -> Vec<String> {
    self
      .candidate_paths
      .iter()
      .map(|t| self.url(&t.replace(RESOURCE_PLACEHOLDER, resource)))
      .collect()
  }

  /// Absolute detail URLs for one startup, in probe order.
  pub fn detail_urls(&self, id: &str) -> Vec<String> {
    self
      .detail_paths
      .iter()
      .map(|t| self.url(&t.replace(ID_PLACEHOLDER, id)))
      .collect()
  }

  fn url(&self, path: &str) -> String {
    format!("{}{}", self.api_base.trim_end_matches('/'), path)
  }
}
