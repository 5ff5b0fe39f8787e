//! Layered settings: optional TOML file, then `JEB_*` environment variables.

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use jeb_api::AuthConfig;
use jeb_sync::SyncConfig;
use serde::Deserialize;

/// Every key the `jeb` binary reads.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
  #[serde(default = "default_store_path")]
  pub store_path:          PathBuf,
  pub api_base:            Option<String>,
  pub api_token:           Option<String>,
  pub ca_bundle:           Option<PathBuf>,
  pub list_timeout_secs:   Option<u64>,
  pub detail_timeout_secs: Option<u64>,
  pub candidate_paths:     Option<Vec<String>>,
  pub detail_paths:        Option<Vec<String>>,
  #[serde(default = "default_host")]
  pub host:                String,
  #[serde(default = "default_port")]
  pub port:                u16,
  pub auth_username:       Option<String>,
  pub auth_password_hash:  Option<String>,
}

fn default_store_path() -> PathBuf { PathBuf::from("jeb.sqlite3") }

fn default_host() -> String { "127.0.0.1".to_owned() }

fn default_port() -> u16 { 8080 }

impl Settings {
  /// Read `path` if it exists, then overlay `JEB_*` environment variables.
  pub fn load(path: &Path) -> Result<Self> {
    let builder = config::Config::builder()
      .add_source(config::File::from(path.to_path_buf()).required(false))
      .add_source(config::Environment::with_prefix("JEB"));
    Self::from_builder(builder)
  }

  fn from_builder(
    builder: config::ConfigBuilder<config::builder::DefaultState>,
  ) -> Result<Self> {
    builder
      .build()
      .context("failed to read configuration")?
      .try_deserialize()
      .context("failed to deserialise settings")
  }

  /// The store path with a leading `~` expanded.
  pub fn store_path(&self) -> PathBuf { expand_tilde(&self.store_path) }

  pub fn sync_config(&self) -> Result<SyncConfig> {
    let api_base = self
      .api_base
      .clone()
      .context("api_base is not configured (set JEB_API_BASE)")?;
    let api_token = self
      .api_token
      .clone()
      .context("api_token is not configured (set JEB_API_TOKEN)")?;

    let mut cfg = SyncConfig::new(api_base, api_token);
    cfg.ca_bundle = self.ca_bundle.as_deref().map(expand_tilde);
    if let Some(secs) = self.list_timeout_secs {
      cfg.list_timeout_secs = secs;
    }
    if let Some(secs) = self.detail_timeout_secs {
      cfg.detail_timeout_secs = secs;
    }
    if let Some(paths) = &self.candidate_paths {
      cfg.candidate_paths = paths.clone();
    }
    if let Some(paths) = &self.detail_paths {
      cfg.detail_paths = paths.clone();
    }
    Ok(cfg)
  }

  pub fn auth_config(&self) -> Result<AuthConfig> {
    Ok(AuthConfig {
      username:      self
        .auth_username
        .clone()
        .context("auth_username is not configured")?,
      password_hash: self
        .auth_password_hash
        .clone()
        .context("auth_password_hash is not configured (see `jeb hash-password`)")?,
    })
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
