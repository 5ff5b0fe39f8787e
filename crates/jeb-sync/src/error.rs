//! Error types for `jeb-sync`.

use std::path::PathBuf;

use thiserror::Error;

/// Why one entity routine could not reach its record loop, or could not
/// finish at all.
#[derive(Debug, Error)]
pub enum SyncError {
  /// Every candidate URL answered 404 or failed at the network level.
  #[error("all_404")]
  AllNotFound,

  /// The first non-404 answer was an error status.
  #[error("remote answered {status} on {url}")]
  RemoteStatus { status: u16, url: String },

  /// The chosen response body is not JSON.
  #[error("invalid_json")]
  InvalidJson,

  #[error("http client error: {0}")]
  Client(#[from] reqwest::Error),

  #[error("cannot read CA bundle {path}: {source}")]
  CaBundle {
    path:   PathBuf,
    source: std::io::Error,
  },

  /// The routine task panicked or was cancelled.
  #[error("sync task failed: {0}")]
  Join(String),
}

/// A failure confined to a single remote record. Counted and skipped.
#[derive(Debug, Error)]
pub enum RecordError {
  #[error(transparent)]
  Mapping(#[from] jeb_core::Error),

  #[error("store error: {0}")]
  Store(Box<dyn std::error::Error + Send + Sync>),
}

impl RecordError {
  pub(crate) fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(e))
  }
}

pub type Result<T, E = SyncError> = std::result::Result<T, E>;
