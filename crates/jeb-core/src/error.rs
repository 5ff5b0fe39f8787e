//! Error types for `jeb-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("record has neither `id` nor `pk`")]
  MissingRemoteId,

  #[error("remote id {0} is not an integer")]
  InvalidRemoteId(String),

  #[error("expected a JSON object, found {0}")]
  NotAnObject(&'static str),

  #[error("unknown entity kind: {0:?}")]
  UnknownEntityKind(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
