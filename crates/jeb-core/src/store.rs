//! The `SyncStore` trait: everything the sync routines need from the local
//! relational store.
//!
//! Implemented by storage backends (e.g. `jeb-store-sqlite`). The sync and API
//! layers depend on this abstraction, not on any concrete backend.

use std::future::Future;

use crate::{
  entity::{EntityKind, EntityRow},
  summary::UpsertOutcome,
  trace::{ImportTrace, NewTrace},
};

/// Abstraction over the local store written by the importer.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait SyncStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Entities ──────────────────────────────────────────────────────────

  /// Create the row with primary key `row.id()` if absent, otherwise
  /// overwrite the supplied columns. Last write wins.
  fn upsert(
    &self,
    row: EntityRow,
  ) -> impl Future<Output = Result<UpsertOutcome, Self::Error>> + Send + '_;

  /// Mirror the raw founder list into the startup's `founders_json` column.
  fn set_founders_json(
    &self,
    startup_id: i64,
    founders: serde_json::Value,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Delete every founder of `startup_id` and insert `names` in order.
  /// Returns the number of founders inserted.
  fn replace_founders(
    &self,
    startup_id: i64,
    names: Vec<String>,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  /// Whether a local user with this id exists. Used to resolve author and
  /// organiser references.
  fn user_exists(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// All local primary keys of one entity kind, ascending.
  fn local_ids(
    &self,
    kind: EntityKind,
  ) -> impl Future<Output = Result<Vec<i64>, Self::Error>> + Send + '_;

  // ── Import traces ─────────────────────────────────────────────────────

  /// Collapse duplicate traces for the key, then create or refresh the
  /// surviving row. `synced_at` is set by the store.
  fn record_trace(
    &self,
    trace: NewTrace,
  ) -> impl Future<Output = Result<ImportTrace, Self::Error>> + Send + '_;

  /// Traces of this importer's source, newest first, optionally restricted to
  /// one entity kind.
  fn list_traces(
    &self,
    kind: Option<EntityKind>,
  ) -> impl Future<Output = Result<Vec<ImportTrace>, Self::Error>> + Send + '_;

  /// The most recent trace for one remote record.
  fn get_trace(
    &self,
    kind: EntityKind,
    remote_id: String,
  ) -> impl Future<Output = Result<Option<ImportTrace>, Self::Error>> + Send + '_;
}
