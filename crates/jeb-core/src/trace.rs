//! Import traces: provenance rows linking a remote record to its local row.
//!
//! At most one trace exists per `(source, entity_type, remote_id)`; the store
//! deletes older duplicates before refreshing the surviving row. Traces are
//! diagnostic only and never drive sync decisions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{entity::EntityKind, mapping::Record};

/// The `source` value written by the JEB importer.
pub const TRACE_SOURCE: &str = "API JEB";

/// A persisted trace row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportTrace {
  pub id:          i64,
  pub source:      String,
  pub entity_type: EntityKind,
  pub remote_id:   String,
  pub local_id:    i64,
  pub synced_at:   DateTime<Utc>,
  /// The remote record exactly as synced, JSON-encoded.
  pub raw_payload: Option<String>,
}

/// Input to [`crate::store::SyncStore::record_trace`]. `synced_at` is always
/// set by the store.
#[derive(Debug, Clone)]
pub struct NewTrace {
  pub entity_type: EntityKind,
  pub remote_id:   String,
  pub local_id:    i64,
  pub raw_payload: Record,
}
