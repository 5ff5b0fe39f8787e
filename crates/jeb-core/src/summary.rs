//! Per-entity sync counters.

use serde::{Deserialize, Serialize};

/// What the upsert engine did with one row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpsertOutcome {
  Created,
  Updated,
}

/// Counters for one entity routine that reached its record loop.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncSummary {
  pub created:        usize,
  pub updated:        usize,
  /// Records that failed mapping or writing and were skipped.
  pub errors:         usize,
  /// Number of candidate records in the payload (startups only).
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub total:          Option<usize>,
  /// Local ids absent from the remote listing (startups only). Logged for
  /// manual follow-up; never acted on.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub missing_remote: Option<Vec<i64>>,
}

impl SyncSummary {
  pub fn new() -> Self { Self::default() }

  pub fn record(&mut self, outcome: UpsertOutcome) {
    match outcome {
      UpsertOutcome::Created => self.created += 1,
      UpsertOutcome::Updated => self.updated += 1,
    }
  }

  pub fn record_error(&mut self) { self.errors += 1; }

  /// Rows written, created or updated.
  pub fn written(&self) -> usize { self.created + self.updated }
}
