//! Wire form of routine results.
//!
//! A successful routine serialises as `{"ok": true, "created": …, …}`. A
//! failed one carries either an `error` string or the remote `status` and
//! `url`.

use jeb_core::{entity::EntityKind, summary::SyncSummary};
use serde::{Serialize, Serializer, ser::SerializeMap};
use uuid::Uuid;

use crate::SyncError;

/// Outcome of one entity routine.
#[derive(Debug)]
pub enum EntityReport {
  Synced(SyncSummary),
  Failed(SyncError),
}

impl EntityReport {
  pub fn ok(&self) -> bool { matches!(self, Self::Synced(_)) }

  pub fn summary(&self) -> Option<&SyncSummary> {
    match self {
      Self::Synced(summary) => Some(summary),
      Self::Failed(_) => None,
    }
  }
}

impl From<crate::Result<SyncSummary>> for EntityReport {
  fn from(result: crate::Result<SyncSummary>) -> Self {
    match result {
      Ok(summary) => Self::Synced(summary),
      Err(e) => Self::Failed(e),
    }
  }
}

#[derive(Serialize)]
struct Wire<'a> {
  ok:      bool,
  #[serde(flatten)]
  summary: Option<&'a SyncSummary>,
  #[serde(skip_serializing_if = "Option::is_none")]
  error:   Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  status:  Option<u16>,
  #[serde(skip_serializing_if = "Option::is_none")]
  url:     Option<&'a str>,
}

impl Serialize for EntityReport {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    let wire = match self {
      Self::Synced(summary) => Wire {
        ok:      true,
        summary: Some(summary),
        error:   None,
        status:  None,
        url:     None,
      },
      Self::Failed(SyncError::RemoteStatus { status, url }) => Wire {
        ok:      false,
        summary: None,
        error:   None,
        status:  Some(*status),
        url:     Some(url),
      },
      Self::Failed(e) => Wire {
        ok:      false,
        summary: None,
        error:   Some(e.to_string()),
        status:  None,
        url:     None,
      },
    };
    wire.serialize(serializer)
  }
}

/// Results of one orchestrated run, in run order.
#[derive(Debug)]
pub struct SyncReport {
  pub run_id:   Uuid,
  pub entities: Vec<(EntityKind, EntityReport)>,
}

impl SyncReport {
  /// Whether every entity reported `ok`.
  pub fn all_ok(&self) -> bool { self.entities.iter().all(|(_, r)| r.ok()) }

  pub fn get(&self, kind: EntityKind) -> Option<&EntityReport> {
    self
      .entities
      .iter()
      .find(|(k, _)| *k == kind)
      .map(|(_, r)| r)
  }

  /// Entities whose routine failed.
  pub fn failed(&self) -> impl Iterator<Item = EntityKind> + '_ {
    self
      .entities
      .iter()
      .filter(|(_, r)| !r.ok())
      .map(|(k, _)| *k)
  }
}

/// Serialises as an object keyed by resource name (`startups`, `users`, …).
impl Serialize for SyncReport {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(self.entities.len()))?;
    for (kind, report) in &self.entities {
      map.serialize_entry(kind.resource(), report)?;
    }
    map.end()
  }
}
