//! The per-entity sync routines.
//!
//! Each routine fetches one listing, then walks its records. A record that
//! fails to map or write is logged, counted in `errors`, and skipped; the
//! loop always runs to the end.

use std::{collections::BTreeSet, sync::Arc};

use chrono::Utc;
use jeb_core::{
  entity::{EntityKind, EntityRow},
  mapping::{
    self, EVENT_ORGANIZER_KEYS, MappedStartup, NEWS_AUTHOR_KEYS, Record, RemoteId,
  },
  store::SyncStore,
  summary::{SyncSummary, UpsertOutcome},
  trace::NewTrace,
};
use serde_json::Value;
use tracing::Instrument as _;

use crate::{ApiClient, RecordError, Result, SyncConfig};

// ─── Kinds ───────────────────────────────────────────────────────────────────

/// Kinds synced through the plain record loop: no detail fetch, no founders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PlainKind {
  User,
  Investor,
  Partner,
  News,
  Event,
}

impl PlainKind {
  /// `None` for startups, which have their own routine.
  pub(crate) fn of(kind: EntityKind) -> Option<Self> {
    match kind {
      EntityKind::Startup => None,
      EntityKind::User => Some(Self::User),
      EntityKind::Investor => Some(Self::Investor),
      EntityKind::Partner => Some(Self::Partner),
      EntityKind::News => Some(Self::News),
      EntityKind::Event => Some(Self::Event),
    }
  }

  pub(crate) fn kind(self) -> EntityKind {
    match self {
      Self::User => EntityKind::User,
      Self::Investor => EntityKind::Investor,
      Self::Partner => EntityKind::Partner,
      Self::News => EntityKind::News,
      Self::Event => EntityKind::Event,
    }
  }
}

// ─── Syncer ──────────────────────────────────────────────────────────────────

/// Runs sync routines against one remote API and one local store.
pub struct Syncer<S> {
  pub(crate) store:  Arc<S>,
  pub(crate) client: ApiClient,
}

impl<S> Clone for Syncer<S> {
  fn clone(&self) -> Self {
    Self {
      store:  Arc::clone(&self.store),
      client: self.client.clone(),
    }
  }
}

impl<S> Syncer<S>
where
  S: SyncStore + 'static,
{
  pub fn new(store: Arc<S>, config: SyncConfig) -> Result<Self> {
    Ok(Self { store, client: ApiClient::new(config)? })
  }

  pub fn store(&self) -> &Arc<S> { &self.store }

  pub fn client(&self) -> &ApiClient { &self.client }

  /// Run the routine for one entity kind.
  pub async fn sync(&self, kind: EntityKind) -> Result<SyncSummary> {
    let span = tracing::info_span!("sync", entity = kind.label());
    self.run(kind).instrument(span).await
  }

  pub async fn sync_startups(&self) -> Result<SyncSummary> { self.sync(EntityKind::Startup).await }

  pub async fn sync_users(&self) -> Result<SyncSummary> { self.sync(EntityKind::User).await }

  pub async fn sync_investors(&self) -> Result<SyncSummary> { self.sync(EntityKind::Investor).await }

  pub async fn sync_partners(&self) -> Result<SyncSummary> { self.sync(EntityKind::Partner).await }

  pub async fn sync_news(&self) -> Result<SyncSummary> { self.sync(EntityKind::News).await }

  pub async fn sync_events(&self) -> Result<SyncSummary> { self.sync(EntityKind::Event).await }

  async fn run(&self, kind: EntityKind) -> Result<SyncSummary> {
    let summary = match PlainKind::of(kind) {
      None => self.sync_startups_inner().await?,
      Some(plain) => self.sync_entity(plain).await?,
    };
    tracing::info!(
      written = summary.written(),
      created = summary.created,
      updated = summary.updated,
      errors = summary.errors,
      "{} sync finished",
      kind.resource(),
    );
    Ok(summary)
  }

  // ── Startups ──────────────────────────────────────────────────────────────

  async fn sync_startups_inner(&self) -> Result<SyncSummary> {
    let kind = EntityKind::Startup;
    let items = self.client.fetch_list(kind.resource()).await?;

    let mut summary = SyncSummary { total: Some(items.len()), ..SyncSummary::new() };
    let mut seen = BTreeSet::new();

    for item in items {
      let (id, record) = match candidate(kind, item) {
        Ok(Some(found)) => found,
        Ok(None) => continue,
        Err(e) => {
          record_failure(&mut summary, kind, None, &e);
          continue;
        }
      };
      seen.insert(id.key);

      match self.write_startup(&id, record).await {
        Ok(outcome) => summary.record(outcome),
        Err(e) => record_failure(&mut summary, kind, Some(&id), &e),
      }
    }

    summary.missing_remote = Some(self.missing_remote(&seen).await);
    Ok(summary)
  }

  async fn write_startup(
    &self,
    id: &RemoteId,
    mut record: Record,
  ) -> Result<UpsertOutcome, RecordError> {
    if mapping::lacks_detail(&record)
      && let Some(detail) = self.client.fetch_detail(&id.text).await
    {
      record = detail;
    }

    let mapped = mapping::map_startup(id, &record, Utc::now());
    let names = mapped.founder_names();
    let MappedStartup { row, founders } = mapped;

    let outcome = self
      .store
      .upsert(EntityRow::Startup(row))
      .await
      .map_err(RecordError::store)?;

    if let Some(founders) = founders {
      if let Err(e) = self.store.set_founders_json(id.key, Value::Array(founders)).await {
        tracing::error!(remote_id = %id, "cannot save founders_json: {e}");
      }
      self
        .store
        .replace_founders(id.key, names)
        .await
        .map_err(RecordError::store)?;
    }

    self.trace(EntityKind::Startup, id, record).await;
    Ok(outcome)
  }

  /// Local startup ids absent from this run's listing. Logged for manual
  /// follow-up only.
  async fn missing_remote(&self, seen: &BTreeSet<i64>) -> Vec<i64> {
    let local = match self.store.local_ids(EntityKind::Startup).await {
      Ok(ids) => ids,
      Err(e) => {
        tracing::error!("cannot compute startup reconciliation: {e}");
        return Vec::new();
      }
    };
    let missing: Vec<i64> = local.into_iter().filter(|id| !seen.contains(id)).collect();
    if !missing.is_empty() {
      tracing::warn!(?missing, "local startups absent from the remote listing");
    }
    missing
  }

  // ── Other entities ────────────────────────────────────────────────────────

  async fn sync_entity(&self, plain: PlainKind) -> Result<SyncSummary> {
    let kind = plain.kind();
    let items = self.client.fetch_list(kind.resource()).await?;
    let mut summary = SyncSummary::new();

    for item in items {
      let (id, record) = match candidate(kind, item) {
        Ok(Some(found)) => found,
        Ok(None) => continue,
        Err(e) => {
          record_failure(&mut summary, kind, None, &e);
          continue;
        }
      };

      match self.write_record(plain, &id, record).await {
        Ok(outcome) => summary.record(outcome),
        Err(e) => record_failure(&mut summary, kind, Some(&id), &e),
      }
    }

    Ok(summary)
  }

  async fn write_record(
    &self,
    plain: PlainKind,
    id: &RemoteId,
    record: Record,
  ) -> Result<UpsertOutcome, RecordError> {
    let row = match plain {
      PlainKind::User => EntityRow::User(mapping::map_user(id, &record)),
      PlainKind::Investor => EntityRow::Investor(mapping::map_investor(id, &record)),
      PlainKind::Partner => EntityRow::Partner(mapping::map_partner(id, &record)),
      PlainKind::News => {
        let mut row = mapping::map_news(id, &record);
        row.auteur_id = self.resolve_user(mapping::reference(&record, &NEWS_AUTHOR_KEYS)).await;
        EntityRow::News(row)
      }
      PlainKind::Event => {
        let mut row = mapping::map_event(id, &record);
        row.organisateur_id =
          self.resolve_user(mapping::reference(&record, &EVENT_ORGANIZER_KEYS)).await;
        EntityRow::Event(row)
      }
    };

    let outcome = self.store.upsert(row).await.map_err(RecordError::store)?;
    self.trace(plain.kind(), id, record).await;
    Ok(outcome)
  }

  // ── Helpers ───────────────────────────────────────────────────────────────

  /// Keep a user reference only when that user exists locally. Lookup
  /// failures read as no reference.
  async fn resolve_user(&self, reference: Option<i64>) -> Option<i64> {
    let id = reference?;
    match self.store.user_exists(id).await {
      Ok(true) => Some(id),
      Ok(false) => {
        tracing::debug!("referenced user {id} is not known locally");
        None
      }
      Err(e) => {
        tracing::warn!("cannot look up user {id}: {e}");
        None
      }
    }
  }

  /// Record the import trace for one written row. Failures are logged only.
  async fn trace(&self, kind: EntityKind, id: &RemoteId, record: Record) {
    let trace = NewTrace {
      entity_type: kind,
      remote_id:   id.text.clone(),
      local_id:    id.key,
      raw_payload: record,
    };
    if let Err(e) = self.store.record_trace(trace).await {
      tracing::error!(remote_id = %id, "cannot record import trace: {e}");
    }
  }
}

/// Accept one normalised list element as a record with a usable id.
///
/// Non-objects and records with neither `id` nor `pk` are skipped without
/// counting as errors; an id that cannot be a primary key is an error.
fn candidate(kind: EntityKind, item: Value) -> Result<Option<(RemoteId, Record)>, RecordError> {
  let record = match mapping::into_record(item) {
    Ok(record) => record,
    Err(e) => {
      tracing::warn!("skipping {} item: {e}", kind.label());
      return Ok(None);
    }
  };
  match mapping::remote_id(&record) {
    Ok(id) => Ok(Some((id, record))),
    Err(jeb_core::Error::MissingRemoteId) => {
      let shown = Value::Object(record);
      tracing::warn!("skipping {} item without id: {shown}", kind.label());
      Ok(None)
    }
    Err(e) => Err(e.into()),
  }
}

fn record_failure(
  summary: &mut SyncSummary,
  kind: EntityKind,
  id: Option<&RemoteId>,
  e: &RecordError,
) {
  summary.record_error();
  match id {
    Some(id) => tracing::error!(remote_id = %id, "{} record failed: {e}", kind.label()),
    None => tracing::error!("{} record failed: {e}", kind.label()),
  }
}
