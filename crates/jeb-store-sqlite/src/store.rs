//! [`SqliteStore`], the SQLite implementation of [`SyncStore`].

use std::path::Path;

use chrono::Utc;
use jeb_core::{
  entity::{EntityKind, EntityRow},
  store::SyncStore,
  summary::UpsertOutcome,
  trace::{ImportTrace, NewTrace, TRACE_SOURCE},
};
use rusqlite::{OptionalExtension as _, params, params_from_iter, types::Value as SqlValue};

use crate::{
  Result,
  encode::{Columns, RawTrace, encode_dt, encode_row},
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// The local JEB store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Tier one: look the row up by primary key, then UPDATE the supplied
  /// columns or INSERT a new row carrying the given id.
  pub(crate) async fn upsert_direct(
    &self,
    kind: EntityKind,
    id: i64,
    cols: Columns,
  ) -> Result<UpsertOutcome> {
    let table = kind.table();
    let outcome = self
      .conn
      .call(move |conn| {
        let exists = conn
          .query_row(
            &format!("SELECT 1 FROM {table} WHERE id = ?1"),
            params![id],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);

        if exists {
          conn.execute(&update_sql(table, &cols), params_from_iter(update_values(id, cols)))?;
          Ok(UpsertOutcome::Updated)
        } else {
          conn.execute(&insert_sql(table, &cols), params_from_iter(insert_values(id, cols)))?;
          Ok(UpsertOutcome::Created)
        }
      })
      .await?;
    Ok(outcome)
  }

  /// Tier two: a single `INSERT ... ON CONFLICT(id) DO UPDATE` inside a
  /// transaction, with the prior existence read in the same transaction.
  pub(crate) async fn upsert_fallback(
    &self,
    kind: EntityKind,
    id: i64,
    cols: Columns,
  ) -> Result<UpsertOutcome> {
    let table = kind.table();
    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let existed = tx
          .query_row(
            &format!("SELECT 1 FROM {table} WHERE id = ?1"),
            params![id],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);

        let sql = format!("{} {}", insert_sql(table, &cols), on_conflict_sql(&cols));
        tx.execute(&sql, params_from_iter(insert_values(id, cols)))?;
        tx.commit()?;

        Ok(if existed { UpsertOutcome::Updated } else { UpsertOutcome::Created })
      })
      .await?;
    Ok(outcome)
  }
}

// ─── SQL builders ────────────────────────────────────────────────────────────

fn insert_sql(table: &str, cols: &Columns) -> String {
  let names: Vec<&str> = cols.iter().map(|(name, _)| *name).collect();
  let placeholders: Vec<String> = (1..=cols.len() + 1).map(|i| format!("?{i}")).collect();
  format!(
    "INSERT INTO {table} (id, {}) VALUES ({})",
    names.join(", "),
    placeholders.join(", "),
  )
}

fn on_conflict_sql(cols: &Columns) -> String {
  let sets: Vec<String> = cols
    .iter()
    .map(|(name, _)| format!("{name} = excluded.{name}"))
    .collect();
  format!("ON CONFLICT(id) DO UPDATE SET {}", sets.join(", "))
}

fn update_sql(table: &str, cols: &Columns) -> String {
  let sets: Vec<String> = cols
    .iter()
    .enumerate()
    .map(|(i, (name, _))| format!("{name} = ?{}", i + 1))
    .collect();
  format!("UPDATE {table} SET {} WHERE id = ?{}", sets.join(", "), cols.len() + 1)
}

fn insert_values(id: i64, cols: Columns) -> Vec<SqlValue> {
  std::iter::once(SqlValue::Integer(id))
    .chain(cols.into_iter().map(|(_, v)| v))
    .collect()
}

fn update_values(id: i64, cols: Columns) -> Vec<SqlValue> {
  cols
    .into_iter()
    .map(|(_, v)| v)
    .chain(std::iter::once(SqlValue::Integer(id)))
    .collect()
}

// ─── SyncStore impl ──────────────────────────────────────────────────────────

impl SyncStore for SqliteStore {
  type Error = crate::Error;

  // ── Entities ──────────────────────────────────────────────────────────────

  async fn upsert(&self, row: EntityRow) -> Result<UpsertOutcome> {
    let kind = row.kind();
    let id = row.id();
    let cols = encode_row(row, Utc::now())?;

    match self.upsert_direct(kind, id, cols.clone()).await {
      Ok(outcome) => Ok(outcome),
      Err(e) => {
        tracing::warn!(entity = kind.label(), id, "direct write failed, retrying as upsert: {e}");
        self.upsert_fallback(kind, id, cols).await
      }
    }
  }

  async fn set_founders_json(&self, startup_id: i64, founders: serde_json::Value) -> Result<()> {
    let json = founders.to_string();
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE startups SET founders_json = ?1 WHERE id = ?2",
          params![json, startup_id],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn replace_founders(&self, startup_id: i64, names: Vec<String>) -> Result<usize> {
    let inserted = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM founders WHERE startup_id = ?1", params![startup_id])?;
        {
          let mut stmt =
            tx.prepare("INSERT INTO founders (startup_id, name) VALUES (?1, ?2)")?;
          for name in &names {
            stmt.execute(params![startup_id, name])?;
          }
        }
        tx.commit()?;
        Ok(names.len())
      })
      .await?;
    Ok(inserted)
  }

  async fn user_exists(&self, id: i64) -> Result<bool> {
    let exists = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row("SELECT 1 FROM users WHERE id = ?1", params![id], |_| Ok(true))
            .optional()?
            .unwrap_or(false),
        )
      })
      .await?;
    Ok(exists)
  }

  async fn local_ids(&self, kind: EntityKind) -> Result<Vec<i64>> {
    let table = kind.table();
    let ids = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!("SELECT id FROM {table} ORDER BY id"))?;
        let ids = stmt
          .query_map([], |r| r.get(0))?
          .collect::<rusqlite::Result<Vec<i64>>>()?;
        Ok(ids)
      })
      .await?;
    Ok(ids)
  }

  // ── Import traces ─────────────────────────────────────────────────────────

  async fn record_trace(&self, trace: NewTrace) -> Result<ImportTrace> {
    let label = trace.entity_type.label();
    let remote_id = trace.remote_id;
    let local_id = trace.local_id;
    let payload = serde_json::to_string(&trace.raw_payload)?;
    let synced_at = encode_dt(Utc::now());

    let (raw, removed) = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let keep: Option<i64> = tx
          .query_row(
            "SELECT id FROM import_api
             WHERE source = ?1 AND cible_type = ?2 AND remote_id = ?3
             ORDER BY dernier_sync DESC, id DESC
             LIMIT 1",
            params![TRACE_SOURCE, label, remote_id],
            |r| r.get(0),
          )
          .optional()?;

        let (id, removed) = match keep {
          Some(id) => {
            let removed = tx.execute(
              "DELETE FROM import_api
               WHERE source = ?1 AND cible_type = ?2 AND remote_id = ?3 AND id <> ?4",
              params![TRACE_SOURCE, label, remote_id, id],
            )?;
            tx.execute(
              "UPDATE import_api
               SET local_id = ?1, dernier_sync = ?2, payload_brut = ?3
               WHERE id = ?4",
              params![local_id, synced_at, payload, id],
            )?;
            (id, removed)
          }
          None => {
            tx.execute(
              "INSERT INTO import_api
                 (source, remote_id, local_id, cible_type, dernier_sync, payload_brut)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
              params![TRACE_SOURCE, remote_id, local_id, label, synced_at, payload],
            )?;
            (tx.last_insert_rowid(), 0)
          }
        };

        let raw = tx.query_row(
          &format!("SELECT {} FROM import_api WHERE id = ?1", RawTrace::COLUMNS),
          params![id],
          RawTrace::from_row,
        )?;
        tx.commit()?;
        Ok((raw, removed))
      })
      .await?;

    if removed > 0 {
      tracing::debug!(entity = label, remote_id = %raw.remote_id, removed, "collapsed duplicate import traces");
    }
    raw.into_trace()
  }

  async fn list_traces(&self, kind: Option<EntityKind>) -> Result<Vec<ImportTrace>> {
    let label = kind.map(EntityKind::label);
    let raws = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {} FROM import_api
           WHERE source = ?1 AND (?2 IS NULL OR cible_type = ?2)
           ORDER BY dernier_sync DESC, id DESC",
          RawTrace::COLUMNS,
        ))?;
        let raws = stmt
          .query_map(params![TRACE_SOURCE, label], RawTrace::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(raws)
      })
      .await?;
    raws.into_iter().map(RawTrace::into_trace).collect()
  }

  async fn get_trace(&self, kind: EntityKind, remote_id: String) -> Result<Option<ImportTrace>> {
    let label = kind.label();
    let raw = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {} FROM import_api
                 WHERE source = ?1 AND cible_type = ?2 AND remote_id = ?3
                 ORDER BY dernier_sync DESC, id DESC
                 LIMIT 1",
                RawTrace::COLUMNS,
              ),
              params![TRACE_SOURCE, label, remote_id],
              RawTrace::from_row,
            )
            .optional()?,
        )
      })
      .await?;
    raw.map(RawTrace::into_trace).transpose()
  }
}
