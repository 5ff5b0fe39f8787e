//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 UTC strings so the column
//! sorts chronologically. JSON-typed columns hold compact JSON text.

use chrono::{DateTime, SecondsFormat, Utc};
use jeb_core::{
  entity::{EntityKind, EntityRow},
  trace::ImportTrace,
};
use rusqlite::types::Value as SqlValue;

use crate::{Error, Result, password::hash_if_cleartext};

/// Column name / value pairs for one row, primary key excluded.
pub type Columns = Vec<(&'static str, SqlValue)>;

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Scalars ─────────────────────────────────────────────────────────────────

fn text(s: String) -> SqlValue { SqlValue::Text(s) }

fn opt_text(s: Option<String>) -> SqlValue { s.map_or(SqlValue::Null, SqlValue::Text) }

fn opt_json(v: Option<serde_json::Value>) -> SqlValue {
  v.map_or(SqlValue::Null, |v| SqlValue::Text(v.to_string()))
}

fn opt_int(i: Option<i64>) -> SqlValue { i.map_or(SqlValue::Null, SqlValue::Integer) }

// ─── Rows ────────────────────────────────────────────────────────────────────

/// Flatten a row into the columns an import overwrites.
///
/// User passwords are hashed here unless they already are PHC strings, so
/// cleartext never reaches the table.
pub fn encode_row(row: EntityRow, now: DateTime<Utc>) -> Result<Columns> {
  let cols = match row {
    EntityRow::Startup(r) => vec![
      ("nom", text(r.nom)),
      ("slug", text(r.slug)),
      ("description_courte", opt_text(r.description_courte)),
      ("description_longue", opt_text(r.description_longue)),
      ("secteur", opt_text(r.secteur)),
      ("stade", opt_text(r.stade)),
      ("date_creation", opt_text(r.date_creation)),
      ("site_web", opt_text(r.site_web)),
      ("reseaux_sociaux", opt_json(r.reseaux_sociaux)),
      ("logo_url", opt_text(r.logo_url)),
      ("contact_email", text(r.contact_email)),
      ("contact_tel", opt_text(r.contact_tel)),
      ("localisation", opt_text(r.localisation)),
      ("nb_pers", SqlValue::Integer(r.nb_pers)),
      ("cree_le", text(encode_dt(r.cree_le))),
      ("maj_le", text(encode_dt(r.maj_le))),
      ("name", text(r.name)),
      ("legal_status", opt_text(r.legal_status)),
      ("address", opt_text(r.address)),
      ("email", opt_text(r.email)),
      ("phone", opt_text(r.phone)),
      ("created_at", opt_text(r.created_at)),
      ("description", opt_text(r.description)),
      ("website_url", opt_text(r.website_url)),
      ("social_media_url", opt_json(r.social_media_url)),
      ("project_status", opt_text(r.project_status)),
      ("needs", opt_json(r.needs)),
      ("sector", opt_text(r.sector)),
      ("maturity", opt_text(r.maturity)),
    ],
    EntityRow::User(r) => vec![
      ("nom", text(r.nom)),
      ("email", text(r.email)),
      ("password", text(hash_if_cleartext(&r.password)?)),
      ("role", text(r.role)),
      ("avatar_url", opt_text(r.avatar_url)),
      ("dernier_login", opt_text(r.dernier_login)),
      ("maj_le", text(encode_dt(now))),
    ],
    EntityRow::Investor(r) => vec![
      ("name", text(r.name)),
      ("legal_status", opt_text(r.legal_status)),
      ("address", opt_text(r.address)),
      ("email", text(r.email)),
      ("phone", opt_text(r.phone)),
      ("description", opt_text(r.description)),
      ("investor_type", opt_text(r.investor_type)),
      ("investment_focus", opt_text(r.investment_focus)),
    ],
    EntityRow::Partner(r) => vec![
      ("name", text(r.name)),
      ("legal_status", opt_text(r.legal_status)),
      ("address", opt_text(r.address)),
      ("email", text(r.email)),
      ("phone", opt_text(r.phone)),
      ("description", opt_text(r.description)),
      ("partnership_type", opt_text(r.partnership_type)),
    ],
    EntityRow::News(r) => vec![
      ("titre", text(r.titre)),
      ("slug", text(r.slug)),
      ("contenu", text(r.contenu)),
      ("image_url", opt_text(r.image_url)),
      ("auteur_id", opt_int(r.auteur_id)),
      ("type", opt_text(r.kind)),
    ],
    EntityRow::Event(r) => vec![
      ("titre", text(r.titre)),
      ("description", opt_text(r.description)),
      ("date_debut", opt_text(r.date_debut)),
      ("date_fin", opt_text(r.date_fin)),
      ("lieu", opt_text(r.lieu)),
      ("organisateur_id", opt_int(r.organisateur_id)),
      ("nb_inscrits", SqlValue::Integer(r.nb_inscrits)),
      ("type", text(r.kind)),
      ("photo_url", opt_text(r.photo_url)),
    ],
  };
  Ok(cols)
}

// ─── Trace rows ──────────────────────────────────────────────────────────────

/// Raw values read directly from an `import_api` row.
pub struct RawTrace {
  pub id:           i64,
  pub source:       String,
  pub remote_id:    String,
  pub local_id:     i64,
  pub cible_type:   String,
  pub dernier_sync: String,
  pub payload_brut: Option<String>,
}

impl RawTrace {
  pub const COLUMNS: &'static str =
    "id, source, remote_id, local_id, cible_type, dernier_sync, payload_brut";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:           row.get(0)?,
      source:       row.get(1)?,
      remote_id:    row.get(2)?,
      local_id:     row.get(3)?,
      cible_type:   row.get(4)?,
      dernier_sync: row.get(5)?,
      payload_brut: row.get(6)?,
    })
  }

  pub fn into_trace(self) -> Result<ImportTrace> {
    Ok(ImportTrace {
      id:          self.id,
      source:      self.source,
      entity_type: EntityKind::from_resource(&self.cible_type)?,
      remote_id:   self.remote_id,
      local_id:    self.local_id,
      synced_at:   decode_dt(&self.dernier_sync)?,
      raw_payload: self.payload_brut,
    })
  }
}
