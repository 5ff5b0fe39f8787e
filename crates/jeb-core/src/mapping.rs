//! Field mapping from remote records to local rows.
//!
//! Each local column is filled from an ordered list of remote keys (English
//! first, then the French alias) and finally a synthesised default. A key
//! only counts when its value is truthy: `null`, `false`, `0`, `""`, `[]`
//! and `{}` all fall through to the next key.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::{
  Error, Result,
  entity::{EventRow, InvestorRow, NewsRow, PartnerRow, StartupRow, UserRow},
};

/// One remote record, as produced by [`crate::payload::normalize`].
pub type Record = Map<String, Value>;

/// Fields whose absence on a list record triggers a detail fetch.
pub const STARTUP_DETAIL_FIELDS: [&str; 6] = [
  "description",
  "created_at",
  "website_url",
  "social_media_url",
  "needs",
  "founders",
];

// ─── Lookup helpers ──────────────────────────────────────────────────────────

pub fn is_truthy(value: &Value) -> bool {
  match value {
    Value::Null => false,
    Value::Bool(b) => *b,
    Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
    Value::String(s) => !s.is_empty(),
    Value::Array(a) => !a.is_empty(),
    Value::Object(o) => !o.is_empty(),
  }
}

/// The first truthy value among `keys`.
pub fn pick<'a>(record: &'a Record, keys: &[&str]) -> Option<&'a Value> {
  keys
    .iter()
    .filter_map(|k| record.get(*k))
    .find(|v| is_truthy(v))
}

/// Render a scalar the way a text column stores it.
pub fn render_text(value: &Value) -> String {
  match value {
    Value::String(s) => s.clone(),
    other => other.to_string(),
  }
}

fn text(record: &Record, keys: &[&str]) -> Option<String> {
  pick(record, keys).map(render_text)
}

fn text_or(record: &Record, keys: &[&str], default: impl Into<String>) -> String {
  text(record, keys).unwrap_or_else(|| default.into())
}

fn json(record: &Record, keys: &[&str]) -> Option<Value> { pick(record, keys).cloned() }

/// Lenient integer read; anything that is not a number or a numeric string
/// counts as `default`.
fn integer_or(record: &Record, keys: &[&str], default: i64) -> i64 {
  pick(record, keys).and_then(as_integer).unwrap_or(default)
}

fn as_integer(value: &Value) -> Option<i64> {
  match value {
    Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
    Value::String(s) => {
      let s = s.trim();
      s.parse::<i64>()
        .ok()
        .or_else(|| s.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f as i64))
    }
    Value::Bool(true) => Some(1),
    _ => None,
  }
}

/// Whether a list-derived startup record lacks any of the detail fields.
/// Only `null`, `""` and `[]` count as empty here.
pub fn lacks_detail(record: &Record) -> bool {
  STARTUP_DETAIL_FIELDS.iter().any(|k| match record.get(*k) {
    None | Some(Value::Null) => true,
    Some(Value::String(s)) => s.is_empty(),
    Some(Value::Array(a)) => a.is_empty(),
    Some(_) => false,
  })
}

/// Take a normalised list element as a record.
pub fn into_record(value: Value) -> Result<Record> {
  match value {
    Value::Object(map) => Ok(map),
    Value::Null => Err(Error::NotAnObject("null")),
    Value::Bool(_) => Err(Error::NotAnObject("boolean")),
    Value::Number(_) => Err(Error::NotAnObject("number")),
    Value::String(_) => Err(Error::NotAnObject("string")),
    Value::Array(_) => Err(Error::NotAnObject("array")),
  }
}

// ─── Remote id ───────────────────────────────────────────────────────────────

/// The identity of a remote record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RemoteId {
  /// The local primary key.
  pub key:  i64,
  /// The textual form kept in the trace table.
  pub text: String,
}

impl std::fmt::Display for RemoteId {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(&self.text)
  }
}

/// Resolve `id`, falling back to `pk`.
///
/// The value must be an integer (or an integer-valued string) because it
/// becomes the local primary key.
pub fn remote_id(record: &Record) -> Result<RemoteId> {
  let value = pick(record, &["id", "pk"]).ok_or(Error::MissingRemoteId)?;
  let text = render_text(value);
  let key = match value {
    Value::Number(n) => n.as_i64(),
    Value::String(s) => s.trim().parse::<i64>().ok(),
    _ => None,
  }
  .ok_or_else(|| Error::InvalidRemoteId(text.clone()))?;
  Ok(RemoteId { key, text })
}

/// A foreign-key-like reference (author, organiser). Unusable values read as
/// no reference.
pub fn reference(record: &Record, keys: &[&str]) -> Option<i64> {
  pick(record, keys).and_then(|v| match v {
    Value::Number(n) => n.as_i64(),
    Value::String(s) => s.trim().parse().ok(),
    _ => None,
  })
}

// ─── Startups ────────────────────────────────────────────────────────────────

/// A mapped startup plus the founder list to apply after the upsert.
#[derive(Debug, Clone, PartialEq)]
pub struct MappedStartup {
  pub row:      StartupRow,
  /// `Some` when the remote founder value is a list (an absent value maps to
  /// an empty list); each element is the raw founder entry.
  pub founders: Option<Vec<Value>>,
}

impl MappedStartup {
  /// Founder names to insert; non-object entries are skipped.
  pub fn founder_names(&self) -> Vec<String> {
    self
      .founders
      .iter()
      .flatten()
      .filter_map(Value::as_object)
      .map(|f| text_or(f, &["name", "nom"], "Fondateur"))
      .collect()
  }
}

pub fn map_startup(id: &RemoteId, record: &Record, now: DateTime<Utc>) -> MappedStartup {
  let rid = id.key;
  let display_name = text_or(record, &["name", "nom"], format!("Startup-{rid}"));

  let founders = match pick(record, &["founders", "fondateurs"]) {
    None => Some(Vec::new()),
    Some(Value::Array(list)) => Some(list.clone()),
    Some(_) => None,
  };

  let row = StartupRow {
    id:                 rid,
    nom:                display_name.clone(),
    slug:               text_or(record, &["slug"], format!("startup-{rid}")),
    description_courte: text(record, &["short_description", "description_courte"]),
    description_longue: text(record, &["description", "description_longue"]),
    secteur:            text(record, &["sector", "secteur"]),
    stade:              text(record, &["maturity", "stade"]),
    date_creation:      text(record, &["created_at", "date_creation"]),
    site_web:           text(record, &["website_url", "site_web"]),
    reseaux_sociaux:    json(record, &["social_media_url", "reseaux_sociaux"]),
    logo_url:           text(record, &["logo", "logo_url"]),
    contact_email:      text_or(record, &["email", "contact_email"], "inconnu@example.com"),
    contact_tel:        text(record, &["phone", "contact_tel"]),
    localisation:       text(record, &["address", "localisation"]),
    nb_pers:            integer_or(record, &["team_size", "nb_pers"], 0),
    cree_le:            now,
    maj_le:             now,
    name:               display_name,
    legal_status:       text(record, &["legal_status", "statut_juridique"]),
    address:            text(record, &["address", "adresse"]),
    email:              text(record, &["email", "contact_email"]),
    phone:              text(record, &["phone", "contact_tel"]),
    created_at:         text(record, &["created_at", "date_creation"]),
    description:        text(record, &["description", "description_longue"]),
    website_url:        text(record, &["website_url", "site_web"]),
    social_media_url:   json(record, &["social_media_url", "reseaux_sociaux"]),
    project_status:     text(record, &["project_status", "status"]),
    needs:              json(record, &["needs", "current_needs", "besoins"]),
    sector:             text(record, &["sector", "secteur"]),
    maturity:           text(record, &["maturity", "stade"]),
  };

  MappedStartup { row, founders }
}

// ─── Users ───────────────────────────────────────────────────────────────────

pub fn map_user(id: &RemoteId, record: &Record) -> UserRow {
  let rid = id.key;
  UserRow {
    id:            rid,
    nom:           text_or(record, &["name", "nom", "email"], format!("User-{rid}")),
    email:         text_or(record, &["email"], format!("user{rid}@example.com")),
    password:      text_or(record, &["password"], "!imported!"),
    role:          text_or(record, &["role"], "startup"),
    avatar_url:    text(record, &["avatar", "avatar_url"]),
    dernier_login: text(record, &["last_login", "dernier_login"]),
  }
}

// ─── Investors / partners ────────────────────────────────────────────────────

pub fn map_investor(id: &RemoteId, record: &Record) -> InvestorRow {
  let rid = id.key;
  InvestorRow {
    id:               rid,
    name:             text_or(record, &["name", "nom"], format!("Investor-{rid}")),
    legal_status:     text(record, &["legal_status"]),
    address:          text(record, &["address"]),
    email:            text_or(record, &["email"], format!("investor{rid}@example.com")),
    phone:            text(record, &["phone"]),
    description:      text(record, &["description"]),
    investor_type:    text(record, &["type", "investor_type"]),
    investment_focus: text(record, &["focus", "investment_focus"]),
  }
}

pub fn map_partner(id: &RemoteId, record: &Record) -> PartnerRow {
  let rid = id.key;
  PartnerRow {
    id:               rid,
    name:             text_or(record, &["name", "nom"], format!("Partner-{rid}")),
    legal_status:     text(record, &["legal_status"]),
    address:          text(record, &["address"]),
    email:            text_or(record, &["email"], format!("partner{rid}@example.com")),
    phone:            text(record, &["phone"]),
    description:      text(record, &["description"]),
    partnership_type: text(record, &["partnership_type", "type"]),
  }
}

// ─── News / events ───────────────────────────────────────────────────────────

/// Keys naming a news item's author.
pub const NEWS_AUTHOR_KEYS: [&str; 3] = ["author_id", "auteur_id", "auteur"];

/// Keys naming an event's organiser.
pub const EVENT_ORGANIZER_KEYS: [&str; 2] = ["organizer_id", "organisateur_id"];

/// Map a news record. `auteur_id` is left unset; the caller resolves
/// [`NEWS_AUTHOR_KEYS`] against the local users.
pub fn map_news(id: &RemoteId, record: &Record) -> NewsRow {
  let rid = id.key;
  NewsRow {
    id:        rid,
    titre:     text_or(record, &["title", "titre"], format!("News-{rid}")),
    slug:      text_or(record, &["slug"], format!("news-{rid}")),
    contenu:   text_or(record, &["content", "contenu"], ""),
    image_url: text(record, &["image", "image_url"]),
    auteur_id: None,
    kind:      text(record, &["type"]),
  }
}

/// Map an event record. `organisateur_id` is left unset; the caller resolves
/// [`EVENT_ORGANIZER_KEYS`] against the local users.
pub fn map_event(id: &RemoteId, record: &Record) -> EventRow {
  let rid = id.key;
  EventRow {
    id:              rid,
    titre:           text_or(record, &["title", "titre"], format!("Event-{rid}")),
    description:     text(record, &["description"]),
    date_debut:      text(record, &["start_date", "date_debut"]),
    date_fin:        text(record, &["end_date", "date_fin"]),
    lieu:            text(record, &["location", "lieu"]),
    organisateur_id: None,
    nb_inscrits:     integer_or(record, &["attendees", "nb_inscrits"], 0),
    kind:            text_or(record, &["type", "event_type"], "general"),
    photo_url:       text(record, &["image", "photo_url"]),
  }
}
