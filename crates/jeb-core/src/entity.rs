//! Entity kinds and the local row types the importer writes.
//!
//! Every row is keyed by the remote system's integer id; the importer never
//! lets the database assign a key. Rows are written wholesale on every pass,
//! so each struct carries exactly the columns an import overwrites.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

use crate::Error;

// ─── EntityKind ──────────────────────────────────────────────────────────────

/// The six entity types pulled from the remote API.
///
/// The `snake_case` form (`startup`, `news`, ...) is the label stored in the
/// trace table; [`EntityKind::resource`] is the plural REST path segment.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  PartialOrd,
  Ord,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EntityKind {
  Startup,
  User,
  Investor,
  Partner,
  News,
  Event,
}

impl EntityKind {
  /// Sync order used by the orchestrator.
  pub const ALL: [EntityKind; 6] = [
    Self::Startup,
    Self::User,
    Self::Investor,
    Self::Partner,
    Self::News,
    Self::Event,
  ];

  /// The label stored in `import_api.cible_type`.
  pub fn label(self) -> &'static str { self.into() }

  /// The REST collection name, e.g. `startups`. Also used as the key in the
  /// orchestrator's result map.
  pub fn resource(self) -> &'static str {
    match self {
      Self::Startup => "startups",
      Self::User => "users",
      Self::Investor => "investors",
      Self::Partner => "partners",
      Self::News => "news",
      Self::Event => "events",
    }
  }

  /// The local table holding rows of this kind.
  pub fn table(self) -> &'static str { self.resource() }

  /// Parse either the collection name (`startups`) or the label (`startup`).
  pub fn from_resource(s: &str) -> crate::Result<Self> {
    if let Some(kind) = Self::ALL.into_iter().find(|k| k.resource() == s) {
      return Ok(kind);
    }
    Self::from_str(s).map_err(|_| Error::UnknownEntityKind(s.to_owned()))
  }
}

// ─── Rows ────────────────────────────────────────────────────────────────────

/// A startup row. The local table carries both the French and the English
/// column sets; the mapper fills both from the same remote keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartupRow {
  pub id:                 i64,
  pub nom:                String,
  pub slug:               String,
  pub description_courte: Option<String>,
  pub description_longue: Option<String>,
  pub secteur:            Option<String>,
  pub stade:              Option<String>,
  pub date_creation:      Option<String>,
  pub site_web:           Option<String>,
  pub reseaux_sociaux:    Option<serde_json::Value>,
  pub logo_url:           Option<String>,
  pub contact_email:      String,
  pub contact_tel:        Option<String>,
  pub localisation:       Option<String>,
  pub nb_pers:            i64,
  pub cree_le:            DateTime<Utc>,
  pub maj_le:             DateTime<Utc>,
  pub name:               String,
  pub legal_status:       Option<String>,
  pub address:            Option<String>,
  pub email:              Option<String>,
  pub phone:              Option<String>,
  pub created_at:         Option<String>,
  pub description:        Option<String>,
  pub website_url:        Option<String>,
  pub social_media_url:   Option<serde_json::Value>,
  pub project_status:     Option<String>,
  pub needs:              Option<serde_json::Value>,
  pub sector:             Option<String>,
  pub maturity:           Option<String>,
}

/// A platform user. `password` is cleartext or an existing PHC hash; the
/// store hashes cleartext on write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRow {
  pub id:            i64,
  pub nom:           String,
  pub email:         String,
  pub password:      String,
  pub role:          String,
  pub avatar_url:    Option<String>,
  pub dernier_login: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvestorRow {
  pub id:               i64,
  pub name:             String,
  pub legal_status:     Option<String>,
  pub address:          Option<String>,
  pub email:            String,
  pub phone:            Option<String>,
  pub description:      Option<String>,
  pub investor_type:    Option<String>,
  pub investment_focus: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartnerRow {
  pub id:               i64,
  pub name:             String,
  pub legal_status:     Option<String>,
  pub address:          Option<String>,
  pub email:            String,
  pub phone:            Option<String>,
  pub description:      Option<String>,
  pub partnership_type: Option<String>,
}

/// A news item. `auteur_id` is only set once the author is known to exist
/// locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsRow {
  pub id:        i64,
  pub titre:     String,
  pub slug:      String,
  pub contenu:   String,
  pub image_url: Option<String>,
  pub auteur_id: Option<i64>,
  /// Stored in the `type` column.
  pub kind:      Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRow {
  pub id:              i64,
  pub titre:           String,
  pub description:     Option<String>,
  pub date_debut:      Option<String>,
  pub date_fin:        Option<String>,
  pub lieu:            Option<String>,
  pub organisateur_id: Option<i64>,
  pub nb_inscrits:     i64,
  /// Stored in the `type` column.
  pub kind:            String,
  pub photo_url:       Option<String>,
}

/// Any row the upsert engine accepts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "row", rename_all = "snake_case")]
pub enum EntityRow {
  Startup(StartupRow),
  User(UserRow),
  Investor(InvestorRow),
  Partner(PartnerRow),
  News(NewsRow),
  Event(EventRow),
}

impl EntityRow {
  pub fn id(&self) -> i64 {
    match self {
      Self::Startup(r) => r.id,
      Self::User(r) => r.id,
      Self::Investor(r) => r.id,
      Self::Partner(r) => r.id,
      Self::News(r) => r.id,
      Self::Event(r) => r.id,
    }
  }

  pub fn kind(&self) -> EntityKind {
    match self {
      Self::Startup(_) => EntityKind::Startup,
      Self::User(_) => EntityKind::User,
      Self::Investor(_) => EntityKind::Investor,
      Self::Partner(_) => EntityKind::Partner,
      Self::News(_) => EntityKind::News,
      Self::Event(_) => EntityKind::Event,
    }
  }
}
