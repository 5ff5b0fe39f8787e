//! SQL schema for the JEB SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
///
/// Entity tables never autoincrement on import: the remote id is written as
/// the primary key.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS startups (
    id                 INTEGER PRIMARY KEY,
    nom                TEXT NOT NULL,
    slug               TEXT NOT NULL UNIQUE,
    description_courte TEXT,
    description_longue TEXT,
    secteur            TEXT,
    stade              TEXT,
    date_creation      TEXT,
    site_web           TEXT,
    reseaux_sociaux    TEXT,            -- JSON
    logo_url           TEXT,
    contact_email      TEXT NOT NULL,
    contact_tel        TEXT,
    localisation       TEXT,
    nb_pers            INTEGER NOT NULL DEFAULT 0,
    cree_le            TEXT NOT NULL,
    maj_le             TEXT NOT NULL,
    name               TEXT,
    legal_status       TEXT,
    address            TEXT,
    email              TEXT,
    phone              TEXT,
    created_at         TEXT,
    description        TEXT,
    website_url        TEXT,
    social_media_url   TEXT,            -- JSON
    project_status     TEXT,
    needs              TEXT,            -- JSON
    sector             TEXT,
    maturity           TEXT,
    founders_json      TEXT             -- JSON mirror of the last founder list
);

-- Founders have no remote identity; every sync replaces the whole list.
CREATE TABLE IF NOT EXISTS founders (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    startup_id  INTEGER NOT NULL REFERENCES startups(id) ON DELETE CASCADE,
    name        TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS users (
    id            INTEGER PRIMARY KEY,
    nom           TEXT NOT NULL,
    email         TEXT NOT NULL UNIQUE,
    password      TEXT NOT NULL,   -- argon2 PHC string
    role          TEXT NOT NULL DEFAULT 'startup',
    avatar_url    TEXT,
    dernier_login TEXT,
    cree_le       TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    maj_le        TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
);

CREATE TABLE IF NOT EXISTS investors (
    id               INTEGER PRIMARY KEY,
    name             TEXT NOT NULL,
    legal_status     TEXT,
    address          TEXT,
    email            TEXT NOT NULL,
    phone            TEXT,
    created_at       TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    description      TEXT,
    investor_type    TEXT,
    investment_focus TEXT
);

CREATE TABLE IF NOT EXISTS partners (
    id               INTEGER PRIMARY KEY,
    name             TEXT NOT NULL,
    legal_status     TEXT,
    address          TEXT,
    email            TEXT NOT NULL,
    phone            TEXT,
    created_at       TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    description      TEXT,
    partnership_type TEXT
);

CREATE TABLE IF NOT EXISTS news (
    id         INTEGER PRIMARY KEY,
    titre      TEXT NOT NULL,
    slug       TEXT NOT NULL UNIQUE,
    contenu    TEXT NOT NULL,
    image_url  TEXT,
    publie_le  TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    auteur_id  INTEGER REFERENCES users(id) ON DELETE SET NULL,
    type       TEXT
);

CREATE TABLE IF NOT EXISTS events (
    id              INTEGER PRIMARY KEY,
    titre           TEXT NOT NULL,
    description     TEXT,
    date_debut      TEXT,
    date_fin        TEXT,
    lieu            TEXT,
    organisateur_id INTEGER REFERENCES users(id) ON DELETE SET NULL,
    nb_inscrits     INTEGER NOT NULL DEFAULT 0,
    type            TEXT NOT NULL DEFAULT 'general',
    photo_url       TEXT
);

-- Import traces. No UNIQUE constraint on (source, cible_type, remote_id):
-- older duplicates are collapsed by the trace recorder.
CREATE TABLE IF NOT EXISTS import_api (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    source       TEXT NOT NULL DEFAULT 'API JEB',
    remote_id    TEXT NOT NULL,
    local_id     INTEGER NOT NULL,
    cible_type   TEXT NOT NULL,
    dernier_sync TEXT NOT NULL,   -- fixed-width RFC 3339 UTC
    payload_brut TEXT             -- raw remote record, JSON
);

CREATE INDEX IF NOT EXISTS founders_startup_idx ON founders(startup_id);
CREATE INDEX IF NOT EXISTS import_api_key_idx   ON import_api(source, cible_type, remote_id);

PRAGMA user_version = 1;
";
