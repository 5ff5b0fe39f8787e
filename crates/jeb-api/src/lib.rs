//! Operator JSON API for the JEB importer.
//!
//! Exposes read-only access to import traces and endpoints that trigger
//! sync runs, all behind HTTP Basic auth.

pub mod auth;
pub mod error;
pub mod imports;
pub mod sync;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use jeb_core::{entity::EntityKind, store::SyncStore};
use jeb_sync::Syncer;
use tower_http::trace::TraceLayer;

pub use auth::AuthConfig;
pub use error::ApiError;

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<S> {
  pub syncer: Syncer<S>,
  pub auth:   Arc<AuthConfig>,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      syncer: self.syncer.clone(),
      auth:   Arc::clone(&self.auth),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the operator API router.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: SyncStore + 'static,
{
  Router::new()
    .route("/imports",                            get(imports::list::<S>))
    .route("/imports/{entity_type}/{remote_id}",  get(imports::get_one::<S>))
    .route("/sync",                               post(sync::run_all::<S>))
    .route("/sync/{entity}",                      post(sync::run_one::<S>))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

pub(crate) fn parse_kind(value: &str) -> Result<EntityKind, ApiError> {
  EntityKind::from_resource(value).map_err(|e| ApiError::BadRequest(e.to_string()))
}

// ─── Integration tests ────────────────────────────────────────────────────────
