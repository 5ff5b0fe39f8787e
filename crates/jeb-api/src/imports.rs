//! Handlers for `/imports` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/imports` | Optional `?entity_type=startup\|user\|…`, newest first |
//! | `GET`  | `/imports/{entity_type}/{remote_id}` | 404 if never imported |

use axum::{
  Json,
  extract::{Path, Query, State},
};
use jeb_core::{store::SyncStore, trace::ImportTrace};
use serde::Deserialize;

use crate::{AppState, auth::Authenticated, error::ApiError, parse_kind};

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub entity_type: Option<String>,
}

/// `GET /imports[?entity_type=<label>]`
pub async fn list<S>(
  _: Authenticated,
  State(state): State<AppState<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<ImportTrace>>, ApiError>
where
  S: SyncStore + 'static,
{
  let kind = params.entity_type.as_deref().map(parse_kind).transpose()?;
  let traces = state
    .syncer
    .store()
    .list_traces(kind)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(traces))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /imports/{entity_type}/{remote_id}`
pub async fn get_one<S>(
  _: Authenticated,
  State(state): State<AppState<S>>,
  Path((entity_type, remote_id)): Path<(String, String)>,
) -> Result<Json<ImportTrace>, ApiError>
where
  S: SyncStore + 'static,
{
  let kind = parse_kind(&entity_type)?;
  let trace = state
    .syncer
    .store()
    .get_trace(kind, remote_id.clone())
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("no import of {kind} {remote_id}")))?;
  Ok(Json(trace))
}
