//! Handlers that trigger sync runs.
//!
//! Both answer `200` when every routine involved reported `ok`, `502`
//! otherwise. The body is the same JSON the `jeb` commands print.

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use jeb_core::store::SyncStore;
use jeb_sync::EntityReport;

use crate::{AppState, auth::Authenticated, error::ApiError, parse_kind};

fn status_for(ok: bool) -> StatusCode {
  if ok { StatusCode::OK } else { StatusCode::BAD_GATEWAY }
}

/// `POST /sync`
pub async fn run_all<S>(
  _: Authenticated,
  State(state): State<AppState<S>>,
) -> impl IntoResponse
where
  S: SyncStore + 'static,
{
  let report = state.syncer.sync_all().await;
  (status_for(report.all_ok()), Json(report))
}

/// `POST /sync/{entity}`, where `entity` is `startups`, `users`, … (the singular
/// label is accepted too).
pub async fn run_one<S>(
  _: Authenticated,
  State(state): State<AppState<S>>,
  Path(entity): Path<String>,
) -> Result<impl IntoResponse, ApiError>
where
  S: SyncStore + 'static,
{
  let kind = parse_kind(&entity)?;
  let report = EntityReport::from(state.syncer.sync(kind).await);
  Ok((status_for(report.ok()), Json(report)))
}
