//! End-to-end routine tests against a local mock of the remote API.
//!
//! The mock is a real axum server on an ephemeral port; every request is
//! counted and its path logged. Writes go to an in-memory [`SyncStore`].

use std::{
  collections::{BTreeMap, HashMap},
  sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
  },
};

use axum::{
  Router,
  extract::State,
  http::{HeaderMap, StatusCode, Uri, header},
  response::{IntoResponse, Response},
};
use chrono::Utc;
use jeb_core::{
  entity::{EntityKind, EntityRow},
  mapping::{RemoteId, map_user},
  store::SyncStore,
  summary::UpsertOutcome,
  trace::{ImportTrace, NewTrace, TRACE_SOURCE},
};
use serde_json::{Value, json};
use tokio::net::TcpListener;

use crate::{SyncConfig, SyncError, Syncer, routine::PlainKind};

const TOKEN: &str = "group-token";

// ─── Mock remote API ─────────────────────────────────────────────────────────

struct MockApi {
  routes: HashMap<String, (StatusCode, String)>,
  hits:   AtomicUsize,
  paths:  Mutex<Vec<String>>,
}

impl MockApi {
  fn hits(&self) -> usize { self.hits.load(Ordering::SeqCst) }

  fn paths(&self) -> Vec<String> { self.paths.lock().unwrap().clone() }
}

async fn handle(State(api): State<Arc<MockApi>>, headers: HeaderMap, uri: Uri) -> Response {
  api.hits.fetch_add(1, Ordering::SeqCst);
  api.paths.lock().unwrap().push(uri.path().to_owned());

  let token = headers.get("x-group-authorization").and_then(|v| v.to_str().ok());
  if token != Some(TOKEN) {
    return StatusCode::UNAUTHORIZED.into_response();
  }

  match api.routes.get(uri.path()) {
    Some((status, body)) => {
      (*status, [(header::CONTENT_TYPE, "application/json")], body.clone()).into_response()
    }
    None => StatusCode::NOT_FOUND.into_response(),
  }
}

/// Serve `routes` on `127.0.0.1:0`; unknown paths answer 404.
async fn mock(routes: &[(&str, StatusCode, String)]) -> (String, Arc<MockApi>) {
  let api = Arc::new(MockApi {
    routes: routes
      .iter()
      .map(|(path, status, body)| (path.to_string(), (*status, body.clone())))
      .collect(),
    hits:   AtomicUsize::new(0),
    paths:  Mutex::new(Vec::new()),
  });

  let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
  let addr = listener.local_addr().unwrap();
  let app = Router::new().fallback(handle).with_state(Arc::clone(&api));
  tokio::spawn(async move {
    axum::serve(listener, app).await.unwrap();
  });

  (format!("http://{addr}"), api)
}

fn ok(body: Value) -> (StatusCode, String) { (StatusCode::OK, body.to_string()) }

async fn syncer_with(
  store: Arc<MemoryStore>,
  routes: &[(&str, StatusCode, String)],
) -> (Syncer<MemoryStore>, Arc<MockApi>) {
  let (base, api) = mock(routes).await;
  let syncer = Syncer::new(store, SyncConfig::new(base, TOKEN)).unwrap();
  (syncer, api)
}

async fn syncer(routes: &[(&str, StatusCode, String)]) -> (Syncer<MemoryStore>, Arc<MockApi>) {
  syncer_with(Arc::new(MemoryStore::default()), routes).await
}

fn route(path: &'static str, (status, body): (StatusCode, String)) -> (&'static str, StatusCode, String) {
  (path, status, body)
}

// ─── In-memory store ─────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
#[error("memory store: {0}")]
struct MemoryError(&'static str);

#[derive(Default)]
struct MemoryState {
  rows:          BTreeMap<(EntityKind, i64), EntityRow>,
  founders:      BTreeMap<i64, Vec<String>>,
  founders_json: BTreeMap<i64, Value>,
  traces:        Vec<ImportTrace>,
}

#[derive(Default)]
struct MemoryStore {
  state:           Mutex<MemoryState>,
  fail_upsert_for: Option<i64>,
  fail_traces:     bool,
}

impl MemoryStore {
  fn row(&self, kind: EntityKind, id: i64) -> Option<EntityRow> {
    self.state.lock().unwrap().rows.get(&(kind, id)).cloned()
  }

  fn traces(&self) -> Vec<ImportTrace> { self.state.lock().unwrap().traces.clone() }

  fn founders(&self, id: i64) -> Vec<String> {
    self.state.lock().unwrap().founders.get(&id).cloned().unwrap_or_default()
  }
}

impl SyncStore for MemoryStore {
  type Error = MemoryError;

  async fn upsert(&self, row: EntityRow) -> Result<UpsertOutcome, MemoryError> {
    if self.fail_upsert_for == Some(row.id()) {
      return Err(MemoryError("upsert refused"));
    }
    let key = (row.kind(), row.id());
    Ok(match self.state.lock().unwrap().rows.insert(key, row) {
      Some(_) => UpsertOutcome::Updated,
      None => UpsertOutcome::Created,
    })
  }

  async fn set_founders_json(&self, startup_id: i64, founders: Value) -> Result<(), MemoryError> {
    self.state.lock().unwrap().founders_json.insert(startup_id, founders);
    Ok(())
  }

  async fn replace_founders(&self, startup_id: i64, names: Vec<String>) -> Result<usize, MemoryError> {
    let n = names.len();
    self.state.lock().unwrap().founders.insert(startup_id, names);
    Ok(n)
  }

  async fn user_exists(&self, id: i64) -> Result<bool, MemoryError> {
    Ok(self.state.lock().unwrap().rows.contains_key(&(EntityKind::User, id)))
  }

  async fn local_ids(&self, kind: EntityKind) -> Result<Vec<i64>, MemoryError> {
    let state = self.state.lock().unwrap();
    Ok(state.rows.keys().filter(|(k, _)| *k == kind).map(|(_, id)| *id).collect())
  }

  async fn record_trace(&self, trace: NewTrace) -> Result<ImportTrace, MemoryError> {
    if self.fail_traces {
      return Err(MemoryError("trace refused"));
    }
    let mut state = self.state.lock().unwrap();
    state
      .traces
      .retain(|t| !(t.entity_type == trace.entity_type && t.remote_id == trace.remote_id));
    let stored = ImportTrace {
      id:          state.traces.len() as i64 + 1,
      source:      TRACE_SOURCE.to_owned(),
      entity_type: trace.entity_type,
      remote_id:   trace.remote_id,
      local_id:    trace.local_id,
      synced_at:   Utc::now(),
      raw_payload: Some(Value::Object(trace.raw_payload).to_string()),
    };
    state.traces.push(stored.clone());
    Ok(stored)
  }

  async fn list_traces(&self, kind: Option<EntityKind>) -> Result<Vec<ImportTrace>, MemoryError> {
    let state = self.state.lock().unwrap();
    Ok(
      state
        .traces
        .iter()
        .filter(|t| kind.is_none_or(|k| t.entity_type == k))
        .cloned()
        .collect(),
    )
  }

  async fn get_trace(
    &self,
    kind: EntityKind,
    remote_id: String,
  ) -> Result<Option<ImportTrace>, MemoryError> {
    let state = self.state.lock().unwrap();
    Ok(
      state
        .traces
        .iter()
        .find(|t| t.entity_type == kind && t.remote_id == remote_id)
        .cloned(),
    )
  }
}

fn seed_user(store: &MemoryStore, id: i64) {
  let record = json!({"id": id}).as_object().cloned().unwrap();
  let row = map_user(&RemoteId { key: id, text: id.to_string() }, &record);
  store
    .state
    .lock()
    .unwrap()
    .rows
    .insert((EntityKind::User, id), EntityRow::User(row));
}

// ─── Probing ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn probe_stops_at_first_non_404() {
  let (syncer, api) = syncer(&[route("/api/v1/users", ok(json!([])))]).await;

  let probed = syncer.client().probe("users").await.unwrap();
  assert!(probed.url.ends_with("/api/v1/users"));
  assert_eq!(api.hits(), 6);
  assert_eq!(api.paths(), vec![
    "/users/",
    "/users",
    "/api/users/",
    "/api/users",
    "/api/v1/users/",
    "/api/v1/users",
  ]);
}

#[tokio::test]
async fn all_404_fails_the_routine() {
  let (syncer, api) = syncer(&[]).await;

  let result = syncer.sync_users().await;
  assert!(matches!(result, Err(SyncError::AllNotFound)));
  assert_eq!(api.hits(), 8);
}

#[tokio::test]
async fn unreachable_remote_is_reported_as_all_404() {
  let port = {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
  };
  let config = SyncConfig::new(format!("http://127.0.0.1:{port}"), TOKEN);
  let syncer = Syncer::new(Arc::new(MemoryStore::default()), config).unwrap();

  assert!(matches!(syncer.sync_partners().await, Err(SyncError::AllNotFound)));
}

#[tokio::test]
async fn error_status_is_returned_without_further_probing() {
  let (syncer, api) = syncer(&[(
    "/startups/",
    StatusCode::INTERNAL_SERVER_ERROR,
    "boom".to_owned(),
  )])
  .await;

  match syncer.sync_startups().await {
    Err(SyncError::RemoteStatus { status, url }) => {
      assert_eq!(status, 500);
      assert!(url.ends_with("/startups/"));
    }
    other => panic!("expected remote status, got {other:?}"),
  }
  assert_eq!(api.hits(), 1);
}

#[tokio::test]
async fn non_json_body_is_invalid_json() {
  let (syncer, _api) = syncer(&[(
    "/news/",
    StatusCode::OK,
    "<html>maintenance</html>".to_owned(),
  )])
  .await;

  assert!(matches!(syncer.sync_news().await, Err(SyncError::InvalidJson)));
}

// ─── Startups ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn startup_in_data_envelope_is_created_and_traced() {
  let (syncer, api) = syncer(&[route(
    "/startups/",
    ok(json!({"data": [{"id": 7, "name": "Acme"}]})),
  )])
  .await;

  let summary = syncer.sync_startups().await.unwrap();
  assert_eq!(summary.created, 1);
  assert_eq!(summary.updated, 0);
  assert_eq!(summary.errors, 0);
  assert_eq!(summary.total, Some(1));
  assert_eq!(summary.missing_remote, Some(vec![]));

  let Some(EntityRow::Startup(row)) = syncer.store().row(EntityKind::Startup, 7) else {
    panic!("startup 7 not written");
  };
  assert_eq!(row.nom, "Acme");
  assert_eq!(row.name, "Acme");

  let traces = syncer.store().traces();
  assert_eq!(traces.len(), 1);
  assert_eq!(traces[0].remote_id, "7");
  assert_eq!(traces[0].entity_type, EntityKind::Startup);
  assert_eq!(traces[0].entity_type.label(), "startup");
  assert_eq!(traces[0].local_id, 7);

  // One listing call, then every detail path answered 404.
  assert_eq!(api.hits(), 5);
}

#[tokio::test]
async fn sparse_startup_is_enriched_from_detail() {
  let detail = json!({
    "id":          7,
    "name":        "Acme",
    "description": "Long form",
    "founders":    [{"name": "A"}, {"nom": "B"}],
  });
  let (syncer, api) = syncer(&[
    route("/startups/", ok(json!([{"id": 7, "name": "Acme"}]))),
    route("/startups/7/", ok(detail)),
  ])
  .await;

  syncer.sync_startups().await.unwrap();

  let Some(EntityRow::Startup(row)) = syncer.store().row(EntityKind::Startup, 7) else {
    panic!("startup 7 not written");
  };
  assert_eq!(row.description_longue.as_deref(), Some("Long form"));
  assert_eq!(syncer.store().founders(7), vec!["A", "B"]);

  let mirrored = syncer.store().state.lock().unwrap().founders_json.get(&7).cloned();
  assert_eq!(mirrored, Some(json!([{"name": "A"}, {"nom": "B"}])));

  let traces = syncer.store().traces();
  assert!(traces[0].raw_payload.as_deref().unwrap().contains("Long form"));

  // The second detail path answered; the remaining ones were not tried.
  assert_eq!(api.paths(), vec!["/startups/", "/startups/7", "/startups/7/"]);
}

#[tokio::test]
async fn detail_that_is_not_json_moves_to_the_next_url() {
  let (syncer, api) = syncer(&[
    route("/startups/", ok(json!([{"id": 7, "name": "Acme"}]))),
    route("/startups/7", (StatusCode::OK, "<html>".to_owned())),
    route("/startups/7/", ok(json!({"id": 7, "name": "Acme", "description": "From detail"}))),
  ])
  .await;

  let summary = syncer.sync_startups().await.unwrap();
  assert_eq!(summary.created, 1);
  assert_eq!(summary.errors, 0);

  let Some(EntityRow::Startup(row)) = syncer.store().row(EntityKind::Startup, 7) else {
    panic!("startup 7 not written");
  };
  assert_eq!(row.description.as_deref(), Some("From detail"));
  assert_eq!(api.paths(), vec!["/startups/", "/startups/7", "/startups/7/"]);
}

#[tokio::test]
async fn complete_startup_skips_detail() {
  let record = json!({
    "id":               3,
    "name":             "Full",
    "description":      "d",
    "created_at":       "2021-05-01",
    "website_url":      "https://full.test",
    "social_media_url": {"x": "@full"},
    "needs":            ["funding"],
    "founders":         [{"name": "Z"}],
  });
  let (syncer, api) = syncer(&[route("/startups/", ok(json!([record])))]).await;

  syncer.sync_startups().await.unwrap();
  assert_eq!(api.hits(), 1);
  assert_eq!(syncer.store().founders(3), vec!["Z"]);
}

#[tokio::test]
async fn resync_replaces_founders() {
  let store = Arc::new(MemoryStore::default());

  let (first, _api) = syncer_with(Arc::clone(&store), &[route(
    "/startups/",
    ok(json!([{"id": 7, "founders": [{"name": "C"}]}])),
  )])
  .await;
  assert_eq!(first.sync_startups().await.unwrap().created, 1);
  assert_eq!(store.founders(7), vec!["C"]);

  let (second, _api) = syncer_with(Arc::clone(&store), &[route(
    "/startups/",
    ok(json!([{"id": 7, "founders": [{"name": "A"}, {"name": "B"}]}])),
  )])
  .await;
  let summary = second.sync_startups().await.unwrap();
  assert_eq!(summary.created, 0);
  assert_eq!(summary.updated, 1);
  assert_eq!(store.founders(7), vec!["A", "B"]);
  assert_eq!(store.traces().len(), 1);
}

#[tokio::test]
async fn local_startups_missing_remotely_are_reported() {
  let store = Arc::new(MemoryStore::default());
  for id in [1, 2, 3] {
    let record = json!({"id": id}).as_object().cloned().unwrap();
    let remote = RemoteId { key: id, text: id.to_string() };
    let row = jeb_core::mapping::map_startup(&remote, &record, Utc::now()).row;
    store.upsert(EntityRow::Startup(row)).await.unwrap();
  }

  let (syncer, _api) = syncer_with(Arc::clone(&store), &[route(
    "/startups/",
    ok(json!({"results": [{"id": 2, "name": "Still here"}]})),
  )])
  .await;

  let summary = syncer.sync_startups().await.unwrap();
  assert_eq!(summary.updated, 1);
  assert_eq!(summary.missing_remote, Some(vec![1, 3]));
}

// ─── Plain kinds ─────────────────────────────────────────────────────────────

#[test]
fn startups_are_the_only_kind_outside_the_plain_loop() {
  assert_eq!(PlainKind::of(EntityKind::Startup), None);
  for kind in EntityKind::ALL.into_iter().filter(|k| *k != EntityKind::Startup) {
    assert_eq!(PlainKind::of(kind).map(PlainKind::kind), Some(kind));
  }
}

#[tokio::test]
async fn plain_routines_write_their_own_kind() {
  let (syncer, _api) = syncer(&[
    route("/investors/", ok(json!([{"id": 4, "name": "Fund"}]))),
    route("/partners/", ok(json!([{"id": 5, "name": "Ally"}]))),
  ])
  .await;

  assert_eq!(syncer.sync_investors().await.unwrap().created, 1);
  assert_eq!(syncer.sync_partners().await.unwrap().created, 1);
  assert!(matches!(
    syncer.store().row(EntityKind::Investor, 4),
    Some(EntityRow::Investor(_))
  ));
  assert!(matches!(
    syncer.store().row(EntityKind::Partner, 5),
    Some(EntityRow::Partner(_))
  ));

  let kinds: Vec<EntityKind> = syncer.store().traces().iter().map(|t| t.entity_type).collect();
  assert_eq!(kinds, vec![EntityKind::Investor, EntityKind::Partner]);
}

// ─── Record boundary ─────────────────────────────────────────────────────────

#[tokio::test]
async fn records_without_id_are_skipped() {
  let (syncer, _api) = syncer(&[route(
    "/users/",
    ok(json!([{"name": "no id"}, 5, "x", {"id": 1, "email": "a@b.c"}, {"pk": "2"}])),
  )])
  .await;

  let summary = syncer.sync_users().await.unwrap();
  assert_eq!(summary.created, 2);
  assert_eq!(summary.updated, 0);
  assert_eq!(summary.errors, 0);
  assert_eq!(summary.total, None);
  assert!(syncer.store().row(EntityKind::User, 2).is_some());
}

#[tokio::test]
async fn unusable_id_counts_as_error() {
  let (syncer, _api) = syncer(&[route("/events/", ok(json!([{"id": "abc"}, {"id": 3}])))]).await;

  let summary = syncer.sync_events().await.unwrap();
  assert_eq!(summary.created, 1);
  assert_eq!(summary.errors, 1);
}

#[tokio::test]
async fn store_failure_skips_only_that_record() {
  let store = Arc::new(MemoryStore { fail_upsert_for: Some(2), ..MemoryStore::default() });
  let (syncer, _api) = syncer_with(Arc::clone(&store), &[route(
    "/investors/",
    ok(json!([{"id": 1}, {"id": 2}, {"id": 3}])),
  )])
  .await;

  let summary = syncer.sync_investors().await.unwrap();
  assert_eq!(summary.created, 2);
  assert_eq!(summary.errors, 1);
  assert_eq!(store.traces().len(), 2);
}

#[tokio::test]
async fn trace_failure_does_not_fail_the_record() {
  let store = Arc::new(MemoryStore { fail_traces: true, ..MemoryStore::default() });
  let (syncer, _api) =
    syncer_with(Arc::clone(&store), &[route("/partners/", ok(json!([{"id": 1}])))]).await;

  let summary = syncer.sync_partners().await.unwrap();
  assert_eq!(summary.created, 1);
  assert_eq!(summary.errors, 0);
}

// ─── References ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn news_author_resolves_only_to_known_users() {
  let store = Arc::new(MemoryStore::default());
  seed_user(&store, 5);

  let (syncer, _api) = syncer_with(Arc::clone(&store), &[route(
    "/news/",
    ok(json!([
      {"id": 1, "title": "Known", "author_id": 5},
      {"id": 2, "title": "Unknown", "auteur": 99},
    ])),
  )])
  .await;

  assert_eq!(syncer.sync_news().await.unwrap().created, 2);

  let Some(EntityRow::News(known)) = store.row(EntityKind::News, 1) else { panic!() };
  assert_eq!(known.auteur_id, Some(5));
  let Some(EntityRow::News(unknown)) = store.row(EntityKind::News, 2) else { panic!() };
  assert_eq!(unknown.auteur_id, None);
}

#[tokio::test]
async fn event_organizer_accepts_numeric_strings() {
  let store = Arc::new(MemoryStore::default());
  seed_user(&store, 5);

  let (syncer, _api) = syncer_with(Arc::clone(&store), &[route(
    "/events/",
    ok(json!([{"id": 4, "title": "Demo day", "organizer_id": "5", "attendees": "40"}])),
  )])
  .await;

  syncer.sync_events().await.unwrap();
  let Some(EntityRow::Event(event)) = store.row(EntityKind::Event, 4) else { panic!() };
  assert_eq!(event.organisateur_id, Some(5));
  assert_eq!(event.nb_inscrits, 40);
  assert_eq!(event.kind, "general");
}

// ─── Orchestrator ────────────────────────────────────────────────────────────

#[tokio::test]
async fn sync_all_isolates_an_unreachable_entity() {
  let (syncer, _api) = syncer(&[
    route("/users/", ok(json!([{"id": 1}]))),
    route("/investors/", ok(json!([]))),
    route("/partners/", ok(json!([]))),
    route("/news/", ok(json!([]))),
    route("/events/", ok(json!([]))),
  ])
  .await;

  let report = syncer.sync_all().await;
  assert!(!report.all_ok());
  let order: Vec<EntityKind> = report.entities.iter().map(|(k, _)| *k).collect();
  assert_eq!(order, EntityKind::ALL.to_vec());
  assert_eq!(report.failed().collect::<Vec<_>>(), vec![EntityKind::Startup]);
  assert_eq!(report.get(EntityKind::User).and_then(|r| r.summary()).map(|s| s.created), Some(1));

  let value = serde_json::to_value(&report).unwrap();
  assert_eq!(value["startups"], json!({"ok": false, "error": "all_404"}));
  assert_eq!(value["users"], json!({"ok": true, "created": 1, "updated": 0, "errors": 0}));
  assert_eq!(value["events"]["ok"], json!(true));
}

#[tokio::test]
async fn sync_all_succeeds_when_every_entity_does() {
  let (syncer, _api) = syncer(&[
    route("/startups", ok(json!([]))),
    route("/users", ok(json!([]))),
    route("/investors", ok(json!([]))),
    route("/partners", ok(json!([]))),
    route("/news", ok(json!([]))),
    route("/events", ok(json!([]))),
  ])
  .await;

  let report = syncer.sync_all().await;
  assert!(report.all_ok());
  let value = serde_json::to_value(&report).unwrap();
  assert_eq!(
    value["startups"],
    json!({"ok": true, "created": 0, "updated": 0, "errors": 0, "total": 0, "missing_remote": []})
  );
}
