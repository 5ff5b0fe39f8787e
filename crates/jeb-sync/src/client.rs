//! HTTP side of the importer: endpoint probing, listing and startup detail
//! fetches.

use std::sync::Arc;

use jeb_core::{mapping::Record, payload};
use reqwest::{Certificate, Client, Response, StatusCode};
use serde_json::Value;

use crate::{Result, SyncConfig, SyncError};

/// Header carrying the group token on every remote call.
pub const AUTH_HEADER: &str = "X-Group-Authorization";

/// The response a probe settled on.
#[derive(Debug)]
pub struct Probed {
  pub response: Response,
  pub url:      String,
}

/// Async client for the remote JEB API.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct ApiClient {
  client: Client,
  config: Arc<SyncConfig>,
}

impl ApiClient {
  pub fn new(config: SyncConfig) -> Result<Self> {
    let mut builder = Client::builder();
    if let Some(path) = &config.ca_bundle {
      let pem = std::fs::read(path).map_err(|source| SyncError::CaBundle {
        path: path.clone(),
        source,
      })?;
      for cert in Certificate::from_pem_bundle(&pem)? {
        builder = builder.add_root_certificate(cert);
      }
    }
    let client = builder.build()?;
    Ok(Self { client, config: Arc::new(config) })
  }

  fn get(&self, url: &str) -> reqwest::RequestBuilder {
    self.client.get(url).header(AUTH_HEADER, &self.config.api_token)
  }

  // ── Listing ───────────────────────────────────────────────────────────────

  /// Try each candidate URL for `resource` in order and keep the first
  /// response that is not a 404. Network errors also move on to the next
  /// candidate.
  pub async fn probe(&self, resource: &str) -> Result<Probed> {
    for url in self.config.candidate_urls(resource) {
      tracing::info!(%url, "probing {resource}");
      let response = match self.get(&url).timeout(self.config.list_timeout()).send().await {
        Ok(response) => response,
        Err(e) => {
          tracing::warn!(%url, "request failed: {e}");
          continue;
        }
      };
      if response.status() == StatusCode::NOT_FOUND {
        continue;
      }
      return Ok(Probed { response, url });
    }
    tracing::error!("every candidate for {resource} answered 404 or failed");
    Err(SyncError::AllNotFound)
  }

  /// Probe `resource`, check the status and decode the body into candidate
  /// records.
  pub async fn fetch_list(&self, resource: &str) -> Result<Vec<Value>> {
    let Probed { response, url } = self.probe(resource).await?;

    let status = response.status();
    if status.as_u16() >= 400 {
      let body = response.text().await.unwrap_or_default();
      tracing::error!(%url, %status, "remote error: {}", preview(&body, 300));
      return Err(SyncError::RemoteStatus { status: status.as_u16(), url });
    }

    let body = response.bytes().await?;
    let raw: Value = serde_json::from_slice(&body).map_err(|_| {
      tracing::error!(%url, "response is not JSON: {}", preview(&String::from_utf8_lossy(&body), 200));
      SyncError::InvalidJson
    })?;

    let items = payload::normalize(raw);
    tracing::info!(%url, "{} {resource} item(s) received", items.len());
    Ok(items)
  }

  // ── Startup detail ────────────────────────────────────────────────────────

  /// Best-effort fetch of one startup's detail record.
  ///
  /// The first `200` answer with a JSON body ends the search; its first
  /// normalised record is used, or the body itself when it is an object.
  /// Anything else moves on to the next detail URL. `None` means the list
  /// record should be kept as it is.
  pub async fn fetch_detail(&self, remote_id: &str) -> Option<Record> {
    for url in self.config.detail_urls(remote_id) {
      tracing::info!(%url, "fetching detail for startup {remote_id}");
      let response = match self.get(&url).timeout(self.config.detail_timeout()).send().await {
        Ok(response) => response,
        Err(e) => {
          tracing::warn!(%url, "detail request failed: {e}");
          continue;
        }
      };
      if response.status() != StatusCode::OK {
        continue;
      }
      let raw: Value = match response.json().await {
        Ok(raw) => raw,
        Err(e) => {
          tracing::warn!(%url, "detail for startup {remote_id} is not JSON: {e}");
          continue;
        }
      };

      let first = payload::normalize(raw.clone()).into_iter().next();
      return match (first, raw) {
        (Some(Value::Object(record)), _) => Some(record),
        (_, Value::Object(record)) => Some(record),
        _ => None,
      };
    }
    None
  }
}

fn preview(text: &str, max_chars: usize) -> &str {
  match text.char_indices().nth(max_chars) {
    Some((idx, _)) => &text[..idx],
    None => text,
  }
}
