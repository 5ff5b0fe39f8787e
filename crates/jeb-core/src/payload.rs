//! Response normalisation.
//!
//! The remote API answers with a bare list, a pagination envelope
//! (`{"results": [...]}` or `{"data": [...]}`), a single object, or any of
//! those encoded a second time as a JSON string. [`normalize`] reduces all of
//! them to a flat list of candidate records. Nothing here fails: an unusable
//! payload yields an empty list and a log line.
//!
//! List elements are returned as-is; callers skip non-object entries.

use serde_json::Value;

/// Keys whose presence marks a bare object as a single record.
const RECORD_MARKERS: [&str; 3] = ["id", "nom", "name"];

// ─── Shape ───────────────────────────────────────────────────────────────────

/// The envelope key a record list was found under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeKey {
  Results,
  Data,
}

impl EnvelopeKey {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Results => "results",
      Self::Data => "data",
    }
  }
}

/// How a decoded payload carries its records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadShape {
  /// A bare JSON array.
  List,
  /// An object wrapping the array under `results` (checked first) or `data`.
  Envelope(EnvelopeKey),
  /// An object that is itself one record.
  SingleObject,
  /// Anything else, including strings that still need decoding.
  Unparseable,
}

/// Classify an already-decoded JSON value.
pub fn classify(value: &Value) -> PayloadShape {
  match value {
    Value::Array(_) => PayloadShape::List,
    Value::Object(map) => {
      for key in [EnvelopeKey::Results, EnvelopeKey::Data] {
        if map.get(key.as_str()).is_some_and(Value::is_array) {
          return PayloadShape::Envelope(key);
        }
      }
      if RECORD_MARKERS.iter().any(|k| map.contains_key(*k)) {
        PayloadShape::SingleObject
      } else {
        PayloadShape::Unparseable
      }
    }
    _ => PayloadShape::Unparseable,
  }
}

// ─── Normalisation ───────────────────────────────────────────────────────────

/// Reduce a decoded payload to its candidate records.
///
/// A JSON string is decoded once more and the result classified; a string
/// that decodes to yet another string is not unwrapped further.
pub fn normalize(payload: Value) -> Vec<Value> {
  match payload {
    Value::Null => Vec::new(),
    Value::String(text) => normalize_str(&text),
    other => extract(other),
  }
}

/// Normalise a payload that arrived as text.
pub fn normalize_str(text: &str) -> Vec<Value> {
  match serde_json::from_str::<Value>(text) {
    Ok(decoded) => extract(decoded),
    Err(e) => {
      tracing::warn!("payload string is not JSON, ignoring: {e}");
      Vec::new()
    }
  }
}

/// Normalise a payload that arrived as raw bytes.
pub fn normalize_bytes(bytes: &[u8]) -> Vec<Value> {
  match std::str::from_utf8(bytes) {
    Ok(text) => normalize_str(text),
    Err(e) => {
      tracing::warn!("payload bytes are not UTF-8, ignoring: {e}");
      Vec::new()
    }
  }
}

fn extract(value: Value) -> Vec<Value> {
  match (classify(&value), value) {
    (PayloadShape::List, Value::Array(items)) => items,
    (PayloadShape::Envelope(key), Value::Object(mut map)) => {
      match map.remove(key.as_str()) {
        Some(Value::Array(items)) => items,
        _ => Vec::new(),
      }
    }
    (PayloadShape::SingleObject, object) => vec![object],
    _ => Vec::new(),
  }
}
