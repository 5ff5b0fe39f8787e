//! Remote side of the JEB importer.
//!
//! [`Syncer`] owns an [`ApiClient`] and a [`jeb_core::store::SyncStore`]. Its
//! routines probe the remote listing for one entity kind, normalise and map
//! each record, write it through the store and record an import trace.
//! [`Syncer::sync_all`] runs every routine and gathers a [`SyncReport`].

pub mod client;
pub mod config;
pub mod error;
mod orchestrator;
pub mod report;
mod routine;

pub use client::ApiClient;
pub use config::SyncConfig;
pub use error::{RecordError, Result, SyncError};
pub use report::{EntityReport, SyncReport};
pub use routine::Syncer;

#[cfg(test)]
mod tests;
