//! Core types and trait definitions for the JEB import subsystem.
//!
//! This crate is deliberately free of HTTP and database dependencies. It
//! owns the shape-tolerant payload handling (normalisation and field
//! mapping) and the [`store::SyncStore`] abstraction the sync routines write
//! through.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod entity;
pub mod error;
pub mod mapping;
pub mod payload;
pub mod store;
pub mod summary;
pub mod trace;

pub use error::{Error, Result};
