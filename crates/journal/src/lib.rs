#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/stellar-journal/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Ingestion worker and read API for the stellar journal.
//!
//! This crate ties the journal together. It re-exports the core types, the
//! store implementations and the NASA record source, and adds:
//!
//! - [`IngestionWorker`] - Polls the source and writes each day's record once
//! - [`PollPolicy`] - Decides how long the worker sleeps after each outcome
//! - [`api`] - The read-only HTTP API over the journal
//! - [`config`] - YAML plus environment configuration
//! - [`telemetry`] - Logging setup
//!
//! # Features
//!
//! - `sqlite` - SQLite-backed store (default, required by the `stellar-journal` binary)
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use journal::{IngestionWorker, NasaApodSource, PollPolicy, SqliteStore, api};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let store = Arc::new(SqliteStore::new("journal.db")?);
//!     let source = Arc::new(NasaApodSource::new("DEMO_KEY"));
//!     let shutdown = CancellationToken::new();
//!
//!     let worker = IngestionWorker::new(source, store.clone(), PollPolicy::default());
//!     tokio::spawn(worker.run(shutdown.child_token()));
//!
//!     let listener = tokio::net::TcpListener::bind("localhost:8080").await?;
//!     let app = api::router(store, std::time::Duration::from_secs(4));
//!     api::serve(listener, app, shutdown).await?;
//!     Ok(())
//! }
//! ```

// Core types and traits
pub use journal_core::*;

// Store implementations
#[cfg(feature = "sqlite")]
pub use journal_store::SqliteStore;
pub use journal_store::InMemoryStore;

// Record source
pub use journal_nasa::NasaApodSource;

pub mod api;
pub mod config;
/// Wait-time policy for the ingestion worker.
pub mod policy;
pub mod telemetry;
/// The ingestion worker.
pub mod worker;

pub use config::{AppConfig, ConfigError, Environment};
pub use policy::PollPolicy;
pub use worker::{CycleOutcome, CycleReport, IngestionWorker, WorkerState};
