#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/stellar-journal/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Core traits and types for the stellar journal.
//!
//! This crate provides the foundational abstractions shared by the ingestion
//! worker, the store backends, and the read API:
//!
//! - [`ApodRecord`](record::ApodRecord) - The daily record, keyed by date
//! - [`RecordSource`](source::RecordSource) - Fetches today's record
//! - [`JournalWriter`](store::JournalWriter) - Idempotent, append-only inserts
//! - [`JournalReader`](store::JournalReader) - Point and full-history queries
//! - [`JournalError`](error::JournalError) - Shared error taxonomy

/// Error types for journal operations.
pub mod error;
/// Record types.
pub mod record;
/// Record source trait.
pub mod source;
/// Store traits and write outcomes.
pub mod store;

// Re-export commonly used items at crate root
pub use error::{JournalError, Result};
pub use record::{ApodRecord, MediaKind};
pub use source::RecordSource;
pub use store::{InsertOutcome, JournalReader, JournalWriter};
