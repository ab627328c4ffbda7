//! Record source trait.
//!
//! A [`RecordSource`] fetches today's record from an external API. The ingestion
//! worker treats every error it returns as transient.

use async_trait::async_trait;
use std::fmt::Debug;

use crate::{error::Result, record::ApodRecord};

/// Source of daily astronomy records.
#[async_trait]
pub trait RecordSource: Send + Sync + Debug {
    /// Returns the name of this source (e.g., "NASA APOD").
    fn name(&self) -> &str;

    /// Fetches the record the source currently publishes as "today".
    ///
    /// Fails on transport errors, non-success responses, and payloads that do not
    /// decode into an [`ApodRecord`].
    async fn fetch_today(&self) -> Result<ApodRecord>;
}
