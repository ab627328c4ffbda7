//! Core data types for journal records.
//!
//! - [`ApodRecord`] - One Astronomy Picture of the Day entry, keyed by calendar date
//! - [`MediaKind`] - Whether the entry is an image, a video, or something else

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::JournalError;

/// Kind of media an entry points to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    /// A still image.
    #[default]
    Image,
    /// An embedded video.
    Video,
    /// Anything else the source publishes (interactive pages, animations).
    Other,
}

impl MediaKind {
    /// Returns the wire/storage name of this media kind.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaKind {
    type Err = JournalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "image" => Ok(Self::Image),
            "video" => Ok(Self::Video),
            "other" => Ok(Self::Other),
            _ => Err(JournalError::Parse(format!("Invalid media type: {s}"))),
        }
    }
}

/// A daily astronomy record.
///
/// The `date` is the natural key: at most one record per date is ever stored.
/// Field names serialize with the source's JSON names (`hdurl`, `media_type`).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApodRecord {
    /// Calendar date the entry was published for.
    pub date: NaiveDate,
    /// Entry title.
    pub title: String,
    /// Long-form explanation.
    pub explanation: String,
    /// Image or video URL.
    pub url: String,
    /// High resolution image URL, when published.
    #[serde(rename = "hdurl", default, skip_serializing_if = "Option::is_none")]
    pub hd_url: Option<String>,
    /// Attribution string; absent for public-domain entries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub copyright: Option<String>,
    /// Kind of media behind `url`.
    pub media_type: MediaKind,
    /// Schema version reported by the source.
    pub service_version: String,
}

impl ApodRecord {
    /// Creates a new record with required fields.
    #[must_use]
    pub fn new(
        date: NaiveDate,
        title: impl Into<String>,
        explanation: impl Into<String>,
        url: impl Into<String>,
        media_type: MediaKind,
        service_version: impl Into<String>,
    ) -> Self {
        Self {
            date,
            title: title.into(),
            explanation: explanation.into(),
            url: url.into(),
            hd_url: None,
            copyright: None,
            media_type,
            service_version: service_version.into(),
        }
    }

    /// Sets the high resolution URL.
    #[must_use]
    pub fn with_hd_url(mut self, hd_url: impl Into<String>) -> Self {
        self.hd_url = Some(hd_url.into());
        self
    }

    /// Sets the copyright attribution.
    #[must_use]
    pub fn with_copyright(mut self, copyright: impl Into<String>) -> Self {
        self.copyright = Some(copyright.into());
        self
    }
}
