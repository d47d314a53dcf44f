//! Source-neutral event record types.
//!
//! `RawRecord` is what a source hands to the engine: unvalidated, with
//! times still in source form. `EventRecord` is the canonical entity
//! the engine accumulates and emits.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{VenuecalError, VenuecalResult};

/// Which collaborator produced a record.
///
/// Governs two load-bearing policies: how naive timestamps are
/// interpreted (curated data is authored in local time, feed data is
/// assumed UTC-normalized) and how merge conflicts are broken.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    /// Manually curated listing.
    #[default]
    Curated,
    /// Machine-fetched calendar feed.
    Feed,
}

/// A start/end time as it arrives from a source: either literal text in
/// the fixed `YYYY-MM-DDTHH:MM:SS` format, or an instant that already
/// carried explicit timezone information on the wire.
///
/// Untagged so that plain strings in JSON data files deserialize as
/// `Text`; the `Instant` variant is only produced by the feed parser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TimeSpec {
    Text(String),
    Instant(DateTime<Utc>),
}

/// A raw source item before validation.
///
/// `start` may be missing or malformed; the engine rejects such records
/// at ingestion and the run continues.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawRecord {
    pub summary: String,
    #[serde(default)]
    pub start: Option<TimeSpec>,
    #[serde(default)]
    pub end: Option<TimeSpec>,
    #[serde(default)]
    pub venue_name: Option<String>,
    #[serde(default)]
    pub venue_address: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub external_link: Option<String>,
    #[serde(default)]
    pub provenance: Provenance,
    /// Original feed identifier. Retained, never used for identity.
    #[serde(default)]
    pub source_id: Option<String>,
}

impl RawRecord {
    /// Deserialize a JSON array of raw records (one source file).
    pub fn list_from_json(content: &str) -> VenuecalResult<Vec<RawRecord>> {
        serde_json::from_str(content).map_err(|e| VenuecalError::Serialization(e.to_string()))
    }
}

/// A canonical event record: the single surviving representation of a
/// merged group. Always carries a valid, timezone-aware start.
#[derive(Debug, Clone)]
pub struct EventRecord {
    pub title: String,
    pub start: DateTime<Tz>,
    pub end: Option<DateTime<Tz>>,
    pub venue_name: Option<String>,
    pub venue_address: Option<String>,
    pub description: Option<String>,
    pub external_link: Option<String>,
    pub provenance: Provenance,
    pub source_id: Option<String>,
}
