//! Free-text venue resolution against a canonical alias table.

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

/// Signature bucket for records with no recognizable venue at all.
///
/// Records missing a venue must still hash to a stable, distinct
/// bucket instead of colliding with canonical venues.
pub const UNKNOWN_LOCATION: &str = "unknown-location";

static PUNCTUATION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\w\s,-]").unwrap());
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// One canonical venue identity with its registered alias substrings.
#[derive(Debug, Clone, Deserialize)]
pub struct VenueEntry {
    pub id: String,
    #[serde(default)]
    pub aliases: Vec<String>,
}

impl VenueEntry {
    /// Substring match against the canonical name (the id with hyphens
    /// as spaces) or any registered alias.
    fn matches(&self, normalized: &str) -> bool {
        let canonical_name = self.id.replace('-', " ");
        normalized.contains(canonical_name.as_str())
            || self.aliases.iter().any(|alias| normalized.contains(alias.as_str()))
    }
}

/// Static venue alias table, loaded once at startup and immutable
/// afterwards. Backed by a `Vec` so iteration order is the declaration
/// order: resolution is deterministic and first-match-wins.
#[derive(Debug, Clone, Default)]
pub struct VenueTable {
    entries: Vec<VenueEntry>,
}

/// Outcome of resolving a free-text venue string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VenueResolution {
    /// Matched a canonical venue identity.
    Canonical(String),
    /// No alias matched; the normalized input itself is the bucket.
    Unmatched(String),
    /// Input was missing or normalized to nothing.
    Unknown,
}

impl VenueResolution {
    /// The signature component for this resolution. Never empty.
    pub fn key(&self) -> &str {
        match self {
            VenueResolution::Canonical(id) => id,
            VenueResolution::Unmatched(text) => text,
            VenueResolution::Unknown => UNKNOWN_LOCATION,
        }
    }

    pub fn is_canonical(&self) -> bool {
        matches!(self, VenueResolution::Canonical(_))
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, VenueResolution::Unknown)
    }
}

impl VenueTable {
    pub fn new(entries: Vec<VenueEntry>) -> Self {
        VenueTable { entries }
    }

    /// Whether `id` is one of the table's canonical identities.
    pub fn is_canonical(&self, id: &str) -> bool {
        self.entries.iter().any(|entry| entry.id == id)
    }

    /// Map a free-text venue string to a canonical identity.
    ///
    /// The input is normalized (lowercased, punctuation stripped except
    /// hyphens and commas, whitespace collapsed), then each table entry
    /// is tested in order for a substring match. Unmatched input falls
    /// back to its own normalized text; empty input falls back to the
    /// unknown-location sentinel.
    pub fn resolve(&self, raw: Option<&str>) -> VenueResolution {
        let Some(raw) = raw else {
            return VenueResolution::Unknown;
        };

        let normalized = normalize(raw);
        if normalized.is_empty() {
            return VenueResolution::Unknown;
        }

        for entry in &self.entries {
            if entry.matches(&normalized) {
                return VenueResolution::Canonical(entry.id.clone());
            }
        }

        VenueResolution::Unmatched(normalized)
    }
}

fn normalize(raw: &str) -> String {
    let lowered = raw.to_lowercase();
    let stripped = PUNCTUATION.replace_all(&lowered, "");
    WHITESPACE.replace_all(stripped.trim(), " ").into_owned()
}
