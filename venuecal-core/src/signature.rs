//! Weak and strong identity signatures for event records.
//!
//! The weak signature (normalized title + calendar date) groups records
//! that plausibly describe the same occasion; the strong signature adds
//! the resolved venue and is the identity the engine merges on.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

use crate::venue::VenueResolution;

/// Fixed noise vocabulary stripped from titles before comparison:
/// tour/series qualifiers and festival/competition tags that vary
/// between sources describing the same event.
static NOISE_TOKENS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(live|world tour|tour|concerto|concert|evento|event|show|i-days milano|stadi \d{4})\b",
    )
    .unwrap()
});

/// Parenthetical "(data N)" / "(date N)" suffixes used by curated
/// listings to number multiple dates of the same run.
static DATE_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\((?:data|date) \d+(?: - ipotizzata)?\)").unwrap());

/// Bracketed competition codes, e.g. "[UCL]".
static BRACKETED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[[^\]]*\]").unwrap());

static PUNCTUATION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\w\s-]").unwrap());
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Two-party separators: "versus"-style words or a standalone hyphen.
/// Fixture feeds do not order home/away consistently, so two-party
/// titles are sorted to make "A vs B" and "B vs A" equivalent.
static TWO_PARTY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s+(?:vs\.?|versus|v)\s+|\s+-\s+").unwrap());

/// Identity key from normalized title and calendar date only.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WeakSignature {
    pub title: String,
    pub date: NaiveDate,
}

/// Weak signature plus canonical venue: records sharing this denote the
/// same real-world event.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StrongSignature {
    pub weak: WeakSignature,
    pub venue: String,
}

/// Build the (weak, strong) signature pair for a record.
pub fn build(
    title: &str,
    date: NaiveDate,
    venue: &VenueResolution,
) -> (WeakSignature, StrongSignature) {
    let weak = WeakSignature {
        title: normalize_title(title),
        date,
    };
    let strong = StrongSignature {
        weak: weak.clone(),
        venue: venue.key().to_string(),
    };
    (weak, strong)
}

/// Normalize a title for signature comparison.
pub fn normalize_title(raw: &str) -> String {
    let lowered = raw.to_lowercase();
    let stripped = DATE_SUFFIX.replace_all(&lowered, "");
    let stripped = BRACKETED.replace_all(&stripped, "");
    let stripped = NOISE_TOKENS.replace_all(&stripped, "");
    let stripped = PUNCTUATION.replace_all(&stripped, "");
    let collapsed = WHITESPACE
        .replace_all(stripped.trim(), " ")
        .into_owned();

    sort_two_party(&collapsed)
}

/// Sort the parts of a two-party title lexicographically and rejoin
/// them, so the separator order carries no identity.
fn sort_two_party(title: &str) -> String {
    let mut parts: Vec<&str> = TWO_PARTY
        .split(title)
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect();

    if parts.len() < 2 {
        return title.to_string();
    }

    parts.sort_unstable();
    parts.join(" - ")
}
