//! Core engine for the venuecal ecosystem.
//!
//! Reconciles event records that describe the same real-world happening
//! (a concert, match, or race) when the records arrive from multiple
//! inconsistent sources: manually curated listings and machine-fetched
//! calendar feeds.
//!
//! Raw records flow through the signature builder into the
//! deduplication engine, which accumulates canonical records and
//! resolves provenance-based field conflicts:
//! - `temporal` parses timestamps into timezone-aware instants
//! - `venue` maps free-text venue strings to canonical identities
//! - `signature` derives weak/strong identity keys
//! - `dedup` groups records by signature and merges groups
//! - `ics` is the boundary to the iCalendar wire format

pub mod config;
pub mod dedup;
pub mod error;
pub mod ics;
pub mod record;
pub mod signature;
pub mod temporal;
pub mod venue;

pub use dedup::{DedupEngine, IngestOutcome, IngestStats};
pub use error::{VenuecalError, VenuecalResult};
pub use record::{EventRecord, Provenance, RawRecord, TimeSpec};
