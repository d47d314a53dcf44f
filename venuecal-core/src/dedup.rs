//! The deduplication engine.
//!
//! Groups incoming records by strong signature, merges groups into
//! canonical records, and resolves provenance-based field conflicts.
//! Single-threaded and synchronous: records are ingested one at a time
//! in source order, and merge decisions depend on the accumulated state
//! built from previously ingested records.

use std::collections::HashMap;

use chrono_tz::Tz;

use crate::record::{EventRecord, Provenance, RawRecord};
use crate::signature::{self, StrongSignature, WeakSignature};
use crate::temporal::Normalizer;
use crate::venue::VenueTable;

/// Delimiter between differing descriptions folded into one record.
const DESCRIPTION_DELIMITER: &str = "\n---\n";

/// What happened to a single ingested record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    /// New canonical record.
    Inserted,
    /// Folded into an existing record with the same strong signature.
    Merged,
    /// Feed record without a venue folded (temporally only) into a
    /// curated record with a resolved venue on the same title and date.
    Reconciled,
    /// Start time missing or malformed; record dropped.
    Rejected,
}

/// Running counters for one ingestion pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestStats {
    pub inserted: usize,
    pub merged: usize,
    pub reconciled: usize,
    pub rejected: usize,
}

/// Stateful accumulator of canonical event records.
///
/// There is no fatal error path inside the engine: the worst outcome of
/// dirty input is an empty canonical set.
pub struct DedupEngine {
    normalizer: Normalizer,
    venues: VenueTable,
    canonical: HashMap<StrongSignature, EventRecord>,
    /// Weak-match index: weak signature -> the strong signature most
    /// recently associated with it.
    weak_index: HashMap<WeakSignature, StrongSignature>,
    /// First-insertion order of strong signatures, for deterministic
    /// output.
    order: Vec<StrongSignature>,
    stats: IngestStats,
}

impl DedupEngine {
    pub fn new(tz: Tz, venues: VenueTable) -> Self {
        DedupEngine {
            normalizer: Normalizer::new(tz),
            venues,
            canonical: HashMap::new(),
            weak_index: HashMap::new(),
            order: Vec::new(),
            stats: IngestStats::default(),
        }
    }

    /// Ingest one raw record.
    ///
    /// A record without a parseable start is rejected; everything else
    /// either becomes a new canonical record or is folded into an
    /// existing one.
    pub fn ingest(&mut self, raw: RawRecord) -> IngestOutcome {
        let Some(start_spec) = raw.start.as_ref() else {
            self.stats.rejected += 1;
            return IngestOutcome::Rejected;
        };
        let start = match self.normalizer.resolve(start_spec, raw.provenance) {
            Ok(dt) => dt,
            Err(_) => {
                self.stats.rejected += 1;
                return IngestOutcome::Rejected;
            }
        };
        // A malformed end drops the end, not the record.
        let end = raw
            .end
            .as_ref()
            .and_then(|t| self.normalizer.resolve(t, raw.provenance).ok());

        let resolution = self.venues.resolve(raw.venue_name.as_deref());
        let (weak, strong) = signature::build(&raw.summary, start.date_naive(), &resolution);

        let incoming = EventRecord {
            title: raw.summary,
            start,
            end,
            venue_name: raw.venue_name,
            venue_address: raw.venue_address,
            description: raw.description,
            external_link: raw.external_link,
            provenance: raw.provenance,
            source_id: raw.source_id,
        };

        // Exact strong match: the same real-world event.
        if let Some(existing) = self.canonical.get_mut(&strong) {
            merge_into(existing, incoming);
            self.stats.merged += 1;
            return IngestOutcome::Merged;
        }

        // Weak match with a different venue resolution. A venue-less
        // feed record is folded into a curated, venue-resolved record
        // for the same title and date; anything else is a genuinely
        // distinct event and stays apart.
        if let Some(existing_strong) = self.weak_index.get(&weak).cloned() {
            if incoming.provenance == Provenance::Feed
                && resolution.is_unknown()
                && self.venues.is_canonical(&existing_strong.venue)
            {
                if let Some(existing) = self.canonical.get_mut(&existing_strong) {
                    if existing.provenance != Provenance::Feed {
                        reconcile_times(existing, &incoming);
                        self.stats.reconciled += 1;
                        return IngestOutcome::Reconciled;
                    }
                }
            }
        }

        // The weak index tracks the newest strong signature for a key.
        self.weak_index.insert(weak, strong.clone());
        self.order.push(strong.clone());
        self.canonical.insert(strong, incoming);
        self.stats.inserted += 1;
        IngestOutcome::Inserted
    }

    pub fn stats(&self) -> IngestStats {
        self.stats
    }

    pub fn len(&self) -> usize {
        self.canonical.len()
    }

    pub fn is_empty(&self) -> bool {
        self.canonical.is_empty()
    }

    /// Drain the canonical set in first-insertion order.
    pub fn into_records(mut self) -> Vec<EventRecord> {
        self.order
            .iter()
            .filter_map(|sig| self.canonical.remove(sig))
            .collect()
    }
}

/// Fold `incoming` into `existing` per the field merge policy. The
/// surviving record keeps its title, venue name and provenance.
fn merge_into(existing: &mut EventRecord, incoming: EventRecord) {
    reconcile_times(existing, &incoming);

    if let Some(new_desc) = incoming.description {
        let new_desc = new_desc.trim();
        if !new_desc.is_empty() {
            match &mut existing.description {
                // An empty existing description counts as absent and is
                // replaced, not concatenated onto.
                Some(current) if !current.trim().is_empty() => {
                    // Append-only: differing text is never discarded.
                    if current.trim().to_lowercase() != new_desc.to_lowercase() {
                        current.push_str(DESCRIPTION_DELIMITER);
                        current.push_str(new_desc);
                    }
                }
                _ => existing.description = Some(new_desc.to_string()),
            }
        }
    }

    // Fill-in-if-missing: a record missing these never overwrites one
    // that has them.
    if existing.external_link.is_none() {
        existing.external_link = incoming.external_link;
    }
    if existing.venue_address.is_none() {
        existing.venue_address = incoming.venue_address;
    }
}

/// Temporal reconciliation: the earliest known start wins, the latest
/// end wins, and a present end never gives way to an absent one.
fn reconcile_times(existing: &mut EventRecord, incoming: &EventRecord) {
    if incoming.start < existing.start {
        existing.start = incoming.start;
    }
    match (existing.end, incoming.end) {
        (Some(current), Some(new)) if new > current => existing.end = Some(new),
        (None, Some(new)) => existing.end = Some(new),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::TimeSpec;
    use crate::venue::VenueEntry;
    use chrono_tz::Europe::Rome;

    fn engine() -> DedupEngine {
        let venues = VenueTable::new(vec![VenueEntry {
            id: "main-stadium".to_string(),
            aliases: vec!["main stadium".to_string(), "the big arena".to_string()],
        }]);
        DedupEngine::new(Rome, venues)
    }

    fn curated(summary: &str, start: &str, venue: Option<&str>) -> RawRecord {
        RawRecord {
            summary: summary.to_string(),
            start: Some(TimeSpec::Text(start.to_string())),
            venue_name: venue.map(str::to_string),
            ..RawRecord::default()
        }
    }

    fn feed(summary: &str, start: &str, venue: Option<&str>) -> RawRecord {
        RawRecord {
            provenance: Provenance::Feed,
            source_id: Some("feed-uid-1".to_string()),
            ..curated(summary, start, venue)
        }
    }

    #[test]
    fn test_records_without_a_parseable_start_are_rejected() {
        let mut engine = engine();

        let mut missing = curated("Concert X", "", None);
        missing.start = None;
        assert_eq!(engine.ingest(missing), IngestOutcome::Rejected);

        let malformed = curated("Concert X", "next tuesday", None);
        assert_eq!(engine.ingest(malformed), IngestOutcome::Rejected);

        assert!(engine.is_empty());
        assert_eq!(engine.stats().rejected, 2);
    }

    #[test]
    fn test_same_strong_signature_merges_earlier_start_wins() {
        // Curated record, then a feed variant of the same concert with
        // a noisier title and a later call time.
        let mut engine = engine();

        let a = curated("Concert X", "2025-06-10T21:00:00", Some("Main Stadium"));
        assert_eq!(engine.ingest(a), IngestOutcome::Inserted);

        // 21:15 naive feed time is UTC, i.e. 23:15 in Rome.
        let b = feed(
            "Concert X (Date 1)",
            "2025-06-10T21:15:00",
            Some("the Main Stadium arena"),
        );
        assert_eq!(engine.ingest(b), IngestOutcome::Merged);

        let records = engine.into_records();
        assert_eq!(records.len(), 1);
        let merged = &records[0];
        assert_eq!(merged.start.to_rfc3339(), "2025-06-10T21:00:00+02:00");
        assert_eq!(merged.title, "Concert X");
        assert_eq!(merged.venue_name.as_deref(), Some("Main Stadium"));
        assert_eq!(merged.provenance, Provenance::Curated);
        assert!(merged.end.is_none());
    }

    #[test]
    fn test_ingestion_is_idempotent() {
        let mut engine = engine();
        let mut record = curated("Concert X", "2025-06-10T21:00:00", Some("Main Stadium"));
        record.description = Some("A concert.".to_string());
        record.end = Some(TimeSpec::Text("2025-06-10T23:30:00".to_string()));

        engine.ingest(record.clone());
        engine.ingest(record);

        let records = engine.into_records();
        assert_eq!(records.len(), 1);
        // Identical description is not concatenated with itself.
        assert_eq!(records[0].description.as_deref(), Some("A concert."));
        assert_eq!(
            records[0].end.unwrap().to_rfc3339(),
            "2025-06-10T23:30:00+02:00"
        );
    }

    #[test]
    fn test_merge_is_order_tolerant_for_times() {
        let make_pair = || {
            let mut first = curated("Concert X", "2025-06-10T21:00:00", Some("Main Stadium"));
            first.end = Some(TimeSpec::Text("2025-06-10T23:30:00".to_string()));
            first.description = Some("From source one.".to_string());

            let mut second = curated("Concert X", "2025-06-10T21:15:00", Some("Main Stadium"));
            second.end = Some(TimeSpec::Text("2025-06-10T23:45:00".to_string()));
            second.description = Some("From source two.".to_string());
            (first, second)
        };

        let (first, second) = make_pair();
        let mut forward = engine();
        forward.ingest(first);
        forward.ingest(second);
        let forward = forward.into_records();

        let (first, second) = make_pair();
        let mut backward = engine();
        backward.ingest(second);
        backward.ingest(first);
        let backward = backward.into_records();

        assert_eq!(forward.len(), 1);
        assert_eq!(backward.len(), 1);
        // start = min, end = max, in either arrival order.
        assert_eq!(forward[0].start, backward[0].start);
        assert_eq!(forward[0].start.to_rfc3339(), "2025-06-10T21:00:00+02:00");
        assert_eq!(forward[0].end, backward[0].end);
        assert_eq!(
            forward[0].end.unwrap().to_rfc3339(),
            "2025-06-10T23:45:00+02:00"
        );
        // Differing descriptions are concatenated, existing text first.
        for records in [&forward, &backward] {
            let desc = records[0].description.as_deref().unwrap();
            assert!(desc.contains("From source one."));
            assert!(desc.contains("From source two."));
            assert!(desc.contains(DESCRIPTION_DELIMITER));
        }
    }

    #[test]
    fn test_empty_existing_description_is_replaced_not_concatenated() {
        let mut engine = engine();

        let mut a = curated("Concert X", "2025-06-10T21:00:00", Some("Main Stadium"));
        a.description = Some("".to_string());
        engine.ingest(a);

        let mut b = curated("Concert X", "2025-06-10T21:00:00", Some("Main Stadium"));
        b.description = Some("Real text".to_string());
        assert_eq!(engine.ingest(b), IngestOutcome::Merged);

        let records = engine.into_records();
        assert_eq!(records[0].description.as_deref(), Some("Real text"));

        // Whitespace-only counts as empty too.
        let mut engine = self::engine();
        let mut a = curated("Concert Y", "2025-06-10T21:00:00", Some("Main Stadium"));
        a.description = Some("   ".to_string());
        engine.ingest(a);
        let mut b = curated("Concert Y", "2025-06-10T21:00:00", Some("Main Stadium"));
        b.description = Some("Real text".to_string());
        engine.ingest(b);

        let records = engine.into_records();
        assert_eq!(records[0].description.as_deref(), Some("Real text"));
    }

    #[test]
    fn test_cross_provenance_reconciliation_preserves_curated_fields() {
        let mut engine = engine();

        let mut a = curated("Concert X", "2025-06-10T21:00:00", Some("Main Stadium"));
        a.external_link = Some("https://maps.example.com/stadium".to_string());
        a.description = Some("Curated description.".to_string());
        a.end = Some(TimeSpec::Text("2025-06-10T23:00:00".to_string()));
        engine.ingest(a);

        // Feed record with the same title and date but no venue at all.
        // 19:00 UTC = 21:00 Rome; end 21:30 UTC = 23:30 Rome.
        let mut b = feed("Concert X", "2025-06-10T19:00:00", None);
        b.description = Some("Feed description.".to_string());
        b.end = Some(TimeSpec::Text("2025-06-10T21:30:00".to_string()));
        assert_eq!(engine.ingest(b), IngestOutcome::Reconciled);

        let records = engine.into_records();
        assert_eq!(records.len(), 1);
        let merged = &records[0];
        // Only temporal fields are reconciled.
        assert_eq!(merged.end.unwrap().to_rfc3339(), "2025-06-10T23:30:00+02:00");
        assert_eq!(
            merged.external_link.as_deref(),
            Some("https://maps.example.com/stadium")
        );
        assert_eq!(merged.description.as_deref(), Some("Curated description."));
        assert_eq!(merged.venue_name.as_deref(), Some("Main Stadium"));
        assert_eq!(merged.provenance, Provenance::Curated);
    }

    #[test]
    fn test_curated_weak_match_with_different_venue_stays_distinct() {
        let mut engine = engine();

        engine.ingest(curated("Concert X", "2025-06-10T21:00:00", Some("Main Stadium")));
        let other = curated("Concert X", "2025-06-10T21:00:00", Some("Club Paradiso"));
        assert_eq!(engine.ingest(other), IngestOutcome::Inserted);

        assert_eq!(engine.len(), 2);
    }

    #[test]
    fn test_unknown_location_records_do_not_collide_with_resolved_ones() {
        let mut engine = engine();

        engine.ingest(curated("Concert X", "2025-06-10T21:00:00", Some("Main Stadium")));

        // Curated record with no venue: not eligible for reconciliation,
        // lands in the unknown-location bucket.
        let no_venue = curated("Concert X", "2025-06-10T20:00:00", None);
        assert_eq!(engine.ingest(no_venue), IngestOutcome::Inserted);
        assert_eq!(engine.len(), 2);

        // A second venue-less record shares the unknown bucket and
        // merges there, not into the venue-resolved record.
        let no_venue_again = curated("Concert X", "2025-06-10T20:30:00", None);
        assert_eq!(engine.ingest(no_venue_again), IngestOutcome::Merged);
        assert_eq!(engine.len(), 2);

        let records = engine.into_records();
        let resolved = records
            .iter()
            .find(|r| r.venue_name.is_some())
            .expect("venue-resolved record survives");
        assert_eq!(resolved.start.to_rfc3339(), "2025-06-10T21:00:00+02:00");
    }

    #[test]
    fn test_feed_records_never_reconcile_into_feed_records() {
        let mut engine = engine();

        // 19:00 UTC = 21:00 Rome for both.
        engine.ingest(feed("Concert X", "2025-06-10T19:00:00", Some("Main Stadium")));
        let venue_less = feed("Concert X", "2025-06-10T19:00:00", None);
        assert_eq!(engine.ingest(venue_less), IngestOutcome::Inserted);
        assert_eq!(engine.len(), 2);
    }

    #[test]
    fn test_output_preserves_first_insertion_order() {
        let mut engine = engine();
        engine.ingest(curated("Zeta", "2025-06-12T21:00:00", Some("Main Stadium")));
        engine.ingest(curated("Alpha", "2025-06-10T21:00:00", Some("Main Stadium")));
        engine.ingest(curated("Midway", "2025-06-11T21:00:00", None));

        let titles: Vec<_> = engine
            .into_records()
            .into_iter()
            .map(|r| r.title)
            .collect();
        assert_eq!(titles, vec!["Zeta", "Alpha", "Midway"]);
    }

    #[test]
    fn test_source_identifier_is_kept_but_ignored_for_identity() {
        let mut engine = engine();

        let mut a = feed("Derby [UCL]", "2025-06-10T19:00:00", Some("Main Stadium"));
        a.source_id = Some("uid-a".to_string());
        let mut b = feed("Derby", "2025-06-10T19:30:00", Some("Main Stadium"));
        b.source_id = Some("uid-b".to_string());

        engine.ingest(a);
        // Different source ids, same strong signature: still one event.
        assert_eq!(engine.ingest(b), IngestOutcome::Merged);

        let records = engine.into_records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].source_id.as_deref(), Some("uid-a"));
    }
}
