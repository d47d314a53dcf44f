//! Timestamp normalization into the configured target timezone.

use chrono::{DateTime, LocalResult, NaiveDateTime, TimeZone};
use chrono_tz::Tz;

use crate::error::{VenuecalError, VenuecalResult};
use crate::record::{Provenance, TimeSpec};

/// The only accepted literal timestamp format.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Normalizes source timestamps into timezone-aware instants in a
/// single target timezone.
///
/// Naive text is interpreted per provenance: curated sources author
/// timestamps in local (target-timezone) time, feed sources are assumed
/// UTC-normalized before conversion. Instants that already carry
/// timezone information are simply converted, so re-normalization is
/// idempotent.
#[derive(Debug, Clone, Copy)]
pub struct Normalizer {
    tz: Tz,
}

impl Normalizer {
    pub fn new(tz: Tz) -> Self {
        Normalizer { tz }
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    /// Resolve a source time into the target timezone.
    ///
    /// Malformed text is a recoverable error; the caller drops the
    /// record and continues.
    pub fn resolve(&self, time: &TimeSpec, provenance: Provenance) -> VenuecalResult<DateTime<Tz>> {
        match time {
            TimeSpec::Instant(dt) => Ok(dt.with_timezone(&self.tz)),
            TimeSpec::Text(text) => {
                let naive = NaiveDateTime::parse_from_str(text.trim(), TIMESTAMP_FORMAT)
                    .map_err(|_| VenuecalError::Timestamp(text.clone()))?;
                Ok(self.localize(naive, provenance))
            }
        }
    }

    fn localize(&self, naive: NaiveDateTime, provenance: Provenance) -> DateTime<Tz> {
        match provenance {
            Provenance::Curated => match self.tz.from_local_datetime(&naive) {
                LocalResult::Single(dt) => dt,
                // DST fold: take the earlier of the two interpretations.
                LocalResult::Ambiguous(early, _) => early,
                // DST gap: the wall-clock time never existed locally.
                LocalResult::None => naive.and_utc().with_timezone(&self.tz),
            },
            Provenance::Feed => naive.and_utc().with_timezone(&self.tz),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use chrono_tz::Europe::Rome;

    #[test]
    fn test_curated_naive_text_is_local_time() {
        let normalizer = Normalizer::new(Rome);
        let time = TimeSpec::Text("2025-06-10T21:00:00".to_string());

        let dt = normalizer.resolve(&time, Provenance::Curated).unwrap();
        assert_eq!(dt.to_rfc3339(), "2025-06-10T21:00:00+02:00");
    }

    #[test]
    fn test_feed_naive_text_is_utc() {
        let normalizer = Normalizer::new(Rome);
        let time = TimeSpec::Text("2025-06-10T21:00:00".to_string());

        // Same text, but feed provenance: 21:00 UTC is 23:00 in Rome.
        let dt = normalizer.resolve(&time, Provenance::Feed).unwrap();
        assert_eq!(dt.to_rfc3339(), "2025-06-10T23:00:00+02:00");
    }

    #[test]
    fn test_instants_convert_regardless_of_provenance() {
        let normalizer = Normalizer::new(Rome);
        let instant = Utc.with_ymd_and_hms(2025, 6, 10, 19, 0, 0).unwrap();
        let time = TimeSpec::Instant(instant);

        let curated = normalizer.resolve(&time, Provenance::Curated).unwrap();
        let feed = normalizer.resolve(&time, Provenance::Feed).unwrap();
        assert_eq!(curated, feed);
        assert_eq!(curated.to_rfc3339(), "2025-06-10T21:00:00+02:00");
    }

    #[test]
    fn test_renormalization_is_idempotent() {
        let normalizer = Normalizer::new(Rome);
        let time = TimeSpec::Text("2025-06-10T21:00:00".to_string());

        let once = normalizer.resolve(&time, Provenance::Curated).unwrap();
        let again = normalizer
            .resolve(&TimeSpec::Instant(once.with_timezone(&Utc)), Provenance::Curated)
            .unwrap();
        assert_eq!(once, again);
    }

    #[test]
    fn test_malformed_text_is_a_timestamp_error() {
        let normalizer = Normalizer::new(Rome);
        let time = TimeSpec::Text("10/06/2025 21:00".to_string());

        let err = normalizer.resolve(&time, Provenance::Curated).unwrap_err();
        assert!(matches!(err, VenuecalError::Timestamp(_)));
    }
}
