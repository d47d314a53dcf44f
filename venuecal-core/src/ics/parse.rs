//! Calendar parsing into raw records, using the icalendar crate's parser.

use std::str::FromStr;

use chrono::TimeZone;
use chrono_tz::Tz;
use icalendar::parser::{read_calendar, unfold};
use icalendar::{CalendarDateTime, DatePerhapsTime};

use crate::error::{VenuecalError, VenuecalResult};
use crate::record::{Provenance, RawRecord, TimeSpec};
use crate::temporal::TIMESTAMP_FORMAT;

/// Parse calendar text into raw records with the given provenance.
///
/// VEVENTs without a DTSTART are skipped (they can never become valid
/// records). Times with explicit UTC or TZID information become
/// resolved instants; floating times stay text, to be interpreted per
/// provenance by the temporal normalizer downstream.
pub fn parse_records(content: &str, provenance: Provenance) -> VenuecalResult<Vec<RawRecord>> {
    let unfolded = unfold(content);
    let calendar =
        read_calendar(&unfolded).map_err(|e| VenuecalError::IcsParse(e.to_string()))?;

    let records = calendar
        .components
        .iter()
        .filter(|c| c.name == "VEVENT")
        .filter_map(|vevent| parse_vevent(vevent, provenance))
        .collect();

    Ok(records)
}

fn parse_vevent(
    vevent: &icalendar::parser::Component<'_>,
    provenance: Provenance,
) -> Option<RawRecord> {
    let start = to_time_spec(DatePerhapsTime::try_from(vevent.find_prop("DTSTART")?).ok()?);
    let end = vevent
        .find_prop("DTEND")
        .and_then(|p| DatePerhapsTime::try_from(p).ok())
        .map(to_time_spec);

    let summary = vevent
        .find_prop("SUMMARY")
        .map(|p| p.val.to_string())
        .unwrap_or_else(|| "(no title)".to_string());

    Some(RawRecord {
        summary,
        start: Some(start),
        end,
        venue_name: vevent.find_prop("LOCATION").map(|p| p.val.to_string()),
        venue_address: None,
        description: vevent.find_prop("DESCRIPTION").map(|p| p.val.to_string()),
        external_link: vevent.find_prop("URL").map(|p| p.val.to_string()),
        provenance,
        source_id: vevent.find_prop("UID").map(|p| p.val.to_string()),
    })
}

/// Convert icalendar's DatePerhapsTime into a source time.
fn to_time_spec(dpt: DatePerhapsTime) -> TimeSpec {
    match dpt {
        // Date-only starts map to midnight.
        DatePerhapsTime::Date(d) => TimeSpec::Text(format!("{}T00:00:00", d.format("%Y-%m-%d"))),
        DatePerhapsTime::DateTime(dt) => match dt {
            CalendarDateTime::Utc(dt) => TimeSpec::Instant(dt),
            CalendarDateTime::Floating(naive) => {
                TimeSpec::Text(naive.format(TIMESTAMP_FORMAT).to_string())
            }
            CalendarDateTime::WithTimezone { date_time, tzid } => match Tz::from_str(&tzid) {
                Ok(tz) => match tz.from_local_datetime(&date_time).earliest() {
                    Some(dt) => TimeSpec::Instant(dt.to_utc()),
                    None => TimeSpec::Text(date_time.format(TIMESTAMP_FORMAT).to_string()),
                },
                // Unrecognized TZID: treat as floating.
                Err(_) => TimeSpec::Text(date_time.format(TIMESTAMP_FORMAT).to_string()),
            },
        },
    }
}
