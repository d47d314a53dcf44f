//! ICS generation for canonical event records.

use chrono::DateTime;
use chrono_tz::Tz;
use icalendar::{Calendar, Component, EventLike, Property};
use uuid::Uuid;

use crate::error::VenuecalResult;
use crate::record::EventRecord;

const TIME_FORMAT: &str = "%Y%m%dT%H%M%S";

/// Generate calendar content for a set of canonical records.
///
/// Every emitted VEVENT gets a freshly generated UID: output identity
/// is signature-based, never carried over from a feed.
pub fn generate_calendar(
    records: &[EventRecord],
    name: &str,
    tz: Tz,
) -> VenuecalResult<String> {
    let mut cal = Calendar::new();
    cal.append_property(Property::new("X-WR-CALNAME", name));
    cal.append_property(Property::new("X-WR-TIMEZONE", tz.name()));

    for record in records {
        cal.push(generate_event(record));
    }

    let cal = cal.done();
    Ok(rewrite_calendar_header(&cal.to_string()))
}

fn generate_event(record: &EventRecord) -> icalendar::Event {
    let mut event = icalendar::Event::new();
    event.uid(&Uuid::new_v4().to_string());
    event.summary(&record.title);

    add_zoned_property(&mut event, "DTSTART", &record.start);
    if let Some(ref end) = record.end {
        add_zoned_property(&mut event, "DTEND", end);
    }

    if let Some(location) = render_location(record) {
        event.location(&location);
    }
    if let Some(ref desc) = record.description {
        event.description(desc);
    }
    if let Some(ref url) = record.external_link {
        event.add_property("URL", url);
    }

    event.done()
}

/// LOCATION is "name - address" when both parts are present.
fn render_location(record: &EventRecord) -> Option<String> {
    match (&record.venue_name, &record.venue_address) {
        (Some(name), Some(addr)) => Some(format!("{name} - {addr}")),
        (Some(name), None) => Some(name.clone()),
        (None, Some(addr)) => Some(addr.clone()),
        (None, None) => None,
    }
}

/// Datetime property with a TZID parameter in the target timezone.
fn add_zoned_property(event: &mut icalendar::Event, name: &str, dt: &DateTime<Tz>) {
    let mut prop = Property::new(name, dt.format(TIME_FORMAT).to_string());
    prop.add_parameter("TZID", dt.timezone().name());
    event.append_property(prop);
}

/// Clean up the icalendar crate's calendar header:
/// - replace PRODID with ours
/// - drop CALSCALE:GREGORIAN (it is the default)
fn rewrite_calendar_header(ics: &str) -> String {
    let mut result = String::with_capacity(ics.len());

    for line in ics.lines() {
        if line.starts_with("PRODID:") {
            result.push_str("PRODID:-//venuecal//EN\r\n");
            continue;
        }
        if line == "CALSCALE:GREGORIAN" {
            continue;
        }
        result.push_str(line);
        result.push_str("\r\n");
    }

    result
}
