use std::path::Path;

use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use venuecal_core::config::MergeConfig;
use venuecal_core::dedup::DedupEngine;
use venuecal_core::ics;
use venuecal_core::record::Provenance;
use venuecal_core::venue::VenueTable;

/// Merge curated calendars and remote feeds into one deduplicated
/// calendar.
///
/// Curated sources are ingested first so venue-less feed records can be
/// reconciled into venue-rich curated ones. A feed that fails to fetch
/// or parse is reported and skipped; the other sources proceed.
pub async fn run(config: &MergeConfig, out: &Path, custom_dir: Option<&Path>) -> Result<()> {
    let tz = config.timezone()?;
    let venues = config.venue_table();
    let mut engine = DedupEngine::new(tz, venues.clone());

    if let Some(dir) = custom_dir {
        ingest_curated_calendars(&mut engine, dir)?;
    }

    for feed in &config.feeds {
        println!("{}", feed.name.bold());
        let records = match fetch_feed(&feed.url).await {
            Ok(content) => match ics::parse_records(&content, Provenance::Feed) {
                Ok(records) => records,
                Err(e) => {
                    println!("   {}", e.to_string().red());
                    continue;
                }
            },
            Err(e) => {
                println!("   {}", e.to_string().red());
                continue;
            }
        };

        let mut ingested = 0;
        for record in records {
            if !is_relevant(&venues, record.venue_name.as_deref()) {
                continue;
            }
            engine.ingest(record);
            ingested += 1;
        }
        println!("   {ingested} events ingested");
    }

    let stats = engine.stats();
    let records = engine.into_records();

    let ics_text = ics::generate_calendar(&records, &config.calendar_name, tz)?;
    std::fs::write(out, ics_text)
        .with_context(|| format!("Could not write {}", out.display()))?;

    println!(
        "\n{} canonical events written to {} ({} merged, {} reconciled, {} rejected)",
        records.len(),
        out.display(),
        stats.merged,
        stats.reconciled,
        stats.rejected
    );
    Ok(())
}

/// Relevance filter for feed events: keep those at one of the
/// configured venues, plus venue-less events (feeds often omit the
/// venue for what is otherwise a home fixture; the engine's
/// reconciliation rule decides those).
fn is_relevant(venues: &VenueTable, venue_name: Option<&str>) -> bool {
    let resolution = venues.resolve(venue_name);
    resolution.is_canonical() || resolution.is_unknown()
}

fn ingest_curated_calendars(engine: &mut DedupEngine, dir: &Path) -> Result<()> {
    let mut files: Vec<_> = std::fs::read_dir(dir)
        .with_context(|| format!("Could not read custom calendar directory {}", dir.display()))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("ics"))
        })
        .collect();
    files.sort();

    for path in &files {
        let name = path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("calendar");
        println!("{}", name.bold());

        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                println!("   {}", e.to_string().red());
                continue;
            }
        };
        match ics::parse_records(&content, Provenance::Curated) {
            Ok(records) => {
                let count = records.len();
                for record in records {
                    engine.ingest(record);
                }
                println!("   {count} events ingested");
            }
            Err(e) => println!("   {}", e.to_string().red()),
        }
    }

    Ok(())
}

/// Fetch raw calendar text for one feed. A failure here loses only
/// this source.
async fn fetch_feed(url: &str) -> Result<String> {
    let response = reqwest::get(url).await?.error_for_status()?;
    Ok(response.text().await?)
}
