use std::path::Path;

use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use venuecal_core::config::MergeConfig;
use venuecal_core::dedup::DedupEngine;
use venuecal_core::ics;
use venuecal_core::record::RawRecord;

/// Build one deduplicated calendar per raw data file.
///
/// Data files are processed in sorted filename order so output is
/// reproducible. A file that fails to read or deserialize is reported
/// and skipped; the other files proceed unaffected.
pub fn run(config: &MergeConfig, data_dir: &Path, out_dir: &Path) -> Result<()> {
    let tz = config.timezone()?;
    let venues = config.venue_table();

    let mut files: Vec<_> = std::fs::read_dir(data_dir)
        .with_context(|| format!("Could not read data directory {}", data_dir.display()))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    files.sort();

    if files.is_empty() {
        anyhow::bail!("No .json data files found in {}", data_dir.display());
    }

    std::fs::create_dir_all(out_dir)?;

    let mut generated = 0;
    for path in &files {
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("calendar");
        println!("{}", name.bold());

        let raw = match read_raw_records(path) {
            Ok(raw) => raw,
            Err(e) => {
                println!("   {}", e.to_string().red());
                continue;
            }
        };

        let mut engine = DedupEngine::new(tz, venues.clone());
        for record in raw {
            engine.ingest(record);
        }

        let stats = engine.stats();
        let records = engine.into_records();
        if records.is_empty() {
            println!("   {}", "no valid events, skipping".yellow());
            continue;
        }

        let calendar_name = format!("{} - {}", config.calendar_name, calendar_label(name));
        let ics_text = ics::generate_calendar(&records, &calendar_name, tz)?;
        let out_path = out_dir.join(format!("{name}.ics"));
        std::fs::write(&out_path, ics_text)
            .with_context(|| format!("Could not write {}", out_path.display()))?;

        println!(
            "   {} events written to {} ({} merged, {} rejected)",
            records.len(),
            out_path.display(),
            stats.merged + stats.reconciled,
            stats.rejected
        );
        generated += 1;
    }

    println!("\nGenerated {generated} calendar file(s)");
    Ok(())
}

fn read_raw_records(path: &Path) -> Result<Vec<RawRecord>> {
    let content = std::fs::read_to_string(path)?;
    Ok(RawRecord::list_from_json(&content)?)
}

/// Display label for a data file: "eventi_2025_06" -> "2025_06".
/// The conventional `eventi_` prefix carries no information the
/// calendar name doesn't already have.
fn calendar_label(stem: &str) -> &str {
    stem.strip_prefix("eventi_").unwrap_or(stem)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calendar_label_strips_the_data_file_prefix() {
        assert_eq!(calendar_label("eventi_2025_06"), "2025_06");
        assert_eq!(calendar_label("2025_07"), "2025_07");
        assert_eq!(calendar_label("custom"), "custom");
    }
}
