//! Merge configuration: target timezone, venue alias table, feeds.
//!
//! Loaded once at startup and passed into the engine explicitly;
//! immutable afterwards.

use std::path::Path;
use std::str::FromStr;

use chrono_tz::Tz;
use config::{Config, File, FileFormat};
use serde::Deserialize;

use crate::error::{VenuecalError, VenuecalResult};
use crate::venue::{VenueEntry, VenueTable};

/// One remote calendar feed to pull during a merge run.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedSource {
    pub name: String,
    pub url: String,
}

fn default_timezone() -> String {
    "Europe/Rome".to_string()
}

fn default_calendar_name() -> String {
    "Venue Events".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct MergeConfig {
    #[serde(default = "default_timezone")]
    pub target_timezone: String,

    #[serde(default = "default_calendar_name")]
    pub calendar_name: String,

    /// Venue alias table. Declaration order is resolution order.
    #[serde(default)]
    pub venues: Vec<VenueEntry>,

    /// Remote feeds, fetched in declaration order.
    #[serde(default)]
    pub feeds: Vec<FeedSource>,
}

impl MergeConfig {
    /// Load from a TOML file, creating a template config when none
    /// exists yet.
    pub fn load(path: &Path) -> VenuecalResult<Self> {
        if !path.exists() {
            Self::create_template(path)?;
        }

        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> VenuecalResult<Self> {
        Config::builder()
            .add_source(File::from_str(content, FileFormat::Toml))
            .build()
            .map_err(|e| VenuecalError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| VenuecalError::Config(e.to_string()))
    }

    pub fn timezone(&self) -> VenuecalResult<Tz> {
        Tz::from_str(&self.target_timezone)
            .map_err(|_| VenuecalError::Timezone(self.target_timezone.clone()))
    }

    pub fn venue_table(&self) -> VenueTable {
        VenueTable::new(self.venues.clone())
    }

    /// Write a starter config file with a worked example.
    fn create_template(path: &Path) -> VenuecalResult<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    VenuecalError::Config(format!("Could not create config directory: {e}"))
                })?;
            }
        }

        std::fs::write(path, TEMPLATE)
            .map_err(|e| VenuecalError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }
}

const TEMPLATE: &str = r#"# venuecal configuration

target_timezone = "Europe/Rome"
calendar_name = "Eventi San Siro"

# Venue alias table. Entries are tested in order, first match wins.
[[venues]]
id = "ippodromo-snai-la-maura"
aliases = ["ippodromo la maura", "la maura", "via lampugnano 95"]

[[venues]]
id = "ippodromo-snai-san-siro"
aliases = ["ippodromo san siro", "piazzale dello sport 16", "piazzale dello sport"]

[[venues]]
id = "stadio-san-siro"
aliases = ["stadio giuseppe meazza", "giuseppe meazza", "san siro", "piazzale angelo moratti"]

# Remote feeds pulled by `venuecal merge`.
[[feeds]]
name = "inter"
url = "https://www.stanza.news/api/calendar/inter/all.ics"

[[feeds]]
name = "milan"
url = "https://www.stanza.news/api/calendar/milan/all.ics"
"#;
