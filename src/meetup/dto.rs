use super::model::Event;
use crate::error::ScrapeError;
use chrono::{DateTime, NaiveDateTime, Utc};
use itertools::Itertools;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::warn;

/// Separator Meetup places between the segments of its location summary.
const ADDRESS_SEPARATOR: char = '·';

lazy_static! {
    // example input: "2025-06-03T18:30:00Z[UTC]"
    static ref EVENT_TIMESTAMP: Regex =
        Regex::new(r"^(\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2})Z\[UTC]$").unwrap();
}

/// Raw fields pulled from one rendered event page. Everything is optional
/// here; `to_model` decides which absences are fatal and which only warn.
#[derive(Debug, Default)]
pub struct EventPage {
    pub title: Option<String>,
    pub description: Option<String>,
    pub time: Option<String>,
    pub venue_name: Option<String>,
    pub venue_url: Option<String>,
    pub venue_address: Option<String>,
    pub image_url: Option<String>,
}

impl EventPage {
    /// Validates the mandatory fields and builds the immutable record.
    /// Missing secondary fields are logged and carried as `None`.
    #[tracing::instrument(skip(self))]
    pub fn to_model(self, url: &str) -> Result<Event, ScrapeError> {
        let title = self.title.ok_or_else(|| {
            ScrapeError::Parsing(format!("failed to get event title from {url}"))
        })?;
        let time_raw = self
            .time
            .ok_or_else(|| ScrapeError::Parsing(format!("failed to get event time from {url}")))?;
        let time = parse_timestamp(&time_raw)?;

        let description = self.description.unwrap_or_else(|| {
            warn!("No event description found (leaving it empty)");
            String::new()
        });
        if self.venue_name.is_none() {
            warn!("No venue name found");
        }
        if self.venue_url.is_none() {
            warn!("No venue URL found");
        }
        if self.image_url.is_none() {
            warn!("No event image found");
        }

        Ok(Event {
            url: url.to_string(),
            title,
            description,
            time,
            venue_name: self.venue_name,
            venue_url: self.venue_url,
            venue_address: self.venue_address,
            image_url: self.image_url,
        })
    }
}

/// Parses Meetup's `YYYY-MM-DDTHH:MM:SSZ[UTC]` stamps into a UTC instant.
/// The source is always UTC-labeled, so no conversion happens beyond
/// attaching the zone.
pub fn parse_timestamp(timestamp: &str) -> Result<DateTime<Utc>, ScrapeError> {
    let captures = EVENT_TIMESTAMP.captures(timestamp).ok_or_else(|| {
        ScrapeError::Parsing(format!("regex failed to parse timestamp: {timestamp:?}"))
    })?;
    let naive = NaiveDateTime::parse_from_str(&captures[1], "%Y-%m-%dT%H:%M:%S").map_err(|e| {
        ScrapeError::Parsing(format!("failed to parse timestamp {timestamp:?}: {e}"))
    })?;
    Ok(naive.and_utc())
}

/// Rewrites the middle-dot separated location line into a comma-separated
/// address.
pub fn normalize_address(raw: &str) -> String {
    raw.split(ADDRESS_SEPARATOR).map(str::trim).join(", ")
}
