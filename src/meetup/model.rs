use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One extracted event.
///
/// `url`, `title` and `time` are mandatory: an `Event` cannot be built
/// without them. The remaining fields are best-effort and may be absent
/// when the page does not carry them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub url: String,
    pub title: String,
    pub description: String,
    pub time: DateTime<Utc>,
    pub venue_name: Option<String>,
    pub venue_url: Option<String>,
    pub venue_address: Option<String>,
    pub image_url: Option<String>,
}
