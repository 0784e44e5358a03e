//! Wire schema shared by the boundary adapters (CLI today, HTTP when one
//! fronts this crate). Both branches of the result union serialize and
//! deserialize losslessly so any boundary can relay them.

use crate::error::ScrapeError;
use crate::meetup::model::Event;
use serde::{Deserialize, Serialize};

fn default_max_events() -> usize {
    3
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapeRequest {
    pub url: String,
    #[serde(default = "default_max_events")]
    pub max_events: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapeResponse {
    pub events: Vec<Event>,
}

/// Error branch of the union. `type` is the discriminant boundary layers
/// key on; `error_class` names the error kind so statuses can be mapped
/// without parsing the human-readable detail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseError {
    #[serde(rename = "type")]
    pub kind: String,
    pub error_class: String,
    pub detail: Option<String>,
}

impl ResponseError {
    pub fn from_error(error: &ScrapeError) -> Self {
        let detail = error.to_string();
        Self {
            kind: "error".to_string(),
            error_class: error.error_class().to_string(),
            detail: (!detail.is_empty()).then_some(detail),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScrapeOutcome {
    Success(ScrapeResponse),
    Error(ResponseError),
}
