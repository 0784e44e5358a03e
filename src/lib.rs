//! Extracts structured upcoming-event listings (title, time, venue, image,
//! description) from supported websites by driving a headless browser.

pub mod browser;
pub mod config;
pub mod error;
pub mod meetup;
pub mod response;
pub mod scraper;
pub mod tracing;
