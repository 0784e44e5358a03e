//! Best-effort diagnostic trace capture.
//!
//! While a scrape runs in debug mode, the page records screenshots and HTML
//! source snapshots; on close they are packed into a zip archive under
//! `traces/`. Tracing must never fail the scrape, so callers log and
//! swallow every error raised here.

use chrono::{DateTime, Utc};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use uuid::Uuid;

const TRACES_DIR: &str = "traces";

#[derive(Debug, Default)]
pub struct TraceRecorder {
    entries: Vec<TraceEntry>,
}

#[derive(Debug)]
struct TraceEntry {
    name: String,
    bytes: Vec<u8>,
}

impl TraceRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_snapshot(&mut self, label: &str, html: String) {
        let name = format!("{:03}-{label}.html", self.entries.len());
        self.entries.push(TraceEntry {
            name,
            bytes: html.into_bytes(),
        });
    }

    pub fn add_screenshot(&mut self, label: &str, png: Vec<u8>) {
        let name = format!("{:03}-{label}.png", self.entries.len());
        self.entries.push(TraceEntry { name, bytes: png });
    }

    /// Writes the archive as `traces/trace-<UTC timestamp>-<4 hex>.zip`,
    /// creating the directory on demand. The random suffix keeps
    /// concurrent requests from clobbering each other's archives.
    pub fn save(self) -> io::Result<PathBuf> {
        fs::create_dir_all(TRACES_DIR)?;
        let path = Path::new(TRACES_DIR).join(trace_file_name(Utc::now()));

        let file = fs::File::create(&path)?;
        let mut archive = zip::ZipWriter::new(file);
        let options = zip::write::SimpleFileOptions::default();
        for entry in &self.entries {
            archive
                .start_file(entry.name.as_str(), options)
                .map_err(io::Error::other)?;
            archive.write_all(&entry.bytes)?;
        }
        archive.finish().map_err(io::Error::other)?;

        Ok(path)
    }
}

fn trace_file_name(now: DateTime<Utc>) -> String {
    let timestamp = now.format("%Y_%m_%d-%H_%M_%S");
    let uuid = Uuid::new_v4().simple().to_string();
    format!("trace-{timestamp}-{}.zip", &uuid[..4])
}
