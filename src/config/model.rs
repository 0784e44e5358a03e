/// Runtime configuration sourced from the environment once at startup.
#[derive(Debug)]
pub struct Config {
    /// Runs the browser with a visible window and records diagnostic
    /// traces of every scrape.
    pub debug: bool,
    /// Default timeout for navigation and selector waits, in milliseconds.
    pub navigation_timeout_ms: u64,
    /// Default bound on how many events a single scrape extracts.
    pub max_events: usize,
}
