use thiserror::Error;

/// Failures surfaced by the scraping pipeline.
///
/// Transient navigation failures are retried inside the navigator and never
/// show up here; every variant is terminal for the scrape that raised it.
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// No registered provider recognizes the URL's site.
    #[error("no event provider matches {url}")]
    UnknownEventProvider { url: String },

    /// Navigation failed on every retry attempt.
    #[error("failed to navigate to {url}")]
    Navigation { url: String },

    /// A mandatory field could not be extracted from a page assumed
    /// well-formed. Points at a site layout change or an unexpected page
    /// state.
    #[error("{0}")]
    Parsing(String),

    /// The browser process could not be started.
    #[error("failed to launch browser: {reason}")]
    Launch { reason: String },

    /// The browser automation layer failed outside of navigation.
    #[error("browser error: {0}")]
    Browser(#[from] chromiumoxide::error::CdpError),
}

impl ScrapeError {
    /// Stable fully-qualified kind name used in the wire format, so
    /// boundary layers can map kinds to statuses without matching on
    /// message text.
    pub fn error_class(&self) -> &'static str {
        match self {
            Self::UnknownEventProvider { .. } => "eventscout::error::UnknownEventProviderError",
            Self::Navigation { .. } => "eventscout::error::NavigationError",
            Self::Parsing(_) => "eventscout::error::ParsingError",
            Self::Launch { .. } => "eventscout::error::BrowserLaunchError",
            Self::Browser(_) => "eventscout::error::BrowserError",
        }
    }
}
