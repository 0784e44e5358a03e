use tracing::info;
use url::Url;

use crate::browser::session::BrowserSession;
use crate::error::ScrapeError;
use crate::meetup::api::MeetupProvider;
use crate::meetup::model::Event;

/// Registered providers in priority order; the first predicate match
/// handles the request. Adding a site means appending a variant here and
/// a dispatch arm below, without touching any call site.
pub const EVENT_PROVIDERS: &[EventProvider] = &[EventProvider::Meetup];

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::IntoStaticStr)]
pub enum EventProvider {
    #[strum(serialize = "Meetup.com")]
    Meetup,
}

impl EventProvider {
    pub fn name(&self) -> &'static str {
        (*self).into()
    }

    pub fn matches(&self, url: &Url) -> bool {
        match self {
            Self::Meetup => MeetupProvider::matches(url),
        }
    }

    pub async fn scrape(
        &self,
        session: &BrowserSession,
        url: &str,
        max_events: usize,
    ) -> Result<Vec<Event>, ScrapeError> {
        match self {
            Self::Meetup => MeetupProvider::scrape(session, url, max_events).await,
        }
    }
}

/// First provider whose predicate matches, scanning in registry order.
pub fn provider_for(url: &Url) -> Option<&'static EventProvider> {
    EVENT_PROVIDERS.iter().find(|provider| provider.matches(url))
}

/// Dispatches `url` to its provider and returns the ordered event list,
/// at most `max_events` long. URLs no provider recognizes are a terminal,
/// non-retryable failure.
#[tracing::instrument(skip(session))]
pub async fn scrape_events(
    session: &BrowserSession,
    url: &str,
    max_events: usize,
) -> Result<Vec<Event>, ScrapeError> {
    info!("Processing URL: {url}");
    let parsed = Url::parse(url).map_err(|_| ScrapeError::UnknownEventProvider {
        url: url.to_string(),
    })?;

    match provider_for(&parsed) {
        Some(provider) => {
            info!(
                "URL recognized as belonging to event provider {}",
                provider.name()
            );
            provider.scrape(session, url, max_events).await
        }
        None => Err(ScrapeError::UnknownEventProvider {
            url: url.to_string(),
        }),
    }
}
