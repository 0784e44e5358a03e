use lazy_static::lazy_static;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::{info, warn};
use url::Url;

use super::dto::{normalize_address, EventPage};
use super::model::Event;
use crate::browser::page::ScrapePage;
use crate::browser::session::BrowserSession;
use crate::error::ScrapeError;

// Listing-page affordances. The ids are stable structural hooks, unlike
// Meetup's generated CSS classes.
const SEE_ALL_UPCOMING_SELECTOR: &str = "#see-all-upcoming-events-button";
const UPCOMING_TAB_TEXT: &str = "Upcoming";

// Event-page regions.
const TITLE_SELECTOR: &str = "h1";
const DESCRIPTION_SELECTOR: &str = "#event-details";
const ACTION_BAR_TIME_SELECTOR: &str = "[data-event-label='action-bar'] [datetime]";
const VENUE_NAME_SELECTOR: &str = "[data-testid='venue-name-value']";
const VENUE_LINK_SELECTOR: &str = "[data-testid='venue-name-link']";
const MAP_LINK_SELECTOR: &str = "[data-testid='map-link']";
const LOCATION_INFO_SELECTOR: &str = "[data-testid='location-info']";
const IMAGE_SELECTOR: &str = "[data-testid='event-description-image'] img";

lazy_static! {
    static ref MEETUP_HOSTNAME: Regex = Regex::new(r"(?i)^(.+\.)?meetup\.com$").unwrap();
    static ref TITLE: Selector = Selector::parse(TITLE_SELECTOR).unwrap();
    static ref DESCRIPTION: Selector = Selector::parse(DESCRIPTION_SELECTOR).unwrap();
    static ref ACTION_BAR_TIME: Selector = Selector::parse(ACTION_BAR_TIME_SELECTOR).unwrap();
    static ref VENUE_NAME: Selector = Selector::parse(VENUE_NAME_SELECTOR).unwrap();
    static ref VENUE_LINK: Selector = Selector::parse(VENUE_LINK_SELECTOR).unwrap();
    static ref MAP_LINK: Selector = Selector::parse(MAP_LINK_SELECTOR).unwrap();
    static ref LOCATION_INFO: Selector = Selector::parse(LOCATION_INFO_SELECTOR).unwrap();
    static ref IMAGE: Selector = Selector::parse(IMAGE_SELECTOR).unwrap();
}

pub struct MeetupProvider;

impl MeetupProvider {
    /// Full-hostname match for `meetup.com` and its subdomains,
    /// case-insensitive. Plain suffix sharing (`notmeetup.com`) does not
    /// count.
    pub fn matches(url: &Url) -> bool {
        url.host_str()
            .is_some_and(|host| MEETUP_HOSTNAME.is_match(host))
    }

    /// Scrapes up to `max_events` upcoming events reachable from the
    /// listing at `url`, in listing order.
    #[tracing::instrument(skip(session))]
    pub async fn scrape(
        session: &BrowserSession,
        url: &str,
        max_events: usize,
    ) -> Result<Vec<Event>, ScrapeError> {
        let mut page = ScrapePage::open(session).await?;
        let result = Self::scrape_with_page(&mut page, url, max_events).await;
        // the page is released on every path; only trace saving may warn
        if let Err(e) = page.close().await {
            warn!("Failed to close scrape page: {e}");
        }
        result
    }

    async fn scrape_with_page(
        page: &mut ScrapePage,
        url: &str,
        max_events: usize,
    ) -> Result<Vec<Event>, ScrapeError> {
        let event_urls = Self::upcoming_event_urls(page, url, max_events).await?;

        // Strictly sequential detail extraction: one page per request
        // bounds browser memory, at the cost of latency linear in
        // max_events.
        let mut events = Vec::with_capacity(event_urls.len());
        for event_url in &event_urls {
            events.push(Self::event_details(page, event_url).await?);
        }
        Ok(events)
    }

    /// Discovery phase: opens the upcoming listing, then walks its
    /// numbered event cards.
    async fn upcoming_event_urls(
        page: &mut ScrapePage,
        url: &str,
        max_events: usize,
    ) -> Result<Vec<String>, ScrapeError> {
        info!("Looking for upcoming events listed on {url}");
        page.navigate(url).await?;

        if !page.wait_for_visible(SEE_ALL_UPCOMING_SELECTOR).await {
            return Err(ScrapeError::Parsing(format!(
                "no upcoming-events listing found on {url}"
            )));
        }
        page.click(SEE_ALL_UPCOMING_SELECTOR).await?;
        if !page.click_link_by_text(UPCOMING_TAB_TEXT).await? {
            return Err(ScrapeError::Parsing(format!(
                "no '{UPCOMING_TAB_TEXT}' tab found on {url}"
            )));
        }

        let base = Url::parse(url).ok();
        let event_urls = collect_event_urls(page, base.as_ref(), max_events).await?;

        info!("Grabbed {} URLs for upcoming events", event_urls.len());
        Ok(event_urls)
    }

    /// Detail phase: renders one event page and extracts its fields.
    async fn event_details(page: &mut ScrapePage, event_url: &str) -> Result<Event, ScrapeError> {
        info!("Getting details for event at {event_url}");
        page.navigate(event_url).await?;
        // the bottom action bar hydrates last; once visible the page is
        // complete enough to read
        page.wait_for_visible(ACTION_BAR_TIME_SELECTOR).await;

        let html = page.content().await?;
        Self::extract_event(&html, event_url)
    }

    /// Pulls the raw fields out of a rendered event page. Which absences
    /// are fatal is decided by `EventPage::to_model`.
    fn extract_event(html: &str, event_url: &str) -> Result<Event, ScrapeError> {
        let document = Html::parse_document(html);
        let fields = EventPage {
            title: select_text(&document, &TITLE),
            description: select_text(&document, &DESCRIPTION),
            time: select_attr(&document, &ACTION_BAR_TIME, "datetime"),
            venue_name: select_text(&document, &VENUE_NAME),
            // first candidate link that carries a non-empty href wins
            venue_url: select_attr(&document, &VENUE_LINK, "href")
                .or_else(|| select_attr(&document, &MAP_LINK, "href")),
            venue_address: select_text(&document, &LOCATION_INFO)
                .map(|text| normalize_address(&text)),
            image_url: select_attr(&document, &IMAGE, "src"),
        };
        fields.to_model(event_url)
    }
}

/// The listing operations the card walk needs. Scrape pages implement it;
/// tests drive the walk with a scripted stand-in.
trait ListingPage {
    async fn wait_for_visible(&mut self, selector: &str) -> bool;
    async fn attribute(
        &mut self,
        selector: &str,
        name: &str,
    ) -> Result<Option<String>, ScrapeError>;
}

impl ListingPage for ScrapePage {
    async fn wait_for_visible(&mut self, selector: &str) -> bool {
        ScrapePage::wait_for_visible(self, selector).await
    }

    async fn attribute(
        &mut self,
        selector: &str,
        name: &str,
    ) -> Result<Option<String>, ScrapeError> {
        ScrapePage::attribute(self, selector, name).await
    }
}

/// Walks the numbered event cards in listing order, collecting up to
/// `max_events` hrefs. A card that never becomes visible means the
/// listing is exhausted; a visible card without a link is a broken page.
async fn collect_event_urls<P: ListingPage>(
    page: &mut P,
    base: Option<&Url>,
    max_events: usize,
) -> Result<Vec<String>, ScrapeError> {
    let mut event_urls = Vec::new();
    for event_number in 1..=max_events {
        let card_selector = format!("#event-card-e-{event_number}");
        if !page.wait_for_visible(&card_selector).await {
            info!("Failed to find event #{event_number}; stopping");
            break;
        }
        let href = page.attribute(&card_selector, "href").await?.ok_or_else(|| {
            ScrapeError::Parsing(format!(
                "failed to get event URL for event #{event_number}"
            ))
        })?;
        event_urls.push(absolutize(base, &href));
    }
    Ok(event_urls)
}

fn select_text(document: &Html, selector: &Selector) -> Option<String> {
    document
        .select(selector)
        .next()
        .map(element_text)
        .filter(|text| !text.is_empty())
}

fn select_attr(document: &Html, selector: &Selector, name: &str) -> Option<String> {
    document
        .select(selector)
        .next()
        .and_then(|element| element.value().attr(name))
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn element_text(element: ElementRef) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Event cards usually carry absolute hrefs; resolve the odd relative one
/// against the listing URL.
fn absolutize(base: Option<&Url>, href: &str) -> String {
    if Url::parse(href).is_ok() {
        return href.to_string();
    }
    base.and_then(|base| base.join(href).ok())
        .map(|joined| joined.to_string())
        .unwrap_or_else(|| href.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn parsed(url: &str) -> Url {
        Url::parse(url).unwrap()
    }

    const FULL_EVENT_PAGE: &str = r#"
        <html><body>
          <h1> Monthly Gophers Meetup </h1>
          <div id="event-details">
            Come talk about Go over pizza.
          </div>
          <div data-testid="event-description-image">
            <img src="https://secure.meetupstatic.com/photos/event/1.jpeg">
          </div>
          <a data-testid="venue-name-link" href="https://www.meetup.com/utahgophers/venues/1/">
            <span data-testid="venue-name-value">Kiln SLC</span>
          </a>
          <div data-testid="location-info">Kiln · 26 S Rio Grande St · Salt Lake City, UT</div>
          <div data-event-label="action-bar">
            <time datetime="2025-06-03T18:30:00Z[UTC]">Tue, Jun 3</time>
          </div>
        </body></html>"#;

    #[test_log::test]
    fn should_recognize_meetup_hostnames() {
        assert!(MeetupProvider::matches(&parsed(
            "https://www.meetup.com/utahgophers/events/"
        )));
        assert!(MeetupProvider::matches(&parsed("https://meetup.com/group")));
        assert!(MeetupProvider::matches(&parsed("https://WWW.MEETUP.COM/x")));
    }

    #[test_log::test]
    fn should_reject_non_meetup_hostnames() {
        assert!(!MeetupProvider::matches(&parsed("https://example.com/events")));
        assert!(!MeetupProvider::matches(&parsed("https://notmeetup.com/x")));
        assert!(!MeetupProvider::matches(&parsed(
            "https://meetup.com.evil.org/x"
        )));
    }

    #[test_log::test]
    fn should_extract_every_field_from_a_complete_page() {
        let event = MeetupProvider::extract_event(
            FULL_EVENT_PAGE,
            "https://www.meetup.com/utahgophers/events/123/",
        )
        .unwrap();

        assert_eq!(event.title, "Monthly Gophers Meetup");
        assert_eq!(event.description, "Come talk about Go over pizza.");
        assert_eq!(event.time, Utc.with_ymd_and_hms(2025, 6, 3, 18, 30, 0).unwrap());
        assert_eq!(event.venue_name.as_deref(), Some("Kiln SLC"));
        assert_eq!(
            event.venue_url.as_deref(),
            Some("https://www.meetup.com/utahgophers/venues/1/")
        );
        assert_eq!(
            event.venue_address.as_deref(),
            Some("Kiln, 26 S Rio Grande St, Salt Lake City, UT")
        );
        assert_eq!(
            event.image_url.as_deref(),
            Some("https://secure.meetupstatic.com/photos/event/1.jpeg")
        );
    }

    #[test_log::test]
    fn should_fall_back_to_the_map_link_for_the_venue_url() {
        let html = r#"
            <html><body>
              <h1>Online Hangout</h1>
              <a data-testid="map-link" href="https://maps.example.com/q?kiln"></a>
              <div data-event-label="action-bar">
                <time datetime="2025-06-03T18:30:00Z[UTC]"></time>
              </div>
            </body></html>"#;

        let event = MeetupProvider::extract_event(
            html,
            "https://www.meetup.com/utahgophers/events/124/",
        )
        .unwrap();

        assert_eq!(
            event.venue_url.as_deref(),
            Some("https://maps.example.com/q?kiln")
        );
    }

    #[test_log::test]
    fn missing_secondary_fields_do_not_fail_the_extraction() {
        let html = r#"
            <html><body>
              <h1>Bare Event</h1>
              <div data-event-label="action-bar">
                <time datetime="2025-06-03T18:30:00Z[UTC]"></time>
              </div>
            </body></html>"#;

        let event = MeetupProvider::extract_event(
            html,
            "https://www.meetup.com/utahgophers/events/125/",
        )
        .unwrap();

        assert_eq!(event.title, "Bare Event");
        assert_eq!(event.venue_name, None);
        assert_eq!(event.venue_url, None);
        assert_eq!(event.venue_address, None);
        assert_eq!(event.image_url, None);
    }

    #[test_log::test]
    fn a_page_without_the_action_bar_time_fails() {
        let html = "<html><body><h1>No Time</h1></body></html>";

        let result = MeetupProvider::extract_event(
            html,
            "https://www.meetup.com/utahgophers/events/126/",
        );

        assert!(matches!(result, Err(ScrapeError::Parsing(_))), "{result:?}");
    }

    #[test_log::test]
    fn a_page_without_a_heading_fails() {
        let html = r#"
            <html><body>
              <div data-event-label="action-bar">
                <time datetime="2025-06-03T18:30:00Z[UTC]"></time>
              </div>
            </body></html>"#;

        let result = MeetupProvider::extract_event(
            html,
            "https://www.meetup.com/utahgophers/events/127/",
        );

        assert!(matches!(result, Err(ScrapeError::Parsing(_))), "{result:?}");
    }

    /// Plays back a fixed set of event cards: one entry per visible card,
    /// holding that card's href (or `None` for a card without one).
    struct ScriptedListing {
        hrefs: Vec<Option<&'static str>>,
    }

    impl ScriptedListing {
        fn card_number(selector: &str) -> usize {
            selector
                .strip_prefix("#event-card-e-")
                .and_then(|number| number.parse().ok())
                .unwrap()
        }
    }

    impl ListingPage for ScriptedListing {
        async fn wait_for_visible(&mut self, selector: &str) -> bool {
            Self::card_number(selector) <= self.hrefs.len()
        }

        async fn attribute(
            &mut self,
            selector: &str,
            name: &str,
        ) -> Result<Option<String>, ScrapeError> {
            assert_eq!(name, "href");
            Ok(self.hrefs[Self::card_number(selector) - 1].map(str::to_string))
        }
    }

    #[test_log::test(tokio::test)]
    async fn a_listing_with_fewer_cards_than_requested_stops_early() {
        let mut listing = ScriptedListing {
            hrefs: vec![
                Some("https://www.meetup.com/utahgophers/events/1/"),
                Some("https://www.meetup.com/utahgophers/events/2/"),
            ],
        };

        let urls = collect_event_urls(&mut listing, None, 5).await.unwrap();

        assert_eq!(
            urls,
            vec![
                "https://www.meetup.com/utahgophers/events/1/",
                "https://www.meetup.com/utahgophers/events/2/",
            ]
        );
    }

    #[test_log::test(tokio::test)]
    async fn discovery_stops_at_the_requested_maximum() {
        let mut listing = ScriptedListing {
            hrefs: vec![
                Some("https://www.meetup.com/utahgophers/events/1/"),
                Some("https://www.meetup.com/utahgophers/events/2/"),
                Some("https://www.meetup.com/utahgophers/events/3/"),
            ],
        };

        let urls = collect_event_urls(&mut listing, None, 2).await.unwrap();

        assert_eq!(urls.len(), 2);
    }

    #[test_log::test(tokio::test)]
    async fn a_visible_card_without_a_link_fails_the_discovery() {
        let mut listing = ScriptedListing {
            hrefs: vec![Some("https://www.meetup.com/utahgophers/events/1/"), None],
        };

        let result = collect_event_urls(&mut listing, None, 3).await;

        match result {
            Err(ScrapeError::Parsing(message)) => assert!(message.contains("event #2")),
            other => panic!("expected ParsingError, got {other:?}"),
        }
    }

    #[test_log::test(tokio::test)]
    async fn collected_relative_hrefs_resolve_against_the_listing_url() {
        let base = parsed("https://www.meetup.com/utahgophers/events/");
        let mut listing = ScriptedListing {
            hrefs: vec![Some("/utahgophers/events/7/")],
        };

        let urls = collect_event_urls(&mut listing, Some(&base), 1).await.unwrap();

        assert_eq!(urls, vec!["https://www.meetup.com/utahgophers/events/7/"]);
    }

    #[test_log::test]
    fn relative_card_hrefs_resolve_against_the_listing() {
        let base = parsed("https://www.meetup.com/utahgophers/events/");

        assert_eq!(
            absolutize(Some(&base), "/utahgophers/events/123/"),
            "https://www.meetup.com/utahgophers/events/123/"
        );
        assert_eq!(
            absolutize(Some(&base), "https://www.meetup.com/other/events/9/"),
            "https://www.meetup.com/other/events/9/"
        );
    }
}
