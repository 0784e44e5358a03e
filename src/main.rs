use eventscout::browser::session::BrowserSession;
use eventscout::config::env_loader::config;
use eventscout::error::ScrapeError;
use eventscout::response::{ResponseError, ScrapeResponse};
use eventscout::scraper::scrape_events;
use eventscout::tracing::setup_tracing;
use std::env;
use std::process::ExitCode;
use tracing::warn;

#[tokio::main]
async fn main() -> ExitCode {
    let _loki = setup_tracing();

    let args: Vec<String> = env::args().skip(1).collect();
    let (url, max_events) = match parse_args(&args) {
        Ok(parsed) => parsed,
        Err(message) => {
            eprintln!("{message}");
            return ExitCode::FAILURE;
        }
    };

    match run(&url, max_events).await {
        Ok(response) => {
            println!(
                "{}",
                serde_json::to_string_pretty(&response).expect("response serializes")
            );
            ExitCode::SUCCESS
        }
        Err(error) => {
            println!(
                "{}",
                serde_json::to_string_pretty(&ResponseError::from_error(&error))
                    .expect("error serializes")
            );
            ExitCode::FAILURE
        }
    }
}

async fn run(url: &str, max_events: usize) -> Result<ScrapeResponse, ScrapeError> {
    let session = BrowserSession::launch(config()).await?;
    let result = scrape_events(&session, url, max_events).await;
    if let Err(e) = session.close().await {
        warn!("Failed to close browser: {e}");
    }
    result.map(|events| ScrapeResponse { events })
}

/// The URL is the first non-flag argument, so flags may come before or
/// after it.
fn parse_args(args: &[String]) -> Result<(String, usize), String> {
    let mut url = None;
    let mut max_events = None;

    let mut remaining = args.iter();
    while let Some(arg) = remaining.next() {
        if arg == "--max-events" {
            let value = remaining
                .next()
                .ok_or_else(|| "--max-events expects a value".to_string())?;
            let parsed: usize = value
                .parse()
                .map_err(|_| format!("invalid --max-events value: {value}"))?;
            if parsed == 0 {
                return Err("--max-events must be at least 1".to_string());
            }
            max_events = Some(parsed);
        } else if url.is_none() {
            url = Some(arg.clone());
        } else {
            return Err(format!("unexpected argument: {arg}"));
        }
    }

    let url = url.ok_or_else(|| "usage: eventscout <url> [--max-events N]".to_string())?;
    Ok((url, max_events.unwrap_or_else(|| config().max_events)))
}
