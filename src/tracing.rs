use crate::config::env_loader::config;
use lazy_static::lazy_static;
use std::{env, io};
use tokio::task::JoinHandle;
use tracing::{info, Level};
use tracing_loki::url::Url;
use tracing_loki::{BackgroundTask, BackgroundTaskController};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{filter, fmt};

lazy_static! {
    static ref LOKI_URL: Option<String> = env::var("LOKI_URL").ok();
}

fn build_loki_layer(
    base_url: Url,
) -> (
    tracing_loki::Layer,
    BackgroundTaskController,
    BackgroundTask,
) {
    tracing_loki::builder()
        .label("service", "eventscout")
        .expect("Failed setting label")
        .build_controller_url(base_url)
        .expect("Failed building Loki layer")
}

/// Initializes the subscriber: stderr output (stdout carries the scrape
/// result), crate logs at TRACE when debug is on, and an optional Loki
/// shipping layer when `LOKI_URL` is set.
pub fn setup_tracing() -> Option<(BackgroundTaskController, JoinHandle<()>)> {
    let verbose_level = if config().debug {
        Level::TRACE
    } else {
        Level::INFO
    };
    let filter = filter::Targets::new()
        .with_target("eventscout", verbose_level)
        .with_default(Level::WARN);

    let registry = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(io::stderr));

    match LOKI_URL.as_ref() {
        None => {
            registry.init();
            None
        }
        Some(base_url) => {
            let base_url: Url = base_url.parse().expect("Invalid LOKI_URL format");
            let (layer, controller, task) = build_loki_layer(base_url);

            registry.with(layer).init();
            let handle = tokio::spawn(task);

            info!("Loki initialized");

            Some((controller, handle))
        }
    }
}
