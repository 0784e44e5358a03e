use crate::config::model::Config;
use lazy_static::lazy_static;
use std::env;

const DEFAULT_NAVIGATION_TIMEOUT_MS: u64 = 30_000;
const DEFAULT_MAX_EVENTS: usize = 3;

lazy_static! {
    static ref CONFIG: Config = load_config();
}

pub fn config() -> &'static Config {
    &CONFIG
}

pub fn load_config() -> Config {
    Config {
        debug: load_bool_config("DEBUG", false),
        navigation_timeout_ms: load_u64_config(
            "NAVIGATION_TIMEOUT_MS",
            DEFAULT_NAVIGATION_TIMEOUT_MS,
        ),
        max_events: load_usize_config("MAX_EVENTS", DEFAULT_MAX_EVENTS),
    }
}

fn load_bool_config(name: &str, default: bool) -> bool {
    env::var(name)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .unwrap_or_else(|_| {
            panic!(
                "Invalid config '{}'. Expected either 'true' or 'false'",
                name
            )
        })
}

fn load_u64_config(name: &str, default: u64) -> u64 {
    env::var(name)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .unwrap_or_else(|_| panic!("Invalid config '{}'. Expected an integer number.", name))
}

fn load_usize_config(name: &str, default: usize) -> usize {
    env::var(name)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .unwrap_or_else(|_| panic!("Invalid config '{}'. Expected an integer number.", name))
}
