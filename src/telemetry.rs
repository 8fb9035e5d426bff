//! Tracing setup
//!
//! `LOG_LEVEL` holds the filter directives (`info` by default) and
//! `LOG_FORMAT=json` switches from human-readable to JSON lines.

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info,odin_tutor=debug,warp=info";

pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_env("LOG_LEVEL").unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_line_number(true);

    match std::env::var("LOG_FORMAT").as_deref() {
        Ok("json") => builder.json().init(),
        _ => builder.init(),
    }
}
