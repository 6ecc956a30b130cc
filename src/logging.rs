//! Log subscriber setup for binaries embedding the tracker

use tracing_subscriber::EnvFilter;

/// Installs a global `tracing` subscriber
///
/// The filter comes from `SPOT_LOG`, then `RUST_LOG`, defaulting to `info`.
/// `SPOT_LOG_FORMAT=json` switches to JSON lines. Calling this twice is a
/// no-op.
pub fn init() {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_target(false);

    let _ = match log_format().as_str() {
        "json" => builder.json().try_init(),
        _ => builder.try_init(),
    };
}

fn env_filter() -> EnvFilter {
    let directives = std::env::var("SPOT_LOG")
        .ok()
        .filter(|value| !value.trim().is_empty())
        .or_else(|| std::env::var("RUST_LOG").ok());

    match directives {
        Some(value) => EnvFilter::new(value),
        None => EnvFilter::new("info"),
    }
}

fn log_format() -> String {
    std::env::var("SPOT_LOG_FORMAT")
        .ok()
        .map(|value| value.trim().to_ascii_lowercase())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| "plain".to_string())
}
