// Path: crates/telemetry/src/init.rs
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Registry};

/// Environment variable selecting human-readable output instead of JSON.
pub const LOG_FORMAT_ENV: &str = "FLORA_LOG_FORMAT";

/// Builds the level filter. `RUST_LOG` wins over `default_filter`, and an
/// unparsable `default_filter` falls back to `info`.
pub fn env_filter(default_filter: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

fn wants_pretty() -> bool {
    std::env::var(LOG_FORMAT_ENV)
        .map(|v| v.eq_ignore_ascii_case("pretty"))
        .unwrap_or(false)
}

/// Installs the global `tracing` subscriber: JSON lines on stderr with
/// RFC 3339 UTC timestamps, or plain text when `FLORA_LOG_FORMAT=pretty`.
/// `log` records from dependencies are bridged in.
pub fn init_tracing(default_filter: &str) -> Result<(), anyhow::Error> {
    let filter = env_filter(default_filter);
    let timer = fmt::time::UtcTime::rfc_3339();
    tracing_log::LogTracer::init()?;
    if wants_pretty() {
        let layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_timer(timer);
        tracing::subscriber::set_global_default(Registry::default().with(filter).with(layer))?;
    } else {
        let layer = fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_timer(timer);
        tracing::subscriber::set_global_default(Registry::default().with(filter).with(layer))?;
    }
    Ok(())
}
