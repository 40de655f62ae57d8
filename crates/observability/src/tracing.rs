//! Tracing/logging initialization.
//!
//! JSON lines by default so scanner-station and issuance logs can be shipped
//! as-is; set `SERIALFORGE_LOG_FORMAT=pretty` for local work.

use tracing_subscriber::EnvFilter;

/// Initialize tracing/logging for the process.
///
/// Filtering comes from `RUST_LOG`, defaulting to `info`. Safe to call
/// multiple times (subsequent calls are no-ops).
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(false);

    let pretty = std::env::var("SERIALFORGE_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("pretty"))
        .unwrap_or(false);
    if pretty {
        let _ = builder.try_init();
    } else {
        let _ = builder.json().try_init();
    }
}
