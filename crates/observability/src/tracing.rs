//! Tracing/logging initialization.

use std::future::Future;
use std::time::Instant;

use tracing_subscriber::EnvFilter;

/// Output format, chosen with `LOG_FORMAT` (`json` or `pretty`).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

impl LogFormat {
    /// Anything other than `pretty` keeps the JSON default.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("pretty") => LogFormat::Pretty,
            _ => LogFormat::Json,
        }
    }

    pub fn from_env() -> Self {
        Self::parse(std::env::var("LOG_FORMAT").ok().as_deref())
    }
}

/// Initialize tracing/logging for the process.
///
/// Filtering comes from `RUST_LOG` (default `info`). Safe to call multiple
/// times (subsequent calls are no-ops).
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(tracing_subscriber::fmt::time::SystemTime);

    let _ = match LogFormat::from_env() {
        LogFormat::Json => builder.json().with_target(false).try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
    };
}

/// Await `fut` and log how long it took under `label`.
pub async fn timed<F: Future>(label: &'static str, fut: F) -> F::Output {
    let started = Instant::now();
    let output = fut.await;
    ::tracing::info!(label, duration_ms = started.elapsed().as_millis() as u64, "timed operation finished");
    output
}
