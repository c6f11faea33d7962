//! Tracing and logging setup shared by every binary.

/// Initialize process-wide observability (tracing/logging).
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init();
}

/// Tracing configuration (filters, output format) and timing helpers.
pub mod tracing;

pub use self::tracing::{LogFormat, timed};
