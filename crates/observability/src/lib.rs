//! Tracing and logging (shared setup).

pub use self::tracing::LogFormat;

/// Initialize process-wide logging.
///
/// This is safe to call multiple times; subsequent calls become no-ops and
/// return `false`.
pub fn init(format: LogFormat) -> bool {
    tracing::init(format)
}

/// Tracing configuration (filters, output format).
pub mod tracing;
