//! Tracing/logging initialization.
//!
//! JSON lines on stdout, one object per event, with span fields flattened in.

use tracing_subscriber::EnvFilter;

const DEFAULT_DIRECTIVE: &str = "info";

/// Initialize tracing/logging for the process.
///
/// Safe to call multiple times (subsequent calls are no-ops).
pub fn init() {
    init_with_filter(DEFAULT_DIRECTIVE);
}

/// Initialize tracing with `directive` unless `RUST_LOG` overrides it.
///
/// An unparsable `directive` falls back to `info`.
pub fn init_with_filter(directive: &str) {
    let filter = build_filter(directive);

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .flatten_event(true)
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(false)
        .try_init();
}

fn build_filter(directive: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(directive))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_init_is_a_no_op() {
        init_with_filter("tableside_seating=debug");
        init();
        ::tracing::info!("still logging after second init");
    }

    #[test]
    fn garbage_directive_falls_back() {
        // must not panic
        let _ = build_filter("[[[not a filter");
    }
}
