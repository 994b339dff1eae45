//! Optional tracing subscriber setup, behind the `tracing` feature.
//!
//! The library only emits spans and events; installing a subscriber is left
//! to the host. This helper is for hosts and tests that just want the spans
//! printed.

use tracing_subscriber::EnvFilter;

/// Install a global fmt subscriber. `RUST_LOG` wins over `default_directive`.
///
/// Fails if a global subscriber is already set.
pub fn init_tracing(
    default_directive: &str,
) -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
}
