//! Tracing/logging setup shared by storefront processes and test harnesses.

pub mod config;
pub mod tracing;

pub use config::{LogFormat, ObservabilityConfig, ObservabilityConfigError};

/// Initialize process-wide tracing from the environment.
///
/// Safe to call multiple times; only the first call installs a subscriber.
pub fn init() {
    init_from(ObservabilityConfig::from_env());
}

/// Install `loaded`, or the defaults if it failed to load. The load error is
/// reported through the subscriber that ends up installed.
fn init_from(loaded: Result<ObservabilityConfig, ObservabilityConfigError>) {
    let (config, load_error) = match loaded {
        Ok(config) => (config, None),
        Err(err) => (ObservabilityConfig::default(), Some(err)),
    };
    // Already initialized by an earlier call: nothing to do.
    let _ = tracing::try_init(&config);
    if let Some(err) = load_error {
        ::tracing::warn!(error = %err, "invalid observability configuration; using defaults");
    }
}
