//! Subscriber installation.

use anyhow::anyhow;
use tracing_subscriber::EnvFilter;

use crate::config::{LogFormat, ObservabilityConfig};

/// Install the global subscriber described by `config`.
///
/// Fails if the filter does not parse or a global subscriber is already set.
pub fn try_init(config: &ObservabilityConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_new(&config.filter)
        .map_err(|e| anyhow!("invalid log filter {:?}: {e}", config.filter))?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(false);

    let installed = match config.format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
    };
    installed.map_err(|e| anyhow!("tracing subscriber already installed: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_malformed_filter() {
        let config = ObservabilityConfig {
            filter: "storefront_infra=loud".to_string(),
            ..ObservabilityConfig::default()
        };
        assert!(try_init(&config).is_err());
    }

    #[test]
    fn init_is_idempotent() {
        crate::init();
        crate::init();
    }
}
