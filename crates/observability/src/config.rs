//! Observability configuration.

use thiserror::Error;

/// Log filter directives, `tracing_subscriber::EnvFilter` syntax.
pub const FILTER_ENV: &str = "RUST_LOG";
/// Output format: `json` or `pretty`.
pub const FORMAT_ENV: &str = "STOREFRONT_LOG_FORMAT";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ObservabilityConfigError {
    #[error("STOREFRONT_LOG_FORMAT must be \"json\" or \"pretty\", got {0:?}")]
    UnknownFormat(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservabilityConfig {
    pub filter: String,
    pub format: LogFormat,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            format: LogFormat::Json,
        }
    }
}

impl ObservabilityConfig {
    pub fn from_env() -> Result<Self, ObservabilityConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ObservabilityConfigError> {
        let mut config = Self::default();

        if let Some(filter) = lookup(FILTER_ENV).filter(|f| !f.trim().is_empty()) {
            config.filter = filter;
        }
        if let Some(format) = lookup(FORMAT_ENV) {
            config.format = match format.trim().to_ascii_lowercase().as_str() {
                "json" => LogFormat::Json,
                "pretty" => LogFormat::Pretty,
                _ => return Err(ObservabilityConfigError::UnknownFormat(format)),
            };
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_json_at_info() {
        let config = ObservabilityConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, ObservabilityConfig::default());
    }

    #[test]
    fn reads_filter_and_format() {
        let config = ObservabilityConfig::from_lookup(|key| match key {
            FILTER_ENV => Some("storefront_infra=debug".to_string()),
            FORMAT_ENV => Some("Pretty".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(config.filter, "storefront_infra=debug");
        assert_eq!(config.format, LogFormat::Pretty);
    }

    #[test]
    fn blank_filter_keeps_default() {
        let config = ObservabilityConfig::from_lookup(|key| (key == FILTER_ENV).then(|| "  ".to_string()))
            .unwrap();
        assert_eq!(config.filter, "info");
    }

    #[test]
    fn unknown_format_is_an_error() {
        let err = ObservabilityConfig::from_lookup(|key| (key == FORMAT_ENV).then(|| "xml".to_string()))
            .unwrap_err();
        assert_eq!(err, ObservabilityConfigError::UnknownFormat("xml".to_string()));
    }
}
