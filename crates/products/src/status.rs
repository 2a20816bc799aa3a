//! Product publication status.

use core::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use storefront_core::DomainError;

/// Publication status of a product.
///
/// Serialized as its lowercase token; any other token fails to deserialize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductStatus {
    /// Being prepared; not publicly listed. Every product starts here.
    #[default]
    Draft,
    /// Publicly listed.
    Active,
    /// Taken down. Must go back through `Draft` before it can be listed again.
    Disabled,
}

impl ProductStatus {
    pub const ALL: [ProductStatus; 3] = [
        ProductStatus::Draft,
        ProductStatus::Active,
        ProductStatus::Disabled,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            ProductStatus::Draft => "draft",
            ProductStatus::Active => "active",
            ProductStatus::Disabled => "disabled",
        }
    }

    /// Row/column of this status in the transition table.
    pub(crate) const fn index(self) -> usize {
        match self {
            ProductStatus::Draft => 0,
            ProductStatus::Active => 1,
            ProductStatus::Disabled => 2,
        }
    }

    /// Parse a canonical status token.
    ///
    /// Matching is exact: no trimming, no case folding.
    pub fn parse(token: &str) -> Result<Self, InvalidStatusValue> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == token)
            .ok_or_else(|| InvalidStatusValue::new(token))
    }
}

impl core::fmt::Display for ProductStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProductStatus {
    type Err = InvalidStatusValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// A status token outside `{draft, active, disabled}`.
///
/// This is an input error raised before any transition rule runs; it is never a
/// business rejection.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid status value {value:?} (expected one of: draft, active, disabled)")]
pub struct InvalidStatusValue {
    value: String,
}

impl InvalidStatusValue {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }

    /// The offending token, verbatim.
    pub fn value(&self) -> &str {
        &self.value
    }
}

impl From<InvalidStatusValue> for DomainError {
    fn from(value: InvalidStatusValue) -> Self {
        DomainError::validation(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_canonical_tokens() {
        assert_eq!(ProductStatus::parse("draft"), Ok(ProductStatus::Draft));
        assert_eq!("active".parse::<ProductStatus>(), Ok(ProductStatus::Active));
        assert_eq!("disabled".parse::<ProductStatus>(), Ok(ProductStatus::Disabled));
    }

    #[test]
    fn display_round_trips_through_parse() {
        for status in ProductStatus::ALL {
            assert_eq!(status.to_string().parse::<ProductStatus>(), Ok(status));
        }
    }

    #[test]
    fn rejects_unknown_tokens() {
        for token in ["", "archived", "Active", " draft", "draft ", "DISABLED", "enabled"] {
            let err = ProductStatus::parse(token).unwrap_err();
            assert_eq!(err.value(), token);
        }
    }

    #[test]
    fn invalid_value_maps_to_validation_error() {
        let err: DomainError = ProductStatus::parse("published").unwrap_err().into();
        match err {
            DomainError::Validation(msg) => assert!(msg.contains("\"published\"")),
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn new_products_default_to_draft() {
        assert_eq!(ProductStatus::default(), ProductStatus::Draft);
    }

    #[test]
    fn serde_uses_lowercase_tokens() {
        assert_eq!(serde_json::to_string(&ProductStatus::Disabled).unwrap(), "\"disabled\"");
        let parsed: ProductStatus = serde_json::from_str("\"active\"").unwrap();
        assert_eq!(parsed, ProductStatus::Active);
    }

    #[test]
    fn serde_rejects_unknown_tokens() {
        assert!(serde_json::from_str::<ProductStatus>("\"Active\"").is_err());
        assert!(serde_json::from_str::<ProductStatus>("\"archived\"").is_err());
        assert!(serde_json::from_str::<ProductStatus>("\"\"").is_err());
    }

    #[test]
    fn table_indices_are_distinct_and_dense() {
        let mut seen = [false; 3];
        for status in ProductStatus::ALL {
            seen[status.index()] = true;
        }
        assert_eq!(seen, [true; 3]);
    }
}
